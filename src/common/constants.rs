/// Catalog and detail page endpoints on the Interpark ticket site.
pub const CATALOG_URL: &str = "http://ticket.interpark.com/tiki/special/TPCalendar.asp";
pub const DETAIL_BASE_URL: &str = "https://tickets.interpark.com/goods";

// KindOfGoods codes understood by the catalog. These are an external contract.
pub const MUSICAL_KIND_CODE: &str = "01011";
pub const CONCERT_KIND_CODE: &str = "01003";

/// Query parameter in catalog anchors that carries the listing identifier
pub const GOODS_CODE_PARAM: &str = "GoodsCode";

/// Date format used in the `PlayDate` query parameter
pub const PLAY_DATE_FORMAT: &str = "%Y%m%d";

/// Date format used in the detail page's period text
pub const PERIOD_DATE_FORMAT: &str = "%Y.%m.%d";

// Detail page selectors
pub const OVERLAY_CLOSE_SELECTOR: &str = ".popupCloseBtn";
pub const TITLE_SELECTOR: &str = ".prdTitle";
pub const POSTER_SELECTOR: &str = ".posterBoxImage";
pub const VENUE_CONTROL_SELECTOR: &str = "[data-popup='info-place']";
pub const CASTING_NAME_SELECTOR: &str = ".castingName";
pub const PLACE_POPUP_SELECTOR: &str = ".popPlaceInfo";
pub const PLACE_POPUP_TEXT_SELECTOR: &str = "span";
pub const PERIOD_SELECTOR: &str = ".infoDesc > .infoText";
