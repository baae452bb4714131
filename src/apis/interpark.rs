//! Page knowledge for the Interpark ticket site: catalog query construction,
//! anchor filtering and the text formats found on detail pages.

use crate::common::constants::{GOODS_CODE_PARAM, PERIOD_DATE_FORMAT, PLAY_DATE_FORMAT};
use crate::common::error::{CrawlerError, Result};
use crate::common::types::{Category, DateRange, ListingId};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

static GOODS_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"(?:^|[?&]){GOODS_CODE_PARAM}=([^&#'"\s)]*)"#))
        .expect("goods code pattern is valid")
});

/// Catalog query for every listing of `category` playing on `date`.
pub fn build_catalog_url(base_url: &str, category: Category, date: NaiveDate) -> String {
    format!(
        "{}?ImgYn=Y&Ca=&KindOfGoods={}&KindOfFlag=P&PlayDate={}",
        base_url,
        category.code(),
        date.format(PLAY_DATE_FORMAT)
    )
}

pub fn build_detail_url(base_url: &str, id: &ListingId) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), id)
}

/// The `GoodsCode` value of `href`, only when the parameter occurs exactly once.
pub fn goods_code_from_href(href: &str) -> Option<&str> {
    let mut matches = GOODS_CODE_PATTERN.captures_iter(href);
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    first
        .get(1)
        .map(|m| m.as_str())
        .filter(|code| !code.is_empty())
}

/// Listing identifiers from catalog anchors, in document order. Duplicates are kept.
pub fn extract_listing_ids(html: &str) -> Vec<ListingId> {
    let document = Html::parse_document(html);
    let mut ids = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        match goods_code_from_href(href) {
            Some(code) => ids.push(ListingId::new(code)),
            None => debug!(href, "Skipping anchor without a single GoodsCode"),
        }
    }

    ids
}

/// Venue name is the control text before its parenthesised hall suffix.
pub fn parse_venue_name(text: &str) -> Result<String> {
    let name = text.split_once('(').map_or(text, |(head, _)| head).trim();
    if name.is_empty() {
        return Err(CrawlerError::format("venue", text, "no venue name before '('"));
    }
    Ok(name.to_string())
}

/// Region is the first word of the place popup text, e.g. "Seoul" of "Seoul Gangnam-gu".
pub fn parse_region(text: &str) -> Result<String> {
    text.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| CrawlerError::format("region", text, "place popup text is empty"))
}

/// Parses period text such as `2024.06.01 ~2024.06.30` or a single `2024.06.01`.
pub fn parse_date_range(text: &str) -> Result<DateRange> {
    let mut tokens = text.split_whitespace();
    let first = tokens
        .next()
        .ok_or_else(|| CrawlerError::format("period", text, "period text is empty"))?;

    // Both dates may be packed in one token: "2024.06.01~2024.06.30"
    let (start_text, packed_end) = match first.split_once('~') {
        Some((start, end)) => (start, Some(end)),
        None => (first, None),
    };
    let start = parse_period_date(start_text, text)?;

    let end_text = packed_end
        .filter(|end| !end.is_empty())
        .or_else(|| tokens.map(strip_separator).find(|token| !token.is_empty()));

    match end_text {
        Some(end_text) => DateRange::new(start, parse_period_date(end_text, text)?),
        None => Ok(DateRange::single(start)),
    }
}

fn strip_separator(token: &str) -> &str {
    token.trim_start_matches(['~', '-', '\u{2013}'])
}

fn parse_period_date(token: &str, full_text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(token, PERIOD_DATE_FORMAT).map_err(|e| {
        CrawlerError::format("period", full_text, format!("'{token}' is not YYYY.MM.DD: {e}"))
    })
}

/// Poster `src` as an absolute URL; empty sources count as absent.
pub fn normalize_poster_url(src: Option<String>) -> Option<String> {
    let src = src?.trim().to_string();
    if src.is_empty() {
        return None;
    }
    if src.starts_with("//") {
        return Some(format!("https:{src}"));
    }
    Some(src)
}
