mod common;

use chrono::NaiveDate;
use common::*;
use std::sync::Arc;
use ticket_crawler::app::crawl_use_case::ErrorHandlingStrategy;
use ticket_crawler::infra::static_session::StaticHtmlSessionFactory;
use ticket_crawler::{
    CatalogResolver, Category, CrawlUseCase, DateRange, DetailExtractor, ListingId, PerformanceRecord,
};

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn crawler(http: FixtureHttp) -> (CrawlUseCase, Arc<FixtureHttp>, Arc<StaticHtmlSessionFactory>) {
    let http = shared(http);
    let factory = Arc::new(StaticHtmlSessionFactory::new(http.clone()));
    let use_case = CrawlUseCase::new(
        CatalogResolver::new(http.clone(), CATALOG_URL, quick_retry(1)),
        DetailExtractor::new(factory.clone(), DETAIL_URL, fast_timeouts(), quick_retry(1)),
    );
    (use_case, http, factory)
}

fn hamlet() -> PerformanceRecord {
    PerformanceRecord {
        title: "Musical Hamlet".into(),
        poster_url: Some("https://ticketimage.interpark.com/Play/image/large/24/24005678_p.gif".into()),
        venue_name: "Seoul Arts Center".into(),
        region: "Seoul".into(),
        cast_names: vec![
            "Hong Gil-dong".into(),
            "Kim Young-hee".into(),
            "Lee Chul-soo".into(),
        ],
        date_range: DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 8, 18).unwrap(),
        )
        .unwrap(),
    }
}

#[tokio::test]
async fn test_catalog_fixture_yields_single_goods_code_anchors() {
    let (crawler, http, _) = crawler(FixtureHttp::new().with_page(CATALOG_URL, CATALOG_PAGE));

    let ids = crawler.resolver().resolve(june_first(), Category::Musical).await.unwrap();

    assert_eq!(
        ids,
        vec![
            ListingId::new("24001111"),
            ListingId::new("24002222"),
            ListingId::new("24005678"),
        ]
    );
    let requested = http.requested();
    assert_eq!(
        requested,
        vec![format!(
            "{CATALOG_URL}?ImgYn=Y&Ca=&KindOfGoods=01011&KindOfFlag=P&PlayDate=20240601"
        )]
    );
}

#[tokio::test]
async fn test_last_listing_is_extracted_end_to_end() {
    let http = FixtureHttp::new()
        .with_page(CATALOG_URL, CATALOG_PAGE)
        .with_listing("24005678", DETAIL_PAGE);
    let (crawler, http, factory) = crawler(http);

    let record = crawler
        .crawl_last(june_first(), Category::Concert)
        .await
        .unwrap()
        .expect("catalog has listings");

    assert_eq!(record, hamlet());
    assert!(http
        .requested()
        .contains(&format!("{DETAIL_URL}/24005678")));
    assert_eq!(factory.stats().open_sessions(), 0);
}

#[tokio::test]
async fn test_empty_catalog_extracts_nothing() {
    let http = FixtureHttp::new().with_page(CATALOG_URL, "<html><body><p>No shows</p></body></html>");
    let (crawler, _, factory) = crawler(http);

    let record = crawler.crawl_last(june_first(), Category::Musical).await.unwrap();

    assert!(record.is_none());
    assert_eq!(factory.stats().opened(), 0);
}

#[tokio::test]
async fn test_crawl_all_continues_past_failed_listings() {
    let http = FixtureHttp::new()
        .with_page(CATALOG_URL, CATALOG_PAGE)
        .with_listing("24001111", DETAIL_SINGLE_DAY_PAGE)
        .with_listing("24005678", DETAIL_PAGE);
    let (crawler, _, factory) = crawler(http);

    let report = crawler
        .crawl_all(june_first(), Category::Concert, ErrorHandlingStrategy::ContinueOnError)
        .await
        .unwrap();

    let extracted: Vec<&str> = report.records.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(extracted, vec!["24001111", "24005678"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, ListingId::new("24002222"));

    let stats = factory.stats();
    assert_eq!(stats.opened(), 3);
    assert_eq!(stats.closed(), 3);
}

#[tokio::test]
async fn test_crawl_all_stops_on_first_error_when_asked() {
    let http = FixtureHttp::new()
        .with_page(CATALOG_URL, CATALOG_PAGE)
        .with_listing("24001111", DETAIL_NO_PERIOD_PAGE);
    let (crawler, _, factory) = crawler(http);

    let result = crawler
        .crawl_all(june_first(), Category::Concert, ErrorHandlingStrategy::StopOnFirstError)
        .await;

    assert!(result.is_err());
    assert_eq!(factory.stats().opened(), 1);
    assert_eq!(factory.stats().open_sessions(), 0);
}
