use crate::app::catalog_use_case::CatalogResolver;
use crate::app::detail_use_case::DetailExtractor;
use crate::common::error::Result;
use crate::common::types::{Category, ListingId, PerformanceRecord};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

/// Strategy for handling a failed listing during a batch crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorHandlingStrategy {
    /// Stop the batch on the first failed listing
    StopOnFirstError,
    /// Record the failure and carry on with the next listing
    #[default]
    ContinueOnError,
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    pub records: Vec<(ListingId, PerformanceRecord)>,
    pub failures: Vec<(ListingId, String)>,
}

/// Catalog resolution followed by detail extraction, one listing at a time.
pub struct CrawlUseCase {
    resolver: CatalogResolver,
    extractor: DetailExtractor,
}

impl CrawlUseCase {
    pub fn new(resolver: CatalogResolver, extractor: DetailExtractor) -> Self {
        Self { resolver, extractor }
    }

    pub fn resolver(&self) -> &CatalogResolver {
        &self.resolver
    }

    pub fn extractor(&self) -> &DetailExtractor {
        &self.extractor
    }

    /// Record for the last listing in the catalog, or `None` when the catalog is empty.
    pub async fn crawl_last(&self, date: NaiveDate, category: Category) -> Result<Option<PerformanceRecord>> {
        let ids = self.resolver.resolve(date, category).await?;
        match ids.last() {
            Some(id) => self.extractor.extract(id).await.map(Some),
            None => {
                info!("No {} listings on {}", category, date);
                Ok(None)
            }
        }
    }

    /// Extracts every distinct listing of the day.
    pub async fn crawl_all(
        &self,
        date: NaiveDate,
        category: Category,
        strategy: ErrorHandlingStrategy,
    ) -> Result<CrawlReport> {
        let ids = dedupe_preserving_order(self.resolver.resolve(date, category).await?);
        let mut report = CrawlReport::default();

        for id in ids {
            match self.extractor.extract(&id).await {
                Ok(record) => report.records.push((id, record)),
                Err(e) if strategy == ErrorHandlingStrategy::StopOnFirstError => return Err(e),
                Err(e) => {
                    warn!(listing = %id, error = %e, "Skipping listing");
                    report.failures.push((id, e.to_string()));
                }
            }
        }

        info!(
            "Crawled {} {} listings ({} failed)",
            report.records.len(),
            category,
            report.failures.len()
        );
        Ok(report)
    }
}

/// Drops repeated identifiers, keeping the first occurrence of each.
pub fn dedupe_preserving_order(ids: Vec<ListingId>) -> Vec<ListingId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let ids = ["3", "1", "3", "2", "1"].map(ListingId::from).to_vec();
        let unique: Vec<String> = dedupe_preserving_order(ids)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(unique, vec!["3", "1", "2"]);
    }
}
