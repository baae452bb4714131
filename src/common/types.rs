use crate::common::constants::{CONCERT_KIND_CODE, MUSICAL_KIND_CODE};
use crate::common::error::{CrawlerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event category understood by the catalog's `KindOfGoods` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Musical,
    Concert,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Concert, Category::Musical];

    /// The literal code sent to the catalog
    pub fn code(&self) -> &'static str {
        match self {
            Category::Musical => MUSICAL_KIND_CODE,
            Category::Concert => CONCERT_KIND_CODE,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            MUSICAL_KIND_CODE => Some(Category::Musical),
            CONCERT_KIND_CODE => Some(Category::Concert),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Musical => "musical",
            Category::Concert => "concert",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = CrawlerError;

    /// Accepts either the catalog code or the lowercase name.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(category) = Category::from_code(s) {
            return Ok(category);
        }
        match s.to_ascii_lowercase().as_str() {
            "musical" => Ok(Category::Musical),
            "concert" => Ok(Category::Concert),
            _ => Err(CrawlerError::InvalidCategory(s.to_string())),
        }
    }
}

/// Opaque identifier of one listing on the ticket site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Inclusive performance period. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(CrawlerError::format(
                "period",
                &format!("{start} ~ {end}"),
                "end date precedes start date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Detail record extracted from one listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceRecord {
    pub title: String,
    pub poster_url: Option<String>,
    pub venue_name: String,
    pub region: String,
    pub cast_names: Vec<String>,
    pub date_range: DateRange,
}
