//! Listing-page URLs and the date filter that parameterizes them

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigError;
use crate::utils::BOOTSTRAP_OFFSET_HOURS;

/// Month/day/year/hour the listing is anchored at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateFilter {
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub hour: u32,
}

impl Default for DateFilter {
    fn default() -> Self {
        Self {
            month: 10,
            day: 1,
            year: 2024,
            hour: 17,
        }
    }
}

impl DateFilter {
    /// Filter anchored at the hour containing `at`
    #[must_use]
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self {
            month: at.month(),
            day: at.day(),
            year: at.year(),
            hour: at.hour(),
        }
    }

    /// Filter for the epoch following a page whose newest release is `latest`:
    /// one hour later, truncated to the hour.
    #[must_use]
    pub fn bootstrap_from(latest: NaiveDateTime) -> Self {
        Self::from_datetime(latest + Duration::hours(BOOTSTRAP_OFFSET_HOURS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if NaiveDate::from_ymd_opt(self.year, self.month, self.day).is_none() || self.hour > 23 {
            return Err(ConfigError::Invalid(format!("invalid date filter {self}")));
        }
        Ok(())
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:00",
            self.year, self.month, self.day, self.hour
        )
    }
}

/// Builds `base?page=N&pagesize=S&month=MM&day=DD&year=YYYY&hour=HH`
#[derive(Debug, Clone)]
pub struct IndexQuery {
    base: Url,
    page_size: u32,
}

impl IndexQuery {
    pub fn new(base_url: &str, page_size: u32) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { base, page_size })
    }

    /// Listing page `page` under `filter`.
    ///
    /// Any query string already on the base URL is replaced.
    #[must_use]
    pub fn page_url(&self, page: u32, filter: &DateFilter) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("pagesize", &self.page_size.to_string())
            .append_pair("month", &format!("{:02}", filter.month))
            .append_pair("day", &format!("{:02}", filter.day))
            .append_pair("year", &format!("{:04}", filter.year))
            .append_pair("hour", &format!("{:02}", filter.hour));
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn page_url_is_zero_padded() {
        let query = IndexQuery::new(
            "https://www.prnewswire.com/news-releases/news-releases-list/",
            100,
        )
        .unwrap();
        assert_eq!(
            query.page_url(3, &DateFilter::default()),
            "https://www.prnewswire.com/news-releases/news-releases-list/?page=3&pagesize=100&month=10&day=01&year=2024&hour=17"
        );
    }

    #[test]
    fn existing_query_is_replaced() {
        let query = IndexQuery::new("https://example.com/list?page=9&x=1", 10).unwrap();
        let filter = DateFilter {
            month: 1,
            day: 2,
            year: 2025,
            hour: 3,
        };
        assert_eq!(
            query.page_url(1, &filter),
            "https://example.com/list?page=1&pagesize=10&month=01&day=02&year=2025&hour=03"
        );
    }

    #[test]
    fn bootstrap_adds_an_hour_and_truncates() {
        let filter = DateFilter::bootstrap_from(at(2024, 10, 1, 18, 40));
        assert_eq!(
            filter,
            DateFilter {
                month: 10,
                day: 1,
                year: 2024,
                hour: 19
            }
        );
    }

    #[test]
    fn bootstrap_rolls_over_midnight() {
        let filter = DateFilter::bootstrap_from(at(2024, 12, 31, 23, 59));
        assert_eq!(
            filter,
            DateFilter {
                month: 1,
                day: 1,
                year: 2025,
                hour: 0
            }
        );
    }

    #[test]
    fn impossible_dates_fail_validation() {
        let filter = DateFilter {
            month: 2,
            day: 30,
            year: 2024,
            hour: 1,
        };
        assert!(filter.validate().is_err());
        assert!(DateFilter::default().validate().is_ok());
    }
}
