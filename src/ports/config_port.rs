//! Configuration access port trait.

use crate::domain::error::TradesimError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Optional `YYYY-MM-DD` value. Blank counts as absent.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, TradesimError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| TradesimError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: "invalid date format (expected YYYY-MM-DD)".to_string(),
                }),
            _ => Ok(None),
        }
    }
}
