use std::collections::BTreeSet;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::Document;
use crate::error::AppError;

pub const KEY_WEEKEND_DAYS: &str = "WeekendDays";
pub const KEY_MONTHLY_CAP: &str = "MonthlyCap";
pub const KEY_TOTAL_CAP: &str = "TotalCap";
pub const KEY_CERTIFICATE_VALIDITY_MONTHS: &str = "CertificateValidityMonths";
pub const KEY_TIME_ZONE: &str = "TimeZone";

/// One configuration document; the key doubles as the document id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    /// Interpretation hint for UI consumers ("csv", "number", "integer",
    /// "string"); the engine parses by key, not by hint.
    pub hint: String,
}

impl ConfigEntry {
    pub fn to_document(&self) -> Document {
        Document::new(self.key.clone())
            .with("key", self.key.as_str())
            .with("value", self.value.as_str())
            .with("hint", self.hint.as_str())
    }

    pub fn from_document(doc: &Document) -> Result<ConfigEntry, AppError> {
        const C: &str = collections::CONFIGURATION;
        Ok(ConfigEntry {
            key: doc.str(C, "key")?,
            value: doc.str(C, "value")?,
            hint: doc.str(C, "hint")?,
        })
    }
}

/// Typed view of the recognized configuration keys, with defaults applied.
/// Unrecognized keys are ignored. Fetched once per request and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Day-of-week indices, 0 = Sunday.
    pub weekend_days: BTreeSet<u8>,
    pub monthly_cap: f64,
    pub total_cap: f64,
    pub certificate_validity_months: u32,
    pub time_zone: Tz,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            weekend_days: BTreeSet::from([0, 6]),
            monthly_cap: 40.0,
            total_cap: 120.0,
            certificate_validity_months: 12,
            time_zone: chrono_tz::Asia::Manila,
        }
    }
}

impl Settings {
    /// Overlays one stored entry; malformed values keep the default.
    pub fn apply(&mut self, entry: &ConfigEntry) {
        match entry.key.as_str() {
            KEY_WEEKEND_DAYS => {
                let days: BTreeSet<u8> = entry
                    .value
                    .split(',')
                    .filter_map(|part| part.trim().parse::<u8>().ok())
                    .filter(|day| *day <= 6)
                    .collect();
                self.weekend_days = days;
            }
            KEY_MONTHLY_CAP => {
                if let Ok(cap) = entry.value.trim().parse::<f64>() {
                    self.monthly_cap = cap;
                }
            }
            KEY_TOTAL_CAP => {
                if let Ok(cap) = entry.value.trim().parse::<f64>() {
                    self.total_cap = cap;
                }
            }
            KEY_CERTIFICATE_VALIDITY_MONTHS => {
                if let Ok(months) = entry.value.trim().parse::<u32>() {
                    self.certificate_validity_months = months;
                }
            }
            KEY_TIME_ZONE => {
                if let Ok(zone) = entry.value.trim().parse::<Tz>() {
                    self.time_zone = zone;
                }
            }
            _ => {}
        }
    }

    pub fn from_entries(entries: &[ConfigEntry]) -> Settings {
        let mut settings = Settings::default();
        for entry in entries {
            settings.apply(entry);
        }
        settings
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdateInput {
    pub value: String,
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_recognized_keys() {
        let settings = Settings::default();
        assert_eq!(settings.weekend_days, BTreeSet::from([0, 6]));
        assert_eq!(settings.monthly_cap, 40.0);
        assert_eq!(settings.total_cap, 120.0);
        assert_eq!(settings.certificate_validity_months, 12);
        assert_eq!(settings.time_zone, chrono_tz::Asia::Manila);
    }

    #[test]
    fn weekend_days_parse_as_csv_of_day_indices() {
        let mut settings = Settings::default();
        settings.apply(&ConfigEntry {
            key: KEY_WEEKEND_DAYS.into(),
            value: "5, 6".into(),
            hint: "csv".into(),
        });
        assert_eq!(settings.weekend_days, BTreeSet::from([5, 6]));
    }

    #[test]
    fn out_of_range_day_indices_are_dropped() {
        let mut settings = Settings::default();
        settings.apply(&ConfigEntry {
            key: KEY_WEEKEND_DAYS.into(),
            value: "0,9".into(),
            hint: "csv".into(),
        });
        assert_eq!(settings.weekend_days, BTreeSet::from([0]));
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let mut settings = Settings::default();
        settings.apply(&ConfigEntry {
            key: "SomethingElse".into(),
            value: "99".into(),
            hint: "number".into(),
        });
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let mut settings = Settings::default();
        settings.apply(&ConfigEntry {
            key: KEY_MONTHLY_CAP.into(),
            value: "forty".into(),
            hint: "number".into(),
        });
        assert_eq!(settings.monthly_cap, 40.0);
    }
}
