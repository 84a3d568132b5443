//! Configuration loading and representation.
//!
//! All settings come from a flat key/value source (environment variables in
//! production). Defaults are enumerated once in [`AppConfig::default`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Runtime configuration passed explicitly into every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub organization_name: String,
    /// Recipient of calibration alerts.
    pub admin_email: String,
    /// Only identities ending with this suffix may use the service.
    pub allowed_domain: String,
    pub max_photos_per_item: usize,
    /// Upper bound on a decoded photo, in bytes.
    pub max_file_size: usize,
    pub page_size: usize,
    /// Upper bound on one page of search results.
    pub max_search_results: usize,
    pub calibration_alert_days: i64,
    pub recent_transfers: usize,
    pub recent_items: usize,
    pub alerts_enabled: bool,
    pub sweep_interval: Duration,
    /// Directory for the file-backed sheets and photos; `None` keeps
    /// everything in memory.
    pub data_dir: Option<PathBuf>,
    pub bind_addr: String,
    pub predefined_locations: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            organization_name: "AGE - Medical Association".to_string(),
            admin_email: "admin@example.org".to_string(),
            allowed_domain: "@example.org".to_string(),
            max_photos_per_item: 3,
            max_file_size: 5 * 1024 * 1024,
            page_size: 50,
            max_search_results: 100,
            calibration_alert_days: 30,
            recent_transfers: 5,
            recent_items: 10,
            alerts_enabled: true,
            sweep_interval: Duration::from_secs(24 * 60 * 60),
            data_dir: None,
            bind_addr: "0.0.0.0:8080".to_string(),
            predefined_locations: ["Storage", "Office 1", "Office 2", "Office 3", "Laboratory", "Reception"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, "invalid configuration value; using default");
                default
            }
        },
    }
}

fn string_or<F>(lookup: &F, key: &str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load from any key/value accessor, falling back to defaults per key.
    ///
    /// | Key                             | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `MEDINV_ORGANIZATION`           | `AGE - Medical Association` |
    /// | `MEDINV_ADMIN_EMAIL`            | `admin@example.org`     |
    /// | `MEDINV_ALLOWED_DOMAIN`         | `@example.org`          |
    /// | `MEDINV_MAX_PHOTOS`             | `3`                     |
    /// | `MEDINV_MAX_FILE_SIZE`          | `5242880`               |
    /// | `MEDINV_PAGE_SIZE`              | `50`                    |
    /// | `MEDINV_MAX_SEARCH_RESULTS`     | `100`                   |
    /// | `MEDINV_CALIBRATION_ALERT_DAYS` | `30`                    |
    /// | `MEDINV_RECENT_TRANSFERS`       | `5`                     |
    /// | `MEDINV_RECENT_ITEMS`           | `10`                    |
    /// | `MEDINV_ALERTS_ENABLED`         | `true`                  |
    /// | `MEDINV_SWEEP_INTERVAL_SECS`    | `86400`                 |
    /// | `MEDINV_DATA_DIR`               | unset (in-memory)       |
    /// | `MEDINV_BIND`                   | `0.0.0.0:8080`          |
    /// | `MEDINV_LOCATIONS`              | built-in list           |
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();

        let predefined_locations = match lookup("MEDINV_LOCATIONS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => d.predefined_locations,
        };

        Self {
            organization_name: string_or(&lookup, "MEDINV_ORGANIZATION", d.organization_name),
            admin_email: string_or(&lookup, "MEDINV_ADMIN_EMAIL", d.admin_email),
            allowed_domain: string_or(&lookup, "MEDINV_ALLOWED_DOMAIN", d.allowed_domain)
                .trim()
                .to_lowercase(),
            max_photos_per_item: parse_or(&lookup, "MEDINV_MAX_PHOTOS", d.max_photos_per_item),
            max_file_size: parse_or(&lookup, "MEDINV_MAX_FILE_SIZE", d.max_file_size),
            page_size: parse_or(&lookup, "MEDINV_PAGE_SIZE", d.page_size),
            max_search_results: parse_or(&lookup, "MEDINV_MAX_SEARCH_RESULTS", d.max_search_results),
            calibration_alert_days: parse_or(&lookup, "MEDINV_CALIBRATION_ALERT_DAYS", d.calibration_alert_days),
            recent_transfers: parse_or(&lookup, "MEDINV_RECENT_TRANSFERS", d.recent_transfers),
            recent_items: parse_or(&lookup, "MEDINV_RECENT_ITEMS", d.recent_items),
            alerts_enabled: parse_or(&lookup, "MEDINV_ALERTS_ENABLED", d.alerts_enabled),
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "MEDINV_SWEEP_INTERVAL_SECS",
                d.sweep_interval.as_secs(),
            )),
            data_dir: lookup("MEDINV_DATA_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            bind_addr: string_or(&lookup, "MEDINV_BIND", d.bind_addr),
            predefined_locations,
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Whether `email` belongs to the allowed domain, ignoring case.
    pub fn is_allowed_identity(&self, email: &str) -> bool {
        email.to_lowercase().ends_with(&self.allowed_domain.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_source_yields_defaults() {
        assert_eq!(AppConfig::from_lookup(|_| None), AppConfig::default());
    }

    #[test]
    fn values_override_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("MEDINV_MAX_PHOTOS", "5"),
            ("MEDINV_ALLOWED_DOMAIN", "@clinic.org"),
            ("MEDINV_ALERTS_ENABLED", "false"),
            ("MEDINV_LOCATIONS", "Ward A, Ward B,"),
            ("MEDINV_DATA_DIR", "/var/lib/medinv"),
        ]));
        assert_eq!(cfg.max_photos_per_item, 5);
        assert_eq!(cfg.allowed_domain, "@clinic.org");
        assert!(!cfg.alerts_enabled);
        assert_eq!(cfg.predefined_locations, vec!["Ward A", "Ward B"]);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/medinv")));
    }

    #[test]
    fn unparsable_values_fall_back() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("MEDINV_MAX_FILE_SIZE", "lots")]));
        assert_eq!(cfg.max_file_size, 5 * 1024 * 1024);
    }

    #[test]
    fn identity_must_end_with_allowed_domain() {
        let cfg = AppConfig::default();
        assert!(cfg.is_allowed_identity("nurse@example.org"));
        assert!(!cfg.is_allowed_identity("nurse@example.org.evil.com"));
    }

    #[test]
    fn allowed_domain_is_case_insensitive() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("MEDINV_ALLOWED_DOMAIN", " @Clinic.ORG ")]));
        assert_eq!(cfg.allowed_domain, "@clinic.org");
        assert!(cfg.is_allowed_identity("Nurse@clinic.org"));

        let literal = AppConfig {
            allowed_domain: "@Example.org".into(),
            ..AppConfig::default()
        };
        assert!(literal.is_allowed_identity("nurse@example.org"));
    }
}
