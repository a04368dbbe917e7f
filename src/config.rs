//! Runtime configuration read from the environment.
//!
//! | Variable                  | Default          |
//! |---------------------------|------------------|
//! | `ALLOWANCE_BIND_ADDR`     | `127.0.0.1:3000` |
//! | `ALLOWANCE_SCHEDULE_DIR`  | `schedules`      |
//! | `ALLOWANCE_TAX_YEAR`      | latest loaded    |
//! | `ALLOWANCE_DATA_DIR`      | unset, in memory |
//! | `ALLOWANCE_HISTORY_LIMIT` | `10`             |

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub schedule_dir: PathBuf,
    pub tax_year: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub history_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.  Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = match get("ALLOWANCE_BIND_ADDR") {
            Some(addr) => addr.parse().map_err(|err: std::net::AddrParseError| Error::Config {
                key: "ALLOWANCE_BIND_ADDR".into(),
                reason: err.to_string(),
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };
        let history_limit = match get("ALLOWANCE_HISTORY_LIMIT") {
            Some(limit) => match limit.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(Error::Config {
                        key: "ALLOWANCE_HISTORY_LIMIT".into(),
                        reason: format!("expected a positive integer, got {limit:?}"),
                    })
                }
            },
            None => DEFAULT_HISTORY_LIMIT,
        };

        Ok(Self {
            bind_addr,
            schedule_dir: get("ALLOWANCE_SCHEDULE_DIR")
                .map_or_else(|| PathBuf::from("schedules"), PathBuf::from),
            tax_year: get("ALLOWANCE_TAX_YEAR"),
            data_dir: get("ALLOWANCE_DATA_DIR").map(PathBuf::from),
            history_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.schedule_dir, PathBuf::from("schedules"));
        assert_eq!(config.tax_year, None);
        assert_eq!(config.data_dir, None);
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("ALLOWANCE_BIND_ADDR", "0.0.0.0:8080"),
            ("ALLOWANCE_SCHEDULE_DIR", "/etc/allowance"),
            ("ALLOWANCE_TAX_YEAR", "2025"),
            ("ALLOWANCE_DATA_DIR", "/var/lib/allowance"),
            ("ALLOWANCE_HISTORY_LIMIT", "25"),
            ("ALLOWANCE_UNRELATED", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.schedule_dir, PathBuf::from("/etc/allowance"));
        assert_eq!(config.tax_year.as_deref(), Some("2025"));
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/allowance")));
        assert_eq!(config.history_limit, 25);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config(&[("ALLOWANCE_TAX_YEAR", ""), ("ALLOWANCE_DATA_DIR", " ")]).unwrap();
        assert_eq!(config.tax_year, None);
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("ALLOWANCE_BIND_ADDR", "nowhere")]),
            Err(Error::Config { key, .. }) if key == "ALLOWANCE_BIND_ADDR"
        ));
        assert!(matches!(
            config(&[("ALLOWANCE_HISTORY_LIMIT", "0")]),
            Err(Error::Config { key, .. }) if key == "ALLOWANCE_HISTORY_LIMIT"
        ));
    }
}
