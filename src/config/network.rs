//! Route network configuration loading from config.toml
//!
//! This module loads the flat base fares used for self-routes and the route/fare table used
//! to seed an empty database. Both sections are optional: a missing `[fares]` table falls back
//! to the standard base fares and a missing `[[routes]]` list seeds nothing.

use crate::core::fare::BaseFares;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration file used when `TRANSPORT_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Flat fares for trips that start and end at the same stop
    #[serde(default)]
    pub fares: BaseFares,
    /// Routes (and their fares) to seed into an empty database
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Configuration for a single priced route
#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    /// Origin label
    pub origin: String,
    /// Destination label
    pub destination: String,
    /// Distance in kilometres
    pub distance: f64,
    /// Full price
    pub price: f64,
    /// Discounted price for Student, Senior and PWD passengers
    pub discount: f64,
}

/// Loads network configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A route entry is missing a field
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads configuration from `TRANSPORT_CONFIG`, or `./config.toml` when unset.
///
/// A missing default file is not an error; the defaults are used instead. An explicitly
/// configured path that cannot be read is.
pub fn load_default_config() -> Result<Config> {
    match std::env::var("TRANSPORT_CONFIG") {
        Ok(path) => load_config(path),
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
        Err(_) => {
            tracing::warn!("No {DEFAULT_CONFIG_PATH} found, using default base fares");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_network_config() {
        let toml_str = r#"
            [fares]
            base_regular = 13.0
            base_discounted = 10.4

            [[routes]]
            origin = "Antipolo"
            destination = "T.I.P."
            distance = 17.7
            price = 45.14
            discount = 36.11

            [[routes]]
            origin = "Cubao"
            destination = "Antipolo"
            distance = 16.4
            price = 42.0
            discount = 33.6
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.fares.base_regular, 13.0);
        assert_eq!(config.fares.base_discounted, 10.4);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].origin, "Antipolo");
        assert_eq!(config.routes[0].price, 45.14);
        assert_eq!(config.routes[1].destination, "Antipolo");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.fares, BaseFares::default());
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_route_missing_field_is_rejected() {
        let toml_str = r#"
            [[routes]]
            origin = "Antipolo"
            destination = "T.I.P."
            distance = 17.7
            price = 45.14
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
