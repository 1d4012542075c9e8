//! Store connection configuration and environment variable handling.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// InfluxDB v2 connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    /// Base URL of the InfluxDB HTTP API
    pub url: String,
    /// API token; required for the remote repository
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Tag compared against the `tags` read parameter
    pub tag_key: String,
    /// Per-request timeout for the HTTP client
    pub timeout_secs: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: String::new(),
            org: "CCAM_DF".to_string(),
            bucket: "CCAM_DF_Prep_Project".to_string(),
            tag_key: "dataItemId".to_string(),
            timeout_secs: 30,
        }
    }
}

impl InfluxConfig {
    /// Overlay any `INFLUX_*` variables that are set onto `self`.
    ///
    /// # Environment Variables
    /// - `INFLUX_URL` (default: `http://localhost:8086`)
    /// - `INFLUX_TOKEN` (required by [`InfluxConfig::validate`])
    /// - `INFLUX_ORG` (default: `CCAM_DF`)
    /// - `INFLUX_BUCKET` (default: `CCAM_DF_Prep_Project`)
    /// - `INFLUX_TAG_KEY` (default: `dataItemId`)
    /// - `INFLUX_TIMEOUT_SECS` (default: 30)
    pub fn apply_env(&mut self) -> Result<(), String> {
        override_string(&mut self.url, "INFLUX_URL");
        override_string(&mut self.token, "INFLUX_TOKEN");
        override_string(&mut self.org, "INFLUX_ORG");
        override_string(&mut self.bucket, "INFLUX_BUCKET");
        override_string(&mut self.tag_key, "INFLUX_TAG_KEY");
        override_parsed(&mut self.timeout_secs, "INFLUX_TIMEOUT_SECS")?;
        Ok(())
    }

    /// Check the settings needed to talk to a real server.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.is_empty() {
            return Err("INFLUX_TOKEN must be set for the remote repository".to_string());
        }
        if self.url.is_empty() || self.org.is_empty() || self.bucket.is_empty() {
            return Err("InfluxDB url, org and bucket must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("INFLUX_TIMEOUT_SECS must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// MongoDB connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub data_collection: String,
    pub equipment_collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://127.0.0.1:27017".to_string(),
            database: "DigFactDB".to_string(),
            data_collection: "datas".to_string(),
            equipment_collection: "equipment".to_string(),
        }
    }
}

impl MongoConfig {
    /// Overlay `MONGO_URI` and `MONGO_DATABASE` when set.
    pub fn apply_env(&mut self) {
        override_string(&mut self.uri, "MONGO_URI");
        override_string(&mut self.database, "MONGO_DATABASE");
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Overlay `HOST`, `PORT` and `BODY_LIMIT_BYTES` when set.
    pub fn apply_env(&mut self) -> Result<(), String> {
        override_string(&mut self.host, "HOST");
        override_parsed(&mut self.port, "PORT")?;
        override_parsed(&mut self.body_limit_bytes, "BODY_LIMIT_BYTES")?;
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn override_string(target: &mut String, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

fn override_parsed<T: FromStr>(target: &mut T, var: &str) -> Result<(), String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => {
            *target = value
                .trim()
                .parse()
                .map_err(|_| format!("{} has an invalid value: {}", var, value))?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let influx = InfluxConfig::default();
        assert_eq!(influx.org, "CCAM_DF");
        assert_eq!(influx.bucket, "CCAM_DF_Prep_Project");
        assert!(influx.validate().is_err());

        let mongo = MongoConfig::default();
        assert_eq!(mongo.database, "DigFactDB");
        assert_eq!(mongo.data_collection, "datas");

        assert_eq!(ServerConfig::default().bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_with_token() {
        let config = InfluxConfig {
            token: "secret".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let no_timeout = InfluxConfig {
            timeout_secs: 0,
            ..config
        };
        assert!(no_timeout.validate().is_err());
    }
}
