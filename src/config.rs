//! Access log configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! enabled = true
//! max_payload_len = 512
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Settings for the [`AccessLogger`](crate::middleware::AccessLogger).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessLogConfig {
    /// When false nothing is emitted. Interception and error propagation
    /// are unaffected.
    pub enabled: bool,

    /// Longest `req=` / `rsp=` rendering, in characters, before it is cut
    /// and suffixed with `...`.
    pub max_payload_len: Option<usize>,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self { enabled: true, max_payload_len: None }
    }
}

impl AccessLogConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.max_payload_len == Some(0) {
            return Err(Error::Config("max_payload_len must be at least 1".into()));
        }
        Ok(())
    }
}
