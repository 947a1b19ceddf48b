//! CCA configuration
//!
//! Defaults encode the doctrine constants. A TOML file may override them:
//!
//! ```toml
//! [probe]
//! max_attempts = 3
//! backoff_base_ms = 1000
//!
//! [probe.ttl]
//! kind = "calendar_year"
//!
//! [gate]
//! max_retries = 3
//! default_ceiling = "medium"
//! ```

use crate::confidence::Confidence;
use crate::error::ConfigError;
use crate::ttl::TtlPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum content snippet length handed to detectors
pub const MAX_SNIPPET_CHARS: usize = 5000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcaConfig {
    /// Probe settings
    pub probe: ProbeConfig,
    /// Gate and pass-consumption settings
    pub gate: GateConfig,
}

impl CcaConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With probe settings
    #[inline]
    #[must_use]
    pub fn with_probe(mut self, probe: ProbeConfig) -> Self {
        self.probe = probe;
        self
    }

    /// With gate settings
    #[inline]
    #[must_use]
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for
    /// out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CcaConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` when the file cannot be read, otherwise as
    /// [`CcaConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded CCA config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.max_attempts == 0 {
            return Err(ConfigError::Invalid("probe.max_attempts must be >= 1".into()));
        }
        if !self.probe.ttl.is_positive() {
            return Err(ConfigError::Invalid("probe.ttl must be positive".into()));
        }
        if self.probe.snippet_limit == 0 || self.probe.snippet_limit > MAX_SNIPPET_CHARS {
            return Err(ConfigError::Invalid(format!(
                "probe.snippet_limit must be within 1..={MAX_SNIPPET_CHARS}"
            )));
        }
        if self.gate.default_ceiling == Confidence::High {
            return Err(ConfigError::Invalid(
                "gate.default_ceiling cannot be high; high requires cited manual verification".into(),
            ));
        }
        Ok(())
    }
}

/// Probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// TTL for the profile-oriented record
    pub ttl: TtlPolicy,
    /// Total attempts made by the retry wrapper
    pub max_attempts: u32,
    /// Linear backoff unit; attempt `n` waits `n * backoff_base_ms`
    pub backoff_base_ms: u64,
    /// Snippet truncation length
    pub snippet_limit: usize,
    /// Fan detectors out across threads
    pub parallel_detectors: bool,
}

impl ProbeConfig {
    /// Backoff unit as a duration
    #[inline]
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// With total attempts
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// With backoff unit
    #[inline]
    #[must_use]
    pub fn with_backoff_base_ms(mut self, ms: u64) -> Self {
        self.backoff_base_ms = ms;
        self
    }

    /// With TTL policy
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ttl: TtlPolicy::CalendarYear,
            max_attempts: 3,
            backoff_base_ms: 1000,
            snippet_limit: MAX_SNIPPET_CHARS,
            parallel_detectors: true,
        }
    }
}

/// Gate and pass-consumption settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Retry count at which the probe stage escalates to a human
    pub max_retries: u32,
    /// Ceiling assumed when a profile leaves it unset; never `high`
    pub default_ceiling: Confidence,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            default_ceiling: Confidence::Medium,
        }
    }
}
