//! Pool configuration with TOML file support.

use commons_types::{AssetId, BasisPoints};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::PoolError;

/// Immutable parameters of one pool.
///
/// Can be loaded from a TOML file via [`PoolConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Human-readable pool name.
    pub name: String,

    /// Asset members deposit and requests are paid in.
    #[serde(default = "default_reference_asset")]
    pub reference_asset: AssetId,

    /// Smallest accepted deposit, in raw units of the reference asset.
    #[serde(default = "default_min_deposit")]
    pub min_deposit: u64,

    /// How long a request stays open for votes.
    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,

    /// Fraction of all outstanding shares that must take part in a vote.
    #[serde(default = "default_quorum_bps")]
    pub quorum_bps: BasisPoints,

    /// Fraction of cast weight that must vote yes.
    #[serde(default = "default_approval_bps")]
    pub approval_bps: BasisPoints,

    /// Requests at or above this fraction of the pool need guardian approval.
    #[serde(default = "default_guardian_threshold_bps")]
    pub guardian_threshold_bps: BasisPoints,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_reference_asset() -> AssetId {
    AssetId::Native
}

fn default_min_deposit() -> u64 {
    1
}

fn default_voting_period_secs() -> u64 {
    3 * 24 * 60 * 60
}

fn default_quorum_bps() -> BasisPoints {
    BasisPoints::from_raw_unchecked(5_000)
}

fn default_approval_bps() -> BasisPoints {
    BasisPoints::from_raw_unchecked(6_000)
}

fn default_guardian_threshold_bps() -> BasisPoints {
    BasisPoints::from_raw_unchecked(2_000)
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PoolConfig {
    /// A config with default governance parameters.
    pub fn new(name: impl Into<String>, reference_asset: AssetId) -> Self {
        Self {
            name: name.into(),
            reference_asset,
            min_deposit: default_min_deposit(),
            voting_period_secs: default_voting_period_secs(),
            quorum_bps: default_quorum_bps(),
            approval_bps: default_approval_bps(),
            guardian_threshold_bps: default_guardian_threshold_bps(),
        }
    }

    pub fn with_min_deposit(mut self, min_deposit: u64) -> Self {
        self.min_deposit = min_deposit;
        self
    }

    pub fn with_voting_period(mut self, secs: u64) -> Self {
        self.voting_period_secs = secs;
        self
    }

    pub fn with_thresholds(
        mut self,
        quorum: BasisPoints,
        approval: BasisPoints,
        guardian_threshold: BasisPoints,
    ) -> Self {
        self.quorum_bps = quorum;
        self.approval_bps = approval;
        self.guardian_threshold_bps = guardian_threshold;
        self
    }

    /// Reject configurations a pool cannot run with.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.name.trim().is_empty() {
            return Err(PoolError::Config("name must not be empty".into()));
        }
        if self.voting_period_secs == 0 {
            return Err(PoolError::Config("voting_period_secs must be > 0".into()));
        }
        if self.approval_bps.is_zero() {
            return Err(PoolError::Config("approval_bps must be > 0".into()));
        }
        if let AssetId::Token(address) = &self.reference_asset {
            if !address.is_valid() {
                return Err(PoolError::Config("reference token address is empty".into()));
            }
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PoolError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PoolError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, PoolError> {
        let config: Self = toml::from_str(s).map_err(|e| PoolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, PoolError> {
        toml::to_string_pretty(self).map_err(|e| PoolError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_round_trips_through_toml() {
        let config = PoolConfig::new("garden", AssetId::Native).with_min_deposit(25);
        let toml_str = config.to_toml_string().unwrap();
        let parsed = PoolConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = PoolConfig::from_toml_str(r#"name = "garden""#).unwrap();
        assert_eq!(config.reference_asset, AssetId::Native);
        assert_eq!(config.quorum_bps.raw(), 5_000);
        assert_eq!(config.approval_bps.raw(), 6_000);
        assert_eq!(config.guardian_threshold_bps.raw(), 2_000);
        assert_eq!(config.voting_period_secs, 259_200);
    }

    #[test]
    fn token_reference_asset_parses() {
        let toml = r#"
            name = "garden"
            reference_asset = { token = "usdc" }
            quorum_bps = 4000
        "#;
        let config = PoolConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.reference_asset, AssetId::token("usdc"));
        assert_eq!(config.quorum_bps.raw(), 4_000);
    }

    #[test]
    fn out_of_range_bps_rejected() {
        let toml = r#"
            name = "garden"
            approval_bps = 10001
        "#;
        assert!(matches!(
            PoolConfig::from_toml_str(toml),
            Err(PoolError::Config(_))
        ));
    }

    #[test]
    fn validation_rejects_zero_voting_period() {
        let config = PoolConfig::new("garden", AssetId::Native).with_voting_period(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"from-file\"\nmin_deposit = 100").unwrap();
        let config = PoolConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.name, "from-file");
        assert_eq!(config.min_deposit, 100);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = PoolConfig::from_toml_file("/nonexistent/pool.toml");
        assert!(matches!(result, Err(PoolError::Config(_))));
    }
}
