//! Tunable thresholds for every scan.
//!
//! Defaults reproduce the reference scoring rules exactly; a config file only
//! needs to name the fields it overrides.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub opposite: OppositeConfig,
    pub bonus: BonusConfig,
    pub mirror: MirrorConfig,
    pub referral: ReferralConfig,
    pub risk: RiskConfig,
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OppositeConfig {
    /// Maximum distance between two trades to count as time-aligned.
    pub window_minutes: f64,
    pub timing_weight: f64,
    pub opposite_weight: f64,
    pub min_confidence: f64,
    /// Share of the pair's combined deposits reported as exposure.
    pub value_factor: f64,
    pub limit: usize,
}

impl Default for OppositeConfig {
    fn default() -> Self {
        Self {
            window_minutes: 10.0,
            timing_weight: 0.4,
            opposite_weight: 0.6,
            min_confidence: 0.5,
            value_factor: 0.3,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    /// Deposits strictly below this are flagged `small_deposit`.
    pub small_deposit: Amount,
    /// Balances strictly below this share of the deposit are flagged `major_withdrawal`.
    pub withdrawal_ratio: f64,
    /// Trade counts in `1..minimal_trades` are flagged `minimal_trades`.
    pub minimal_trades: usize,
    pub max_score: u8,
    pub min_flags: usize,
    pub limit: usize,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            small_deposit: Amount::from_units(200),
            withdrawal_ratio: 0.2,
            minimal_trades: 5,
            max_score: 60,
            min_flags: 2,
            limit: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub window_minutes: f64,
    pub min_trades: usize,
    pub min_group_size: usize,
    /// A trade pair must score strictly above this to count as a match.
    pub min_similarity: f64,
    pub min_mirror_ratio: f64,
    pub value_factor: f64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            window_minutes: 5.0,
            min_trades: 10,
            min_group_size: 3,
            min_similarity: 0.7,
            min_mirror_ratio: 0.5,
            value_factor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralConfig {
    pub max_suspicious_ratio: f64,
    pub min_avg_quality: f64,
    pub min_conversion_rate: f64,
    pub value_factor: f64,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            max_suspicious_ratio: 0.3,
            min_avg_quality: 50.0,
            min_conversion_rate: 0.25,
            value_factor: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub flag_weight: u32,
    pub ring_weight: u32,
    pub suspicious_bonus: u32,
    pub summary_limit: usize,
    pub compact_limit: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            flag_weight: 15,
            ring_weight: 25,
            suspicious_bonus: 20,
            summary_limit: 10,
            compact_limit: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub high_confidence: f64,
    /// Share of a bonus abuser's deposit counted as exposure.
    pub bonus_value_factor: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            high_confidence: 0.75,
            bonus_value_factor: 0.1,
        }
    }
}

impl DetectionConfig {
    /// Load a JSON config file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("opposite.timing_weight", self.opposite.timing_weight),
            ("opposite.opposite_weight", self.opposite.opposite_weight),
            ("opposite.min_confidence", self.opposite.min_confidence),
            ("opposite.value_factor", self.opposite.value_factor),
            ("bonus.withdrawal_ratio", self.bonus.withdrawal_ratio),
            ("mirror.min_similarity", self.mirror.min_similarity),
            ("mirror.min_mirror_ratio", self.mirror.min_mirror_ratio),
            ("mirror.value_factor", self.mirror.value_factor),
            ("referral.max_suspicious_ratio", self.referral.max_suspicious_ratio),
            ("referral.min_conversion_rate", self.referral.min_conversion_rate),
            ("referral.value_factor", self.referral.value_factor),
            ("summary.high_confidence", self.summary.high_confidence),
            ("summary.bonus_value_factor", self.summary.bonus_value_factor),
        ];
        for (field, value) in unit {
            check(field, value, (0.0..=1.0).contains(&value), "0..=1")?;
        }

        let weights = self.opposite.timing_weight + self.opposite.opposite_weight;
        check(
            "opposite.timing_weight + opposite.opposite_weight",
            weights,
            weights <= 1.0 + f64::EPSILON,
            "<= 1",
        )?;

        let windows = [
            ("opposite.window_minutes", self.opposite.window_minutes),
            ("mirror.window_minutes", self.mirror.window_minutes),
        ];
        for (field, value) in windows {
            check(field, value, value > 0.0 && value.is_finite(), "> 0")?;
        }

        check(
            "bonus.max_score",
            self.bonus.max_score as f64,
            self.bonus.max_score <= 100,
            "0..=100",
        )?;
        check(
            "referral.min_avg_quality",
            self.referral.min_avg_quality,
            (0.0..=100.0).contains(&self.referral.min_avg_quality),
            "0..=100",
        )?;

        Ok(())
    }
}

fn check(
    field: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}
