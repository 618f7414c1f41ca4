//! Fraud scan engine.
//!
//! The engine holds a shared, immutable snapshot and answers independent
//! queries against it. Scans never mutate the snapshot, so they can run
//! concurrently; [`Engine::scan`] does so on the blocking pool and joins the
//! results in a fixed order, making its report identical to
//! [`Engine::scan_blocking`].

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::bonus::{BonusAbuseFinding, detect_bonus_abuse};
use crate::dataset::{Dataset, DatasetProvider};
use crate::mirror::{MirrorTradingGroup, detect_mirror_trading};
use crate::model::FraudRing;
use crate::opposite::{
    OppositeTradingFinding, PartnerInvolvement, detect_opposite_trading, partner_involvement,
};
use crate::referral::{PartnerReferralQuality, analyze_referral_quality};
use crate::risk::{PartnerRiskScore, RankingContext, rank_partners};
use crate::summary::{Summary, SummaryInput, summarize};

mod config;
pub use config::{
    BonusConfig, ConfigError, DetectionConfig, MirrorConfig, OppositeConfig, ReferralConfig,
    RiskConfig, SummaryConfig,
};

mod error;
pub use error::EngineError;

/// Which queries a combined scan should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanRequest {
    pub opposite: bool,
    pub bonus: bool,
    pub mirror: bool,
    pub rings: bool,
}

impl ScanRequest {
    pub fn all() -> Self {
        Self {
            opposite: true,
            bonus: true,
            mirror: true,
            rings: true,
        }
    }
}

/// Results of a combined scan. Parts that were not requested are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub opposite: Option<Vec<OppositeTradingFinding>>,
    pub bonus: Option<Vec<BonusAbuseFinding>>,
    pub mirror: Option<Vec<MirrorTradingGroup>>,
    pub rings: Option<Vec<FraudRing>>,
    pub summary: Summary,
}

/// The fraud scan engine.
#[derive(Debug, Clone)]
pub struct Engine {
    dataset: Arc<Dataset>,
    config: Arc<DetectionConfig>,
}

/// Public API
impl Engine {
    pub fn new(dataset: Arc<Dataset>, config: DetectionConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            dataset,
            config: Arc::new(config),
        })
    }

    /// Load the snapshot once from `provider` and build an engine over it.
    pub fn from_provider(
        provider: &impl DatasetProvider,
        config: DetectionConfig,
    ) -> Result<Self, EngineError> {
        let dataset = provider.load()?;
        Self::new(Arc::new(dataset), config)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn opposite_trading(&self) -> Vec<OppositeTradingFinding> {
        detect_opposite_trading(self.dataset.clients(), &self.config.opposite)
    }

    pub fn bonus_abuse(&self) -> Vec<BonusAbuseFinding> {
        detect_bonus_abuse(self.dataset.clients(), &self.config.bonus)
    }

    pub fn mirror_trading(&self) -> Vec<MirrorTradingGroup> {
        detect_mirror_trading(self.dataset.clients(), &self.config.mirror)
    }

    /// Precomputed rings, passed through untouched.
    pub fn fraud_rings(&self) -> &[FraudRing] {
        self.dataset.fraud_rings()
    }

    pub fn opposite_involvement(&self) -> Vec<PartnerInvolvement> {
        partner_involvement(&self.opposite_trading())
    }

    pub fn referral_quality(&self) -> Vec<PartnerReferralQuality> {
        analyze_referral_quality(
            self.dataset.partners(),
            self.dataset.clients(),
            &self.config.bonus,
            &self.config.referral,
        )
    }

    pub fn risk_ranking(&self, context: RankingContext) -> Vec<PartnerRiskScore> {
        rank_partners(
            self.dataset.partners(),
            self.dataset.fraud_rings(),
            context,
            &self.config.risk,
        )
    }

    /// Run the requested queries one after another on the current thread.
    pub fn scan_blocking(&self, request: ScanRequest) -> ScanReport {
        let opposite = request.opposite.then(|| self.opposite_trading());
        let bonus = request.bonus.then(|| self.bonus_abuse());
        let mirror = request.mirror.then(|| self.mirror_trading());
        self.report(request, opposite, bonus, mirror)
    }

    /// Run the requested queries concurrently on the blocking pool.
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanReport, EngineError> {
        let opposite = request.opposite.then(|| {
            let engine = self.clone();
            tokio::task::spawn_blocking(move || engine.opposite_trading())
        });
        let bonus = request.bonus.then(|| {
            let engine = self.clone();
            tokio::task::spawn_blocking(move || engine.bonus_abuse())
        });
        let mirror = request.mirror.then(|| {
            let engine = self.clone();
            tokio::task::spawn_blocking(move || engine.mirror_trading())
        });

        // joined in a fixed order regardless of completion order
        let opposite = match opposite {
            Some(task) => Some(task.await?),
            None => None,
        };
        let bonus = match bonus {
            Some(task) => Some(task.await?),
            None => None,
        };
        let mirror = match mirror {
            Some(task) => Some(task.await?),
            None => None,
        };

        Ok(self.report(request, opposite, bonus, mirror))
    }
}

/// Private API
impl Engine {
    fn report(
        &self,
        request: ScanRequest,
        opposite: Option<Vec<OppositeTradingFinding>>,
        bonus: Option<Vec<BonusAbuseFinding>>,
        mirror: Option<Vec<MirrorTradingGroup>>,
    ) -> ScanReport {
        let rings = request.rings.then(|| self.fraud_rings().to_vec());

        let summary = summarize(
            SummaryInput {
                opposite: opposite.as_deref(),
                bonus: bonus.as_deref(),
                mirror: mirror.as_deref(),
                rings: rings.as_deref(),
            },
            &self.config.summary,
        );

        info!(
            schemes = summary.total_schemes,
            value = %summary.total_estimated_value,
            high_confidence = summary.high_confidence,
            "scan complete"
        );

        ScanReport {
            opposite,
            bonus,
            mirror,
            rings,
            summary,
        }
    }
}
