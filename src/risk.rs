//! Per-partner risk ranking.

use serde::Serialize;
use tracing::debug;

use crate::engine::RiskConfig;
use crate::model::{FraudRing, Partner, PartnerId};

/// Where the ranking is displayed; decides how many partners are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingContext {
    Summary,
    Compact,
}

impl RankingContext {
    pub fn limit(&self, config: &RiskConfig) -> usize {
        match self {
            RankingContext::Summary => config.summary_limit,
            RankingContext::Compact => config.compact_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerRiskScore {
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub risk_score: u32,
    pub flag_count: usize,
    pub ring_count: usize,
    pub total_referrals: u32,
}

/// Score partners that are marked suspicious or carry fraud flags, highest
/// risk first.
///
/// A partner that only appears in rings, with no flag and no suspicion mark,
/// is not scored at all.
pub fn rank_partners(
    partners: &[Partner],
    rings: &[FraudRing],
    context: RankingContext,
    config: &RiskConfig,
) -> Vec<PartnerRiskScore> {
    let mut ranked: Vec<_> = partners
        .iter()
        .filter(|p| p.is_suspicious || !p.fraud_flags.is_empty())
        .map(|partner| {
            let flag_count = partner.fraud_flags.len();
            let ring_count = rings.iter().filter(|r| r.involves_partner(&partner.id)).count();
            let suspicious = if partner.is_suspicious {
                config.suspicious_bonus
            } else {
                0
            };
            let raw = (flag_count as u32)
                .saturating_mul(config.flag_weight)
                .saturating_add((ring_count as u32).saturating_mul(config.ring_weight))
                .saturating_add(suspicious);

            PartnerRiskScore {
                partner_id: partner.id.clone(),
                partner_name: partner.name.clone(),
                risk_score: raw.min(100),
                flag_count,
                ring_count,
                total_referrals: partner.total_referrals,
            }
        })
        .collect();

    let scored = ranked.len();
    ranked.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    ranked.truncate(context.limit(config));

    debug!(scored, reported = ranked.len(), ?context, "partners ranked");
    ranked
}
