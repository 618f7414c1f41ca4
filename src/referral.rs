//! Partner-level referral quality.
//!
//! A partner whose book is dominated by low-quality referrals, or whose
//! referrals rarely stay active, is a likely bonus farm even when no single
//! client stands out.

use serde::Serialize;
use tracing::{debug, info};

use crate::Amount;
use crate::bonus::client_quality;
use crate::dataset::group_by_partner;
use crate::engine::{BonusConfig, ReferralConfig};
use crate::model::{Client, Partner, PartnerId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerReferralQuality {
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub partner_type: String,
    pub total_referrals: usize,
    pub suspicious_referrals: usize,
    pub suspicious_ratio: f64,
    pub avg_client_quality: f64,
    pub conversion_rate: f64,
    pub estimated_value: Amount,
    pub evidence: String,
}

/// Flag partners whose referred clients look like bonus harvesting, sorted by
/// share of suspicious referrals.
pub fn analyze_referral_quality(
    partners: &[Partner],
    clients: &[Client],
    bonus: &BonusConfig,
    config: &ReferralConfig,
) -> Vec<PartnerReferralQuality> {
    debug!(partners = partners.len(), "referral quality analysis started");

    let groups = group_by_partner(clients);
    let mut flagged = Vec::new();

    for partner in partners {
        let Some(group) = groups.iter().find(|g| g.partner_id == partner.id) else {
            continue;
        };
        let referred = &group.clients;
        let total = referred.len();

        let mut suspicious = 0usize;
        let mut quality_sum = 0u32;
        let mut suspicious_deposits = Amount::ZERO;
        for client in referred {
            let quality = client_quality(client, bonus);
            quality_sum += quality.score as u32;
            if quality.is_reportable(bonus) {
                suspicious += 1;
                suspicious_deposits += client.initial_deposit;
            }
        }
        let active = referred.iter().filter(|c| c.is_active).count();

        let suspicious_ratio = suspicious as f64 / total as f64;
        let avg_quality = quality_sum as f64 / total as f64;
        let conversion_rate = active as f64 / total as f64;

        let is_flagged = suspicious_ratio > config.max_suspicious_ratio
            || avg_quality < config.min_avg_quality
            || conversion_rate < config.min_conversion_rate;
        if !is_flagged {
            continue;
        }

        flagged.push(PartnerReferralQuality {
            partner_id: partner.id.clone(),
            partner_name: partner.name.clone(),
            partner_type: partner.kind.label().to_string(),
            total_referrals: total,
            suspicious_referrals: suspicious,
            suspicious_ratio,
            avg_client_quality: avg_quality,
            conversion_rate,
            estimated_value: suspicious_deposits.scale(config.value_factor),
            evidence: evidence(referred, suspicious, conversion_rate),
        });
    }

    flagged.sort_by(|a, b| b.suspicious_ratio.total_cmp(&a.suspicious_ratio));

    info!(flagged = flagged.len(), "referral quality analysis finished");
    flagged
}

fn evidence(clients: &[&Client], suspicious: usize, conversion_rate: f64) -> String {
    let total = clients.len();
    let mut parts = vec![
        format!("Partner has {total} referrals with {suspicious} flagged as suspicious."),
        format!(
            "Client conversion rate: {:.0}% (below 25% is concerning).",
            conversion_rate * 100.0
        ),
    ];

    let inactive = clients.iter().filter(|c| !c.is_active).count();
    if inactive * 2 > total {
        parts.push(format!("{inactive}/{total} referred clients are now inactive."));
    }

    let deposits: Amount = clients.iter().map(|c| c.initial_deposit).sum();
    let avg_deposit = deposits.to_f64() / total as f64;
    if avg_deposit < 300.0 {
        parts.push(format!("Average deposit ${avg_deposit:.2} is suspiciously low."));
    }

    parts.join(" ")
}
