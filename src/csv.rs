use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::bonus::BonusAbuseFinding;
use crate::mirror::MirrorTradingGroup;
use crate::model::FraudRing;
use crate::opposite::{OppositeTradingFinding, PartnerInvolvement};
use crate::referral::PartnerReferralQuality;
use crate::risk::PartnerRiskScore;

/// Errors that can occur when writing csv reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write csv row: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush report: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct OppositeRow<'a> {
    partner_a: &'a str,
    partner_b: &'a str,
    client_a: &'a str,
    client_b: &'a str,
    confidence: String,
    timing_correlation: String,
    pnl_correlation: String,
    opposite_pairs: usize,
    estimated_value: String,
    evidence: &'a str,
}

impl<'a> From<&'a OppositeTradingFinding> for OppositeRow<'a> {
    fn from(f: &'a OppositeTradingFinding) -> Self {
        Self {
            partner_a: &f.partner_a,
            partner_b: &f.partner_b,
            client_a: &f.client_a,
            client_b: &f.client_b,
            confidence: format!("{:.3}", f.confidence),
            timing_correlation: format!("{:.3}", f.timing_correlation),
            pnl_correlation: format!("{:.3}", f.pnl_correlation),
            opposite_pairs: f.opposite_pairs,
            estimated_value: f.estimated_value.to_string(),
            evidence: &f.evidence,
        }
    }
}

#[derive(Debug, Serialize)]
struct BonusRow<'a> {
    client: &'a str,
    partner: &'a str,
    quality_score: u8,
    flags: String,
    deposit: String,
    trades: usize,
    evidence: &'a str,
}

impl<'a> From<&'a BonusAbuseFinding> for BonusRow<'a> {
    fn from(f: &'a BonusAbuseFinding) -> Self {
        let flags: Vec<&str> = f.flags.iter().map(|flag| flag.label()).collect();
        Self {
            client: &f.client_id,
            partner: &f.partner_id,
            quality_score: f.quality_score,
            flags: flags.join(";"),
            deposit: f.deposit.to_string(),
            trades: f.trade_count,
            evidence: &f.evidence,
        }
    }
}

#[derive(Debug, Serialize)]
struct MirrorRow<'a> {
    partner: &'a str,
    clients: String,
    confidence: String,
    total_trades: usize,
    instruments: String,
    estimated_value: String,
}

impl<'a> From<&'a MirrorTradingGroup> for MirrorRow<'a> {
    fn from(g: &'a MirrorTradingGroup) -> Self {
        Self {
            partner: &g.partner_id,
            clients: g.client_ids.join(";"),
            confidence: format!("{:.3}", g.confidence),
            total_trades: g.total_trades,
            instruments: g.common_instruments.join(";"),
            estimated_value: g.estimated_value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RingRow<'a> {
    ring: &'a str,
    r#type: &'a str,
    partners: String,
    clients: String,
    estimated_value: String,
    confidence: String,
    first_detected: String,
}

impl<'a> From<&'a FraudRing> for RingRow<'a> {
    fn from(r: &'a FraudRing) -> Self {
        Self {
            ring: &r.id,
            r#type: &r.kind,
            partners: r.partners_involved.join(";"),
            clients: r.clients_involved.join(";"),
            estimated_value: r.estimated_fraud_value.to_string(),
            confidence: format!("{:.3}", r.detection_confidence),
            first_detected: r.first_detected.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RiskRow<'a> {
    partner: &'a str,
    name: &'a str,
    risk_score: u32,
    flags: usize,
    rings: usize,
    referrals: u32,
}

impl<'a> From<&'a PartnerRiskScore> for RiskRow<'a> {
    fn from(s: &'a PartnerRiskScore) -> Self {
        Self {
            partner: &s.partner_id,
            name: &s.partner_name,
            risk_score: s.risk_score,
            flags: s.flag_count,
            rings: s.ring_count,
            referrals: s.total_referrals,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReferralRow<'a> {
    partner: &'a str,
    r#type: &'a str,
    referrals: usize,
    suspicious: usize,
    suspicious_ratio: String,
    avg_quality: String,
    conversion_rate: String,
    estimated_value: String,
}

impl<'a> From<&'a PartnerReferralQuality> for ReferralRow<'a> {
    fn from(q: &'a PartnerReferralQuality) -> Self {
        Self {
            partner: &q.partner_id,
            r#type: &q.partner_type,
            referrals: q.total_referrals,
            suspicious: q.suspicious_referrals,
            suspicious_ratio: format!("{:.3}", q.suspicious_ratio),
            avg_quality: format!("{:.1}", q.avg_client_quality),
            conversion_rate: format!("{:.3}", q.conversion_rate),
            estimated_value: q.estimated_value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct InvolvementRow<'a> {
    partner: &'a str,
    schemes: usize,
    clients: usize,
    total_value: String,
}

impl<'a> From<&'a PartnerInvolvement> for InvolvementRow<'a> {
    fn from(p: &'a PartnerInvolvement) -> Self {
        Self {
            partner: &p.partner_id,
            schemes: p.schemes,
            clients: p.clients,
            total_value: p.total_value.to_string(),
        }
    }
}

fn write_rows<'a, T, R>(out: impl Write, items: &'a [T]) -> Result<(), ReportError>
where
    R: Serialize + From<&'a T>,
{
    let mut writer = csv::Writer::from_writer(out);
    for item in items {
        writer.serialize(R::from(item))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_opposite(
    out: impl Write,
    findings: &[OppositeTradingFinding],
) -> Result<(), ReportError> {
    write_rows::<_, OppositeRow>(out, findings)
}

pub fn write_bonus(out: impl Write, findings: &[BonusAbuseFinding]) -> Result<(), ReportError> {
    write_rows::<_, BonusRow>(out, findings)
}

pub fn write_mirror(out: impl Write, groups: &[MirrorTradingGroup]) -> Result<(), ReportError> {
    write_rows::<_, MirrorRow>(out, groups)
}

pub fn write_rings(out: impl Write, rings: &[FraudRing]) -> Result<(), ReportError> {
    write_rows::<_, RingRow>(out, rings)
}

pub fn write_risk(out: impl Write, scores: &[PartnerRiskScore]) -> Result<(), ReportError> {
    write_rows::<_, RiskRow>(out, scores)
}

pub fn write_referrals(
    out: impl Write,
    partners: &[PartnerReferralQuality],
) -> Result<(), ReportError> {
    write_rows::<_, ReferralRow>(out, partners)
}

pub fn write_involvement(
    out: impl Write,
    partners: &[PartnerInvolvement],
) -> Result<(), ReportError> {
    write_rows::<_, InvolvementRow>(out, partners)
}
