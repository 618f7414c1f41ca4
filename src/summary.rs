//! Roll scan results and precomputed rings into headline totals.
//!
//! Findings and rings are summed independently. A ring and a finding that
//! describe the same scheme are both counted; they are never reconciled here.

use serde::Serialize;

use crate::Amount;
use crate::bonus::BonusAbuseFinding;
use crate::engine::SummaryConfig;
use crate::mirror::MirrorTradingGroup;
use crate::model::FraudRing;
use crate::opposite::OppositeTradingFinding;

/// Anything that contributes to the summary.
pub trait Exposure {
    /// Confidence in `[0, 1]` used for the high-confidence count.
    fn confidence(&self, config: &SummaryConfig) -> f64;

    /// Monetary exposure counted towards the total.
    fn exposure(&self, config: &SummaryConfig) -> Amount;
}

impl Exposure for OppositeTradingFinding {
    fn confidence(&self, _: &SummaryConfig) -> f64 {
        self.confidence
    }

    fn exposure(&self, _: &SummaryConfig) -> Amount {
        self.estimated_value
    }
}

impl Exposure for MirrorTradingGroup {
    fn confidence(&self, _: &SummaryConfig) -> f64 {
        self.confidence
    }

    fn exposure(&self, _: &SummaryConfig) -> Amount {
        self.estimated_value
    }
}

/// Derived for reporting only; nothing is written back to the finding.
impl Exposure for BonusAbuseFinding {
    fn confidence(&self, _: &SummaryConfig) -> f64 {
        (100.0 - self.quality_score as f64) / 100.0
    }

    fn exposure(&self, config: &SummaryConfig) -> Amount {
        self.deposit.scale(config.bonus_value_factor)
    }
}

impl Exposure for FraudRing {
    fn confidence(&self, _: &SummaryConfig) -> f64 {
        self.detection_confidence
    }

    fn exposure(&self, _: &SummaryConfig) -> Amount {
        self.estimated_fraud_value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_schemes: usize,
    pub total_estimated_value: Amount,
    pub high_confidence: usize,
    pub opposite_trading: usize,
    pub bonus_abuse: usize,
    pub mirror_trading: usize,
    pub fraud_rings: usize,
}

/// Inputs to [`summarize`]; `None` means the query was not requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryInput<'a> {
    pub opposite: Option<&'a [OppositeTradingFinding]>,
    pub bonus: Option<&'a [BonusAbuseFinding]>,
    pub mirror: Option<&'a [MirrorTradingGroup]>,
    pub rings: Option<&'a [FraudRing]>,
}

pub fn summarize(input: SummaryInput<'_>, config: &SummaryConfig) -> Summary {
    let mut summary = Summary::default();

    if let Some(items) = input.opposite {
        summary.opposite_trading = accumulate(&mut summary, items, config);
    }
    if let Some(items) = input.bonus {
        summary.bonus_abuse = accumulate(&mut summary, items, config);
    }
    if let Some(items) = input.mirror {
        summary.mirror_trading = accumulate(&mut summary, items, config);
    }
    if let Some(items) = input.rings {
        summary.fraud_rings = accumulate(&mut summary, items, config);
    }

    summary
}

fn accumulate<T: Exposure>(summary: &mut Summary, items: &[T], config: &SummaryConfig) -> usize {
    for item in items {
        summary.total_estimated_value += item.exposure(config);
        if item.confidence(config) >= config.high_confidence {
            summary.high_confidence += 1;
        }
    }
    summary.total_schemes += items.len();
    items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusFlag;
    use crate::fixtures::ring;

    fn opposite(confidence: f64, value: i64) -> OppositeTradingFinding {
        OppositeTradingFinding {
            partner_a: "P1".into(),
            partner_b: "P2".into(),
            client_a: "A".into(),
            client_b: "B".into(),
            client_a_name: "A".into(),
            client_b_name: "B".into(),
            confidence,
            timing_correlation: 0.0,
            opposite_ratio: 0.0,
            pnl_correlation: 0.0,
            opposite_pairs: 1,
            total_trades: 2,
            top_pairs: vec![],
            estimated_value: Amount::from_units(value),
            evidence: String::new(),
        }
    }

    fn bonus(score: u8, deposit: i64) -> BonusAbuseFinding {
        BonusAbuseFinding {
            client_id: "C".into(),
            client_name: "C".into(),
            partner_id: "P1".into(),
            quality_score: score,
            flags: vec![BonusFlag::NoTrades, BonusFlag::Inactive],
            deposit: Amount::from_units(deposit),
            trade_count: 0,
            evidence: String::new(),
        }
    }

    #[test]
    fn totals_combine_findings_and_rings() {
        let opposite = [opposite(0.92, 552), opposite(0.6, 100)];
        let bonus = [bonus(15, 150), bonus(45, 300)];
        let rings = [ring("R1", &["P1"], 1000, 0.8)];

        let summary = summarize(
            SummaryInput {
                opposite: Some(&opposite),
                bonus: Some(&bonus),
                mirror: None,
                rings: Some(&rings),
            },
            &SummaryConfig::default(),
        );

        assert_eq!(summary.total_schemes, 5);
        // 552 + 100 + 15 + 30 + 1000
        assert_eq!(summary.total_estimated_value, Amount::from_units(1697));
        // 0.92, bonus score 15 -> 0.85, ring 0.8
        assert_eq!(summary.high_confidence, 3);
        assert_eq!(summary.opposite_trading, 2);
        assert_eq!(summary.bonus_abuse, 2);
        assert_eq!(summary.mirror_trading, 0);
        assert_eq!(summary.fraud_rings, 1);
    }

    #[test]
    fn only_requested_parts_contribute() {
        let rings = [ring("R1", &["P1"], 250, 0.5)];
        let summary = summarize(
            SummaryInput {
                rings: Some(&rings),
                ..SummaryInput::default()
            },
            &SummaryConfig::default(),
        );
        assert_eq!(summary.total_schemes, 1);
        assert_eq!(summary.total_estimated_value, Amount::from_units(250));
        assert_eq!(summary.high_confidence, 0);
    }

    #[test]
    fn bonus_confidence_boundary_is_inclusive() {
        // score 25 -> exactly 0.75
        let finding = bonus(25, 100);
        assert_eq!(finding.confidence(&SummaryConfig::default()), 0.75);
        let summary = summarize(
            SummaryInput {
                bonus: Some(std::slice::from_ref(&finding)),
                ..SummaryInput::default()
            },
            &SummaryConfig::default(),
        );
        assert_eq!(summary.high_confidence, 1);
    }

    #[test]
    fn empty_input_is_empty_summary() {
        let summary = summarize(SummaryInput::default(), &SummaryConfig::default());
        assert_eq!(summary, Summary::default());
    }
}
