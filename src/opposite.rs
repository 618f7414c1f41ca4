//! Cross-partner opposite trading detection.
//!
//! Two clients introduced by different partners who repeatedly take opposite
//! sides of the same instrument within minutes of each other are likely
//! splitting a guaranteed outcome between two accounts.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::Amount;
use crate::dataset::group_by_partner;
use crate::engine::OppositeConfig;
use crate::model::{Client, ClientId, PartnerId, Trade, TradeId};
use crate::timing::timing_correlation;

/// A pair of clients from two distinct partners trading against each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OppositeTradingFinding {
    pub partner_a: PartnerId,
    pub partner_b: PartnerId,
    pub client_a: ClientId,
    pub client_b: ClientId,
    pub client_a_name: String,
    pub client_b_name: String,
    pub confidence: f64,
    pub timing_correlation: f64,
    pub opposite_ratio: f64,
    /// Pearson correlation of per-trade P&L; reported, not weighted.
    pub pnl_correlation: f64,
    pub opposite_pairs: usize,
    pub total_trades: usize,
    pub top_pairs: Vec<OppositePair>,
    pub estimated_value: Amount,
    pub evidence: String,
}

/// One matched BUY/SELL pair kept as an example in a finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OppositePair {
    pub trade_a: TradeId,
    pub trade_b: TradeId,
    pub instrument: String,
    pub minutes_apart: f64,
}

/// Example pairs kept per finding.
const TOP_PAIRS: usize = 5;

/// How often a partner shows up in opposite trading findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerInvolvement {
    pub partner_id: PartnerId,
    pub schemes: usize,
    pub total_value: Amount,
    pub clients: usize,
}

/// Same-instrument, opposite-direction trade pairs at most `window_minutes` apart.
pub fn opposite_pairs<'a>(
    a: &'a [Trade],
    b: &'a [Trade],
    window_minutes: f64,
) -> impl Iterator<Item = (&'a Trade, &'a Trade)> + 'a {
    a.iter().flat_map(move |ta| {
        b.iter()
            .filter(move |tb| {
                ta.instrument == tb.instrument
                    && tb.direction == ta.direction.opposite()
                    && ta.minutes_apart(tb) <= window_minutes
            })
            .map(move |tb| (ta, tb))
    })
}

/// Pearson correlation of profit/loss over the common prefix of both trade
/// lists, in `[-1, 1]`. Fewer than two trades on either side or zero variance
/// gives 0.
pub fn pnl_correlation(a: &[Trade], b: &[Trade]) -> f64 {
    let len = a.len().min(b.len());
    if len < 2 {
        return 0.0;
    }

    let pnl_a: Vec<f64> = a[..len].iter().map(|t| t.profit_loss).collect();
    let pnl_b: Vec<f64> = b[..len].iter().map(|t| t.profit_loss).collect();
    let mean_a = pnl_a.iter().sum::<f64>() / len as f64;
    let mean_b = pnl_b.iter().sum::<f64>() / len as f64;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in pnl_a.iter().zip(&pnl_b) {
        covariance += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}

/// Scan every client pair across distinct partners and return the strongest
/// findings, highest confidence first.
pub fn detect_opposite_trading(
    clients: &[Client],
    config: &OppositeConfig,
) -> Vec<OppositeTradingFinding> {
    let groups = group_by_partner(clients);
    debug!(
        clients = clients.len(),
        partners = groups.len(),
        "opposite trading scan started"
    );

    let mut findings = Vec::new();
    for (i, group_a) in groups.iter().enumerate() {
        for group_b in &groups[i + 1..] {
            for client_a in group_a.clients.iter().filter(|c| !c.trades.is_empty()) {
                for client_b in group_b.clients.iter().filter(|c| !c.trades.is_empty()) {
                    if let Some(finding) = compare_clients(client_a, client_b, config) {
                        findings.push(finding);
                    }
                }
            }
        }
    }

    let detected = findings.len();
    // stable: ties keep partner-pair then client-pair input order
    findings.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    findings.truncate(config.limit);

    info!(
        detected,
        reported = findings.len(),
        "opposite trading scan finished"
    );
    findings
}

fn compare_clients(
    a: &Client,
    b: &Client,
    config: &OppositeConfig,
) -> Option<OppositeTradingFinding> {
    let shortest = a.trades.len().min(b.trades.len());
    if shortest == 0 {
        return None;
    }

    let timing = timing_correlation(&a.trades, &b.trades, config.window_minutes);
    let pairs: Vec<_> = opposite_pairs(&a.trades, &b.trades, config.window_minutes).collect();
    // several counterpart trades can match one trade, so the ratio is capped
    let opposite_ratio = (pairs.len() as f64 / shortest as f64).min(1.0);
    let confidence = config.timing_weight * timing + config.opposite_weight * opposite_ratio;

    if confidence < config.min_confidence {
        return None;
    }

    let exposure = a.initial_deposit.abs() + b.initial_deposit.abs();
    let estimated_value =
        Amount::from_units((exposure.to_f64() * confidence * config.value_factor).round() as i64);

    let instruments: BTreeSet<&str> = pairs.iter().map(|(ta, _)| ta.instrument.as_str()).collect();
    let pnl = pnl_correlation(&a.trades, &b.trades);
    let top_pairs = pairs
        .iter()
        .take(TOP_PAIRS)
        .map(|(ta, tb)| OppositePair {
            trade_a: ta.id.clone(),
            trade_b: tb.id.clone(),
            instrument: ta.instrument.clone(),
            minutes_apart: ta.minutes_apart(tb),
        })
        .collect();

    Some(OppositeTradingFinding {
        partner_a: a.referred_by.clone(),
        partner_b: b.referred_by.clone(),
        client_a: a.id.clone(),
        client_b: b.id.clone(),
        client_a_name: a.name.clone(),
        client_b_name: b.name.clone(),
        confidence,
        timing_correlation: timing,
        opposite_ratio,
        pnl_correlation: pnl,
        opposite_pairs: pairs.len(),
        total_trades: a.trades.len() + b.trades.len(),
        top_pairs,
        estimated_value,
        evidence: evidence(a, b, pairs.len(), timing, pnl, &instruments),
    })
}

fn evidence(
    a: &Client,
    b: &Client,
    pairs: usize,
    timing: f64,
    pnl: f64,
    instruments: &BTreeSet<&str>,
) -> String {
    let mut parts = vec![format!(
        "Detected {pairs} coordinated opposite trades between {} and {}.",
        a.name, b.name
    )];

    if timing > 0.7 {
        parts.push(format!(
            "Trading timing is highly correlated ({:.0}%).",
            timing * 100.0
        ));
    } else if timing > 0.4 {
        parts.push(format!(
            "Trading timing shows moderate correlation ({:.0}%).",
            timing * 100.0
        ));
    }

    if pnl < -0.5 {
        parts.push(format!(
            "Profit/loss shows inverse correlation ({pnl:.2}), consistent with profit-splitting scheme."
        ));
    }

    if !instruments.is_empty() {
        let list: Vec<&str> = instruments.iter().copied().collect();
        parts.push(format!("Opposite trades concentrated in: {}.", list.join(", ")));
    }

    parts.join(" ")
}

/// Roll findings up per partner: schemes touched, exposure, distinct clients.
pub fn partner_involvement(findings: &[OppositeTradingFinding]) -> Vec<PartnerInvolvement> {
    let mut by_partner: HashMap<&str, (usize, Amount, HashSet<&str>)> = HashMap::new();

    for finding in findings {
        let sides = [
            (&finding.partner_a, &finding.client_a),
            (&finding.partner_b, &finding.client_b),
        ];
        for (partner, client) in sides {
            let entry = by_partner.entry(partner.as_str()).or_default();
            entry.0 += 1;
            entry.1 += finding.estimated_value;
            entry.2.insert(client.as_str());
        }
    }

    let mut involvement: Vec<_> = by_partner
        .into_iter()
        .map(|(partner_id, (schemes, total_value, clients))| PartnerInvolvement {
            partner_id: partner_id.to_string(),
            schemes,
            total_value,
            clients: clients.len(),
        })
        .collect();
    involvement.sort_by(|a, b| {
        b.total_value
            .cmp(&a.total_value)
            .then_with(|| a.partner_id.cmp(&b.partner_id))
    });
    involvement
}
