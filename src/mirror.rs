//! Mirror trading: clients of one partner trading in lockstep.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::Amount;
use crate::dataset::group_by_partner;
use crate::engine::MirrorConfig;
use crate::model::{Client, ClientId, PartnerId, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirrorTradingGroup {
    pub partner_id: PartnerId,
    pub client_ids: Vec<ClientId>,
    pub client_names: Vec<String>,
    pub confidence: f64,
    pub total_trades: usize,
    pub common_instruments: Vec<String>,
    pub estimated_value: Amount,
    pub evidence: String,
}

/// Similarity of two trades in `[0, 1]`: the mean of instrument match,
/// direction match, volume closeness and timing closeness.
pub fn trade_similarity(a: &Trade, b: &Trade, window_minutes: f64) -> f64 {
    let mut score = 0.0;

    if a.instrument == b.instrument {
        score += 1.0;
    }
    if a.direction == b.direction {
        score += 1.0;
    }

    let largest = a.volume.max(b.volume);
    if largest > 0.0 {
        let ratio = a.volume.min(b.volume) / largest;
        if ratio >= 0.8 {
            score += 1.0;
        } else if ratio >= 0.5 {
            score += 0.5;
        }
    }

    let diff = a.minutes_apart(b);
    if diff <= window_minutes {
        score += 1.0 - diff / window_minutes;
    }

    score / 4.0
}

/// Greedy one-to-one matching: each trade of `a` takes the most similar
/// unused trade of `b` scoring strictly above `min_similarity`.
pub fn matching_trades(a: &[Trade], b: &[Trade], config: &MirrorConfig) -> usize {
    let mut used = vec![false; b.len()];
    let mut matches = 0;

    for ta in a {
        let mut best: Option<(usize, f64)> = None;
        for (idx, tb) in b.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let similarity = trade_similarity(ta, tb, config.window_minutes);
            let threshold = best.map_or(config.min_similarity, |(_, s)| s);
            if similarity > threshold {
                best = Some((idx, similarity));
            }
        }
        if let Some((idx, _)) = best {
            used[idx] = true;
            matches += 1;
        }
    }

    matches
}

fn mirror_ratio(a: &Client, b: &Client, config: &MirrorConfig) -> f64 {
    let shortest = a.trades.len().min(b.trades.len());
    if shortest == 0 {
        return 0.0;
    }
    matching_trades(&a.trades, &b.trades, config) as f64 / shortest as f64
}

/// Find clusters of same-partner clients whose trades mirror one another,
/// highest confidence first.
pub fn detect_mirror_trading(
    clients: &[Client],
    config: &MirrorConfig,
) -> Vec<MirrorTradingGroup> {
    let eligible = clients.iter().filter(|c| c.trades.len() >= config.min_trades);
    let groups = group_by_partner(eligible);
    debug!(partners = groups.len(), "mirror trading scan started");

    let mut detected = Vec::new();
    for group in groups.iter().filter(|g| g.clients.len() >= config.min_group_size) {
        let members = &group.clients;
        let n = members.len();

        let mut similarity = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i + 1..n {
                let ratio = mirror_ratio(members[i], members[j], config);
                similarity[i][j] = ratio;
                similarity[j][i] = ratio;
            }
        }

        let mut clustered = HashSet::new();
        for i in 0..n {
            if clustered.contains(&i) {
                continue;
            }
            let mut cluster = vec![i];
            for j in i + 1..n {
                if clustered.contains(&j) {
                    continue;
                }
                if cluster.iter().all(|&k| similarity[j][k] >= config.min_mirror_ratio) {
                    cluster.push(j);
                }
            }

            if cluster.len() >= config.min_group_size {
                let cluster_clients: Vec<&Client> = cluster.iter().map(|&k| members[k]).collect();
                let confidence = cluster_confidence(&cluster, &similarity);
                detected.push(mirror_group(group.partner_id, &cluster_clients, confidence, config));
                clustered.extend(cluster);
            }
        }
    }

    detected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    info!(groups = detected.len(), "mirror trading scan finished");
    detected
}

/// Mean pairwise ratio within the cluster, rounded to 3 decimals.
fn cluster_confidence(cluster: &[usize], similarity: &[Vec<f64>]) -> f64 {
    let mut sum = 0.0;
    for (pos, &i) in cluster.iter().enumerate() {
        for &j in &cluster[pos + 1..] {
            sum += similarity[i][j];
        }
    }
    let k = cluster.len() as f64;
    let pairs = (k * (k - 1.0) / 2.0).max(1.0);
    (sum / pairs * 1000.0).round() / 1000.0
}

fn mirror_group(
    partner_id: &str,
    clients: &[&Client],
    confidence: f64,
    config: &MirrorConfig,
) -> MirrorTradingGroup {
    let trades: Vec<&Trade> = clients.iter().flat_map(|c| c.trades.iter()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for trade in &trades {
        *counts.entry(trade.instrument.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let common_instruments: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|(i, _)| i.to_string())
        .collect();

    let pnl: f64 = trades.iter().map(|t| t.profit_loss.abs()).sum();

    let evidence = format!(
        "Detected {} accounts trading in lockstep under same partner. Combined {} trades analyzed.{}",
        clients.len(),
        trades.len(),
        if common_instruments.is_empty() {
            String::new()
        } else {
            format!(" Concentrated trading in: {}.", common_instruments.join(", "))
        }
    );

    MirrorTradingGroup {
        partner_id: partner_id.to_string(),
        client_ids: clients.iter().map(|c| c.id.clone()).collect(),
        client_names: clients.iter().map(|c| c.name.clone()).collect(),
        confidence,
        total_trades: trades.len(),
        common_instruments,
        estimated_value: Amount::from_float(pnl * config.value_factor),
        evidence,
    }
}
