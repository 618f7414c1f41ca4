//! Referral bonus abuse scoring.
//!
//! Each client starts at a quality score of 100 and loses points for every
//! sign of a bonus-harvesting account. Low scores with several independent
//! signals are reported.

use serde::Serialize;
use tracing::{debug, info};

use crate::Amount;
use crate::engine::BonusConfig;
use crate::model::{Client, ClientId, PartnerId};

/// Quality signal raised against a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusFlag {
    NoTrades,
    MinimalTrades,
    MajorWithdrawal,
    SmallDeposit,
    Inactive,
}

impl BonusFlag {
    pub fn label(&self) -> &'static str {
        match self {
            BonusFlag::NoTrades => "no_trades",
            BonusFlag::MinimalTrades => "minimal_trades",
            BonusFlag::MajorWithdrawal => "major_withdrawal",
            BonusFlag::SmallDeposit => "small_deposit",
            BonusFlag::Inactive => "inactive",
        }
    }

    fn penalty(&self) -> u8 {
        match self {
            BonusFlag::NoTrades => 40,
            BonusFlag::MinimalTrades => 25,
            BonusFlag::MajorWithdrawal => 20,
            BonusFlag::SmallDeposit => 10,
            BonusFlag::Inactive => 15,
        }
    }
}

/// Score and flags of a single client, reported or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientQuality {
    pub score: u8,
    pub flags: Vec<BonusFlag>,
}

impl ClientQuality {
    /// Whether this client passes the reporting gate: score under the
    /// threshold *and* enough independent flags.
    pub fn is_reportable(&self, config: &BonusConfig) -> bool {
        self.score < config.max_score && self.flags.len() >= config.min_flags
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusAbuseFinding {
    pub client_id: ClientId,
    pub client_name: String,
    pub partner_id: PartnerId,
    pub quality_score: u8,
    pub flags: Vec<BonusFlag>,
    pub deposit: Amount,
    pub trade_count: usize,
    pub evidence: String,
}

/// Compute the quality score of one client. Flags come out in check order.
pub fn client_quality(client: &Client, config: &BonusConfig) -> ClientQuality {
    let mut flags = Vec::new();

    let trade_count = client.trades.len();
    if trade_count == 0 {
        flags.push(BonusFlag::NoTrades);
    } else if trade_count < config.minimal_trades {
        flags.push(BonusFlag::MinimalTrades);
    }

    // ratio is undefined without a positive deposit
    if client.initial_deposit.is_positive()
        && client.current_balance.to_f64()
            < client.initial_deposit.to_f64() * config.withdrawal_ratio
    {
        flags.push(BonusFlag::MajorWithdrawal);
    }

    if client.initial_deposit < config.small_deposit {
        flags.push(BonusFlag::SmallDeposit);
    }

    if !client.is_active {
        flags.push(BonusFlag::Inactive);
    }

    let penalty: u32 = flags.iter().map(|f| f.penalty() as u32).sum();
    let score = 100u32.saturating_sub(penalty) as u8;

    ClientQuality { score, flags }
}

/// Score every client and report the worst offenders, lowest score first.
pub fn detect_bonus_abuse(clients: &[Client], config: &BonusConfig) -> Vec<BonusAbuseFinding> {
    debug!(clients = clients.len(), "bonus abuse scan started");

    let mut findings: Vec<_> = clients
        .iter()
        .filter_map(|client| {
            let quality = client_quality(client, config);
            quality
                .is_reportable(config)
                .then(|| finding(client, quality))
        })
        .collect();

    let detected = findings.len();
    findings.sort_by_key(|f| f.quality_score);
    findings.truncate(config.limit);

    info!(detected, reported = findings.len(), "bonus abuse scan finished");
    findings
}

fn finding(client: &Client, quality: ClientQuality) -> BonusAbuseFinding {
    BonusAbuseFinding {
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        partner_id: client.referred_by.clone(),
        quality_score: quality.score,
        deposit: client.initial_deposit,
        trade_count: client.trades.len(),
        evidence: evidence(client, &quality.flags),
        flags: quality.flags,
    }
}

fn evidence(client: &Client, flags: &[BonusFlag]) -> String {
    let parts: Vec<String> = flags
        .iter()
        .map(|flag| match flag {
            BonusFlag::NoTrades => "No trading activity recorded after signup.".to_string(),
            BonusFlag::MinimalTrades => format!("Only {} trades executed.", client.trades.len()),
            BonusFlag::MajorWithdrawal => {
                let kept = client.current_balance.to_f64() / client.initial_deposit.to_f64();
                format!("{:.0}% of deposited funds withdrawn.", (1.0 - kept) * 100.0)
            }
            BonusFlag::SmallDeposit => {
                format!("Small initial deposit: ${}.", client.initial_deposit)
            }
            BonusFlag::Inactive => "Account is now inactive.".to_string(),
        })
        .collect();

    if parts.is_empty() {
        "Multiple low-quality indicators detected.".to_string()
    } else {
        parts.join(" ")
    }
}
