//! Core domain records of the fraud snapshot.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Amount;

/// Partner (affiliate) identifier.
pub type PartnerId = String;

/// Client identifier.
pub type ClientId = String;

/// Trade identifier.
pub type TradeId = String;

/// Fraud ring identifier.
pub type RingId = String;

/// Position of a partner in the affiliate program. Unrecognised labels are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartnerType {
    Master,
    SubAffiliate,
    Other(String),
}

impl PartnerType {
    pub fn label(&self) -> &str {
        match self {
            PartnerType::Master => "master",
            PartnerType::SubAffiliate => "sub_affiliate",
            PartnerType::Other(label) => label,
        }
    }
}

impl From<String> for PartnerType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "master" => PartnerType::Master,
            "sub_affiliate" => PartnerType::SubAffiliate,
            _ => PartnerType::Other(label),
        }
    }
}

impl From<PartnerType> for String {
    fn from(kind: PartnerType) -> Self {
        match kind {
            PartnerType::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// An introducing partner. Partners form a forest through `parent_id`;
/// nothing in this crate walks that hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    #[serde(alias = "partner_id")]
    pub id: PartnerId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PartnerType,
    #[serde(default)]
    pub parent_id: Option<PartnerId>,
    #[serde(default)]
    pub is_suspicious: bool,
    #[serde(default)]
    pub total_referrals: u32,
    #[serde(default)]
    pub fraud_flags: Vec<String>,
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(alias = "trade_id")]
    pub id: TradeId,
    pub client_id: ClientId,
    pub timestamp: NaiveDateTime,
    pub instrument: String,
    pub direction: Direction,
    pub volume: f64,
    pub price: f64,
    #[serde(default)]
    pub profit_loss: f64,
}

impl Trade {
    /// Absolute distance between two trades, in (fractional) minutes.
    pub fn minutes_apart(&self, other: &Trade) -> f64 {
        (self.timestamp - other.timestamp).num_milliseconds().abs() as f64 / 60_000.0
    }
}

/// A referred client with its full trade history. The trade list carries no
/// ordering guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(alias = "client_id")]
    pub id: ClientId,
    pub name: String,
    pub referred_by: PartnerId,
    pub initial_deposit: Amount,
    pub current_balance: Amount,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub fraud_flags: Vec<String>,
}

fn default_active() -> bool {
    true
}

/// A fraud cluster detected upstream, consumed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    #[serde(alias = "ring_id")]
    pub id: RingId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub partners_involved: Vec<PartnerId>,
    #[serde(default)]
    pub clients_involved: Vec<ClientId>,
    pub estimated_fraud_value: Amount,
    pub detection_confidence: f64,
    pub first_detected: NaiveDateTime,
}

impl FraudRing {
    pub fn involves_partner(&self, partner: &str) -> bool {
        self.partners_involved.iter().any(|p| p == partner)
    }
}
