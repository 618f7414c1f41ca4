//! Record builders shared by unit tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::Amount;
use crate::model::{Client, Direction, FraudRing, Partner, PartnerType, Trade};

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Trade `minutes` after [`base_time`].
pub fn trade(client: &str, instrument: &str, direction: Direction, minutes: f64) -> Trade {
    Trade {
        id: format!("{client}-{instrument}-{minutes}"),
        client_id: client.to_string(),
        timestamp: base_time() + Duration::milliseconds((minutes * 60_000.0) as i64),
        instrument: instrument.to_string(),
        direction,
        volume: 1.0,
        price: 1.1,
        profit_loss: 0.0,
    }
}

pub fn partner(id: &str) -> Partner {
    Partner {
        id: id.to_string(),
        name: format!("Partner {id}"),
        kind: PartnerType::Master,
        parent_id: None,
        is_suspicious: false,
        total_referrals: 0,
        fraud_flags: vec![],
    }
}

/// Active client with a healthy deposit and no trades.
pub fn client(id: &str, partner: &str) -> Client {
    Client {
        id: id.to_string(),
        name: format!("Client {id}"),
        referred_by: partner.to_string(),
        initial_deposit: Amount::from_units(1000),
        current_balance: Amount::from_units(1000),
        is_active: true,
        trades: vec![],
        fraud_flags: vec![],
    }
}

pub fn client_with_trades(id: &str, partner: &str, trades: Vec<Trade>) -> Client {
    Client {
        trades,
        ..client(id, partner)
    }
}

pub fn ring(id: &str, partners: &[&str], value: i64, confidence: f64) -> FraudRing {
    FraudRing {
        id: id.to_string(),
        kind: "opposite_trading".to_string(),
        partners_involved: partners.iter().map(|p| p.to_string()).collect(),
        clients_involved: vec![],
        estimated_fraud_value: Amount::from_units(value),
        detection_confidence: confidence,
        first_detected: base_time(),
    }
}
