use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use partner_fraud_engine::model::PartnerType;
use partner_fraud_engine::{
    Amount, Client, Dataset, DetectionConfig, Direction, Engine, FraudRing, Partner,
    RankingContext, ScanRequest, Trade,
};

const INSTRUMENTS: [&str; 5] = ["EUR/USD", "GBP/USD", "USD/JPY", "XAU/USD", "BTC/USD"];

/// Builds deterministic snapshots for benchmarking.
///
/// Pattern per partner:
/// - every client trades `trades_per_client` times, one trade every 37 minutes
/// - instrument and direction cycle with the client index
/// - every 7th client is an idle bonus account
/// - every 5th partner is flagged and appears in a ring
pub struct SnapshotGenerator {
    partners: usize,
    clients_per_partner: usize,
    trades_per_client: usize,
}

impl SnapshotGenerator {
    pub fn new(partners: usize, clients_per_partner: usize, trades_per_client: usize) -> Self {
        Self {
            partners,
            clients_per_partner,
            trades_per_client,
        }
    }

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn client(&self, partner: usize, idx: usize) -> Client {
        let id = format!("C{partner}_{idx}");
        let idle = idx % 7 == 0;
        let trades = if idle {
            Vec::new()
        } else {
            (0..self.trades_per_client)
                .map(|t| Trade {
                    id: format!("{id}_T{t}"),
                    client_id: id.clone(),
                    timestamp: Self::base() + Duration::minutes((t * 37 + idx) as i64),
                    instrument: INSTRUMENTS[(t + idx) % INSTRUMENTS.len()].to_string(),
                    direction: if (t + partner) % 2 == 0 {
                        Direction::Buy
                    } else {
                        Direction::Sell
                    },
                    volume: 1.0 + (t % 3) as f64,
                    price: 1.1,
                    profit_loss: ((t % 11) as f64 - 5.0) * 10.0,
                })
                .collect()
        };

        Client {
            name: format!("Client {id}"),
            id,
            referred_by: format!("P{partner}"),
            initial_deposit: Amount::from_units(if idle { 150 } else { 2_000 }),
            current_balance: Amount::from_units(if idle { 10 } else { 1_900 }),
            is_active: !idle,
            trades,
            fraud_flags: vec![],
        }
    }

    pub fn dataset(&self) -> Dataset {
        let partners: Vec<Partner> = (0..self.partners)
            .map(|p| Partner {
                id: format!("P{p}"),
                name: format!("Partner {p}"),
                kind: PartnerType::Master,
                parent_id: None,
                is_suspicious: p % 5 == 0,
                total_referrals: self.clients_per_partner as u32,
                fraud_flags: if p % 5 == 0 {
                    vec!["opposite_trading".to_string()]
                } else {
                    vec![]
                },
            })
            .collect();

        let clients: Vec<Client> = (0..self.partners)
            .flat_map(|p| (0..self.clients_per_partner).map(move |c| (p, c)))
            .map(|(p, c)| self.client(p, c))
            .collect();

        let rings: Vec<FraudRing> = (0..self.partners)
            .step_by(5)
            .map(|p| FraudRing {
                id: format!("R{p}"),
                kind: "opposite_trading".to_string(),
                partners_involved: vec![format!("P{p}")],
                clients_involved: vec![],
                estimated_fraud_value: Amount::from_units(5_000),
                detection_confidence: 0.8,
                first_detected: Self::base(),
            })
            .collect();

        Dataset::new(partners, clients, rings).unwrap()
    }
}

fn engine(partners: usize, clients: usize, trades: usize) -> Engine {
    let dataset = SnapshotGenerator::new(partners, clients, trades).dataset();
    Engine::new(Arc::new(dataset), DetectionConfig::default()).unwrap()
}

fn bench_opposite_trading(c: &mut Criterion) {
    let mut group = c.benchmark_group("opposite_trading");
    group.sample_size(10);

    for (partners, clients, trades) in [(5, 10, 20), (10, 10, 20), (10, 20, 50)] {
        let label = format!("{partners}p_{clients}c_{trades}t");
        let engine = engine(partners, clients, trades);
        group.bench_with_input(BenchmarkId::from_parameter(&label), &engine, |b, engine| {
            b.iter(|| black_box(engine.opposite_trading()));
        });
    }

    group.finish();
}

fn bench_bonus_abuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("bonus_abuse");

    for clients in [1_000usize, 10_000, 100_000] {
        let engine = engine(100, clients / 100, 5);
        group.bench_with_input(BenchmarkId::from_parameter(clients), &engine, |b, engine| {
            b.iter(|| black_box(engine.bonus_abuse()));
        });
    }

    group.finish();
}

fn bench_mirror_trading(c: &mut Criterion) {
    let mut group = c.benchmark_group("mirror_trading");
    group.sample_size(10);

    let engine = engine(10, 10, 30);
    group.bench_function("10p_10c_30t", |b| {
        b.iter(|| black_box(engine.mirror_trading()));
    });

    group.finish();
}

fn bench_risk_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_ranking");

    let engine = engine(1_000, 1, 1);
    group.bench_function("1000_partners", |b| {
        b.iter(|| black_box(engine.risk_ranking(RankingContext::Summary)));
    });

    group.finish();
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    group.sample_size(10);

    let engine = engine(10, 10, 20);
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("blocking", |b| {
        b.iter(|| black_box(engine.scan_blocking(ScanRequest::all())));
    });
    group.bench_function("concurrent", |b| {
        b.iter(|| black_box(runtime.block_on(engine.scan(ScanRequest::all())).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_opposite_trading,
    bench_bonus_abuse,
    bench_mirror_trading,
    bench_risk_ranking,
    bench_full_scan,
);

criterion_main!(benches);
