pub mod amount;
pub mod bonus;
pub mod csv;
pub mod dataset;
pub mod engine;
pub mod mirror;
pub mod model;
pub mod opposite;
pub mod referral;
pub mod risk;
pub mod summary;
pub mod timing;

#[cfg(test)]
mod fixtures;

pub use amount::Amount;
pub use dataset::{Dataset, DatasetProvider, JsonFileProvider, Snapshot};
pub use engine::{DetectionConfig, Engine, ScanReport, ScanRequest};
pub use model::{Client, ClientId, Direction, FraudRing, Partner, PartnerId, Trade};
pub use risk::RankingContext;
