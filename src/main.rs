use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use partner_fraud_engine::csv::{
    write_bonus, write_involvement, write_mirror, write_opposite, write_referrals, write_rings,
    write_risk,
};
use partner_fraud_engine::risk::PartnerRiskScore;
use partner_fraud_engine::{
    DetectionConfig, Engine, JsonFileProvider, RankingContext, ScanReport, ScanRequest,
};

#[derive(Parser)]
#[command(name = "partner-fraud-engine", about = "Scan a partner snapshot for fraud patterns")]
struct Cli {
    /// Snapshot file (JSON with partners, clients and fraud_rings)
    dataset: PathBuf,

    /// Optional JSON file overriding detection thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    query: Query,
}

#[derive(Subcommand)]
enum Query {
    /// Cross-partner opposite trading pairs
    Opposite {
        /// Report per-partner involvement instead of individual pairs
        #[arg(long)]
        by_partner: bool,
    },
    /// Clients harvesting referral bonuses
    Bonus,
    /// Same-partner clients trading in lockstep
    Mirror,
    /// Precomputed fraud rings
    Rings,
    /// Partners with poor referral quality
    Referrals,
    /// Partners ranked by risk
    Risk {
        /// Short list for compact displays
        #[arg(long)]
        compact: bool,
    },
    /// Run every scan and print the combined report as JSON
    Summary,
}

#[derive(Serialize)]
struct SummaryOutput {
    #[serde(flatten)]
    report: ScanReport,
    top_partners: Vec<PartnerRiskScore>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            "warn".parse().expect("static directive is valid"),
        ))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.dataset.extension().is_none_or(|ext| ext != "json") {
        warn!(path = %cli.dataset.display(), "dataset file seems to not be a json file");
    }

    let config = match &cli.config {
        Some(path) => DetectionConfig::from_file(path)?,
        None => DetectionConfig::default(),
    };
    let engine = Engine::from_provider(&JsonFileProvider::new(&cli.dataset), config)?;

    // stdout is locked only once the results are ready
    match cli.query {
        Query::Opposite { by_partner: false } => {
            let findings = engine.opposite_trading();
            write_opposite(io::stdout().lock(), &findings)?
        }
        Query::Opposite { by_partner: true } => {
            let involvement = engine.opposite_involvement();
            write_involvement(io::stdout().lock(), &involvement)?
        }
        Query::Bonus => {
            let findings = engine.bonus_abuse();
            write_bonus(io::stdout().lock(), &findings)?
        }
        Query::Mirror => {
            let groups = engine.mirror_trading();
            write_mirror(io::stdout().lock(), &groups)?
        }
        Query::Rings => write_rings(io::stdout().lock(), engine.fraud_rings())?,
        Query::Referrals => {
            let quality = engine.referral_quality();
            write_referrals(io::stdout().lock(), &quality)?
        }
        Query::Risk { compact } => {
            let context = if compact {
                RankingContext::Compact
            } else {
                RankingContext::Summary
            };
            let ranked = engine.risk_ranking(context);
            write_risk(io::stdout().lock(), &ranked)?
        }
        Query::Summary => {
            let output = SummaryOutput {
                report: engine.scan(ScanRequest::all()).await?,
                top_partners: engine.risk_ranking(RankingContext::Summary),
            };
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
