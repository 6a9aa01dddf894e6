//! Landed CLI
//!
//! Prices a shipment line or a pooled manifest against a JSON rate fixture
//! and prints the result as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use landed_fx::{FxEngine, TtlFxCache};
use landed_idempotency::{IdempotencyStore, MemorySink};
use landed_quote::{MemorySnapshotSink, PoolAllocator, PoolRequest, QuoteOrchestrator, QuoteRequest};
use landed_rates::TemporalResolver;

mod config;
mod fixture;

use config::LandedConfig;
use fixture::Fixture;

/// Landed-cost quoting CLI
#[derive(Parser, Debug)]
#[command(name = "landed")]
#[command(about = "Landed-cost quotes against a JSON rate fixture")]
struct Args {
    /// Rate fixture (duty, VAT, surcharges, de-minimis, freight cards, FX)
    #[arg(short, long)]
    fixture: PathBuf,

    /// Idempotency key; repeated runs with the same key replay the first result
    #[arg(short = 'k', long)]
    idempotency_key: Option<String>,

    /// Number of times to submit the request
    #[arg(long, default_value = "1")]
    repeat: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Quote a single shipment line
    Quote {
        /// Quote request JSON
        request: PathBuf,
    },
    /// Quote a manifest with pooled freight
    Pool {
        /// Pool request JSON
        request: PathBuf,

        /// Skip persisting a snapshot
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = LandedConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let loaded = Fixture::load(&args.fixture)?.into_loaded()?;
    let resolver = TemporalResolver::new(Arc::new(loaded.store));
    let fx = Arc::new(FxEngine::new(
        Arc::new(loaded.fx),
        Arc::new(TtlFxCache::with_config(config.fx.cache_config())),
        config.fx.clone(),
    ));
    let orchestrator = Arc::new(QuoteOrchestrator::new(
        resolver,
        fx,
        Arc::new(loaded.classifier),
        config.quote.clone(),
    ));
    let idempotency = IdempotencyStore::new(Arc::new(MemorySink::new()), config.idempotency.clone());

    info!(fixture = %args.fixture.display(), "Landed engine ready");

    for attempt in 1..=args.repeat.max(1) {
        let output = match &args.command {
            Command::Quote { request } => {
                let request: QuoteRequest = read_json(request)?;
                let run = || async { Ok::<_, anyhow::Error>(orchestrator.quote(&request).await?) };
                let quote = match &args.idempotency_key {
                    Some(key) => idempotency.with_idempotency("quotes", key, &request, run).await?,
                    None => run().await?,
                };
                serde_json::to_string_pretty(&quote)?
            }
            Command::Pool { request, dry_run } => {
                let mut request: PoolRequest = read_json(request)?;
                request.dry_run |= *dry_run;
                let pool = PoolAllocator::new(orchestrator.clone(), Arc::new(MemorySnapshotSink::new()));
                let run = || async { Ok::<_, anyhow::Error>(pool.compute_pool(&request).await?) };
                let result = match &args.idempotency_key {
                    Some(key) => idempotency.with_idempotency("pools", key, &request, run).await?,
                    None => run().await?,
                };
                serde_json::to_string_pretty(&result)?
            }
        };

        info!(attempt, "Request complete");
        println!("{}", output);
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading request {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing request {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use landed_common::ConfidenceLevel;
    use landed_quote::QuoteConfig;
    use rust_decimal_macros::dec;

    fn orchestrator() -> QuoteOrchestrator {
        let loaded = Fixture::from_json(include_str!("../../demos/fixture.json"))
            .unwrap()
            .into_loaded()
            .unwrap();
        QuoteOrchestrator::new(
            TemporalResolver::new(Arc::new(loaded.store)),
            Arc::new(FxEngine::new(
                Arc::new(loaded.fx),
                Arc::new(TtlFxCache::new()),
                Default::default(),
            )),
            Arc::new(loaded.classifier),
            QuoteConfig::default(),
        )
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "landed",
            "--fixture",
            "demos/fixture.json",
            "-k",
            "order-1",
            "pool",
            "demos/pool.json",
            "--dry-run",
        ]);
        assert_eq!(args.idempotency_key.as_deref(), Some("order-1"));
        assert!(matches!(args.command, Command::Pool { dry_run: true, .. }));
    }

    #[tokio::test]
    async fn test_demo_quote() {
        let request: QuoteRequest = serde_json::from_str(include_str!("../../demos/quote.json")).unwrap();
        let quote = orchestrator().quote(&request).await.unwrap();

        assert_eq!(quote.total.amount, dec!(1394.07));
        assert_eq!(quote.confidence, ConfidenceLevel::Authoritative);
    }

    #[tokio::test]
    async fn test_demo_pool_replays_under_one_key() {
        let request: PoolRequest = serde_json::from_str(include_str!("../../demos/pool.json")).unwrap();
        let pool = PoolAllocator::new(Arc::new(orchestrator()), Arc::new(MemorySnapshotSink::new()));
        let store = IdempotencyStore::new(Arc::new(MemorySink::new()), Default::default());

        let first: landed_quote::PoolResult = store
            .with_idempotency("pools", "order-1", &request, || async {
                Ok::<_, anyhow::Error>(pool.compute_pool(&request).await?)
            })
            .await
            .unwrap();
        let second: landed_quote::PoolResult = store
            .with_idempotency("pools", "order-1", &request, || async {
                anyhow::bail!("replayed requests must not recompute")
            })
            .await
            .unwrap();

        assert_eq!(first.summary.total.amount, dec!(526.24));
        assert_eq!(first, second);
        assert!(first.snapshot_id.is_some());
    }
}
