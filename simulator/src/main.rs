//! FxGuard Simulator
//!
//! Command-line load tester for the currency conversion engine.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxguard_common::SystemClock;
use fxguard_fx::{ConversionEngine, EngineConfig, StdRandomSource};
use fxguard_simulator::{
    get_system_health_metrics, HarnessConfig, LoadProbe, LoadTestHarness, LoadTestRequest, Scenario,
};

/// FxGuard Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Load test the FxGuard currency conversion engine")]
struct Args {
    /// Named scenario (smoke, steady, burst, soak); overrides the load flags
    #[arg(short, long)]
    scenario: Option<String>,

    /// Run duration in milliseconds (capped at 30000)
    #[arg(long, default_value = "5000")]
    duration_ms: u64,

    /// Maximum concurrent conversions per batch
    #[arg(short, long, default_value = "5")]
    concurrency: u32,

    /// Target batches per second
    #[arg(short, long, default_value = "10")]
    rate: u32,

    /// Amount converted by every call
    #[arg(long, default_value = "100")]
    amount: f64,

    /// Source currency
    #[arg(long, default_value = "USD")]
    from: String,

    /// Target currency
    #[arg(long, default_value = "EUR")]
    to: String,

    /// Fault injection probability (defaults to FXGUARD_FAULT_PROBABILITY or 0.001)
    #[arg(long)]
    fault_probability: Option<f64>,

    /// Per-call timeout in milliseconds (0 disables)
    #[arg(long, default_value = "5000")]
    call_timeout_ms: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Print a simulated health snapshot instead of running a load test
    #[arg(long)]
    health: bool,

    /// Emit results and logs as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json);

    let random = Arc::new(StdRandomSource::new(args.seed));

    if args.health {
        let metrics = get_system_health_metrics(random.as_ref(), &SystemClock);
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    let mut config = EngineConfig::from_env();
    if let Some(p) = args.fault_probability {
        config.faults.probability = p;
    }
    config.validate().context("Invalid engine configuration")?;

    let engine = ConversionEngine::builder()
        .config(config)
        .random(random)
        .build();

    let harness_config = HarnessConfig {
        probe: LoadProbe {
            amount: args.amount,
            from: args.from.clone(),
            to: args.to.clone(),
        },
        call_timeout: (args.call_timeout_ms > 0).then(|| Duration::from_millis(args.call_timeout_ms)),
        ..HarnessConfig::default()
    };
    let harness = LoadTestHarness::new(Arc::new(engine), harness_config);

    let request = match &args.scenario {
        Some(name) => {
            let scenario = Scenario::load(name)?;
            info!("Running scenario: {} - {}", scenario.name, scenario.description);
            scenario.request()
        }
        None => LoadTestRequest::new(args.duration_ms, args.concurrency, args.rate),
    };

    info!(
        "Load test: {}ms, concurrency {}, rate {}/s, {} {} -> {}",
        request.duration.as_millis(),
        request.concurrency,
        request.request_rate,
        args.amount,
        args.from,
        args.to
    );

    let result = harness.run(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        info!("Load test complete");
        info!("Total requests: {}", result.total_requests);
        info!("Successful: {}", result.successful_requests);
        info!("Failed: {}", result.failed_requests);
        info!("Error rate: {:.2}%", result.error_rate);
        info!("Average response time: {:.1}ms", result.average_response_time);
        info!("p99 response time: {:.1}ms", result.p99_response_time);
        info!("Throughput: {:.1} req/s", result.throughput);
        for (kind, count) in &result.errors_by_kind {
            info!("  {}: {}", kind, count);
        }
    }

    Ok(())
}
