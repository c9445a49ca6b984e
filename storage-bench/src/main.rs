use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use storage_bench::config::load_target;
use storage_bench::operation::{generate_payload, GetObject, ObjectOperation, PutObject};
use storage_bench::report::Console;
use storage_bench::{BenchConfig, CostUnit, Harness};
use storage_bench_client::{Client, ClientConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Op {
    /// Upload a new object per operation.
    Put,
    /// Download the same object on every operation.
    Get,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Unit {
    Ms,
    S,
}

#[derive(Parser, Debug)]
#[command(name = "storage-bench", about = "Object storage load generator")]
struct Args {
    /// Path to a JSON file with the endpoint `base_url` and `bucket`.
    #[arg(long)]
    target: PathBuf,

    /// Number of concurrent worker loops
    #[arg(long, default_value_t = 2)]
    concurrency: usize,

    /// How long to run (seconds)
    #[arg(long, default_value_t = 600)]
    duration: u64,

    /// Live report interval (milliseconds)
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    #[arg(long, value_enum, default_value = "put")]
    op: Op,

    /// Payload size for uploads (bytes)
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    object_size: usize,

    /// Object to download for `get`, name prefix for `put`
    #[arg(long, default_value = "o-bench")]
    object_name: String,

    #[arg(long, value_enum, default_value = "ms")]
    cost_unit: Unit,

    /// Exit with code 1 if the failure fraction exceeds this value
    #[arg(long)]
    max_error_rate: Option<f64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let target = load_target(&args.target).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(3);
    });

    let mut config = BenchConfig::new(args.concurrency, Duration::from_secs(args.duration));
    config.tick = Duration::from_millis(args.tick_ms);
    config.cost_unit = match args.cost_unit {
        Unit::Ms => CostUnit::Millis,
        Unit::S => CostUnit::Seconds,
    };

    let harness = Harness::new(config, Arc::new(Console)).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(3);
    });

    let client = Arc::new(Client::new(ClientConfig { target }));
    match client.ensure_bucket().await {
        Ok(true) => info!(bucket = %client.config.target.bucket, "bucket created"),
        Ok(false) => {}
        Err(e) => {
            eprintln!("Failed to prepare bucket {}: {e}", client.config.target.bucket);
            process::exit(3);
        }
    }

    info!(
        concurrency = args.concurrency,
        duration_secs = args.duration,
        op = ?args.op,
        object = %args.object_name,
        "configured"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, draining");
            on_interrupt.cancel();
        }
    });

    let op = args.op;
    let object_size = args.object_size;
    let object_name = args.object_name.clone();
    let make_op = |_slot: usize| match op {
        Op::Put => {
            let payload = generate_payload(&mut rand::thread_rng(), object_size);
            ObjectOperation::Put(PutObject::new(Arc::clone(&client), object_name.clone(), payload))
        }
        Op::Get => ObjectOperation::Get(GetObject::new(Arc::clone(&client), object_name.clone())),
    };

    let summary = match harness.run(cancel, make_op).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "run aborted");
            process::exit(3);
        }
    };

    let exit_code = match args.max_error_rate {
        Some(max) if summary.snapshot.total() > 0 && summary.error_rate() > max => {
            eprintln!(
                "Error rate {:.3}% exceeds threshold {:.3}%",
                summary.error_rate() * 100.0,
                max * 100.0
            );
            1
        }
        _ => 0,
    };
    process::exit(exit_code);
}
