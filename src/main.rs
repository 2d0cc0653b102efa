//! cbcrand command-line tool.
//!
//! Streams pseudo-random bytes to standard output until the requested
//! count is reached, the reader closes the pipe, or Ctrl-C is pressed.

use cbcrand::seed::FileSeedSource;
use cbcrand::{ByteCount, FileConfig, Generator, GeneratorMetrics};
use clap::{CommandFactory, Parser};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Bytes moved per read/write round trip.
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Parser)]
#[command(name = "cbcrand", version, about = "High-throughput pseudo-random byte generator")]
struct Cli {
    /// Number of random bytes to generate (SI/IEC prefixes allowed, +Inf for no limit).
    #[arg(short = 'n', long, default_value = "+Inf", allow_hyphen_values = true)]
    count: String,

    /// Force output to terminal.
    #[arg(short, long)]
    force: bool,

    /// Maximum number of concurrent workers [default: available parallelism].
    #[arg(short, long, allow_negative_numbers = true)]
    procs: Option<i64>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read key and IV material from this file instead of the OS RNG.
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Check a sample of the output before writing anything.
    #[arg(long)]
    self_test: bool,

    /// Serve Prometheus metrics on this port (requires the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Logs go to stderr; stdout carries the random stream
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::from_file(path)
            .unwrap_or_else(|e| usage_error(&format!("Failed to load configuration: {e}"))),
        None => FileConfig::default(),
    };

    if !(cli.force || file.output.force) && io::stdout().is_terminal() {
        usage_error("Random data not written to terminal.");
    }

    let count: ByteCount = cli
        .count
        .parse()
        .unwrap_or_else(|e| usage_error(&format!("Number of bytes to generate is invalid: {e}")));

    let workers = match cli.procs {
        Some(p) if p < 1 => usage_error("Number of workers must be positive."),
        Some(p) => usize::try_from(p).unwrap_or(usize::MAX),
        None if cli.config.is_some() => file.generator.workers,
        None => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    };

    let built = match cli.seed_file.as_ref().or(file.seed.path.as_ref()) {
        Some(path) => match FileSeedSource::open(path) {
            Ok(source) => Generator::with_seed_source(file.generator.clone(), Arc::new(source)),
            Err(e) => fatal(&format!("Failed to open seed file {}: {e}", path.display())),
        },
        None => Generator::with_config(file.generator.clone()),
    };
    let generator = match built {
        Ok(generator) => generator,
        Err(e) => fatal(&format!("Failed to start generator: {e}")),
    };
    match generator.set_workers(workers) {
        Ok(previous) => info!(previous, workers, "Producer pool sized"),
        Err(e) => fatal(&format!("Failed to size producer pool: {e}")),
    }

    let metrics_port = cli.metrics_port.unwrap_or(file.output.metrics_port);
    if metrics_port != 0 {
        spawn_metrics_server(metrics_port, generator.metrics_handle());
    }

    if cli.self_test || file.output.self_test {
        if let Err(e) = generator.self_test(file.output.self_test_bytes, &file.health) {
            fatal(&format!("Self-test failed: {e}"));
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
            warn!(error = %e, "Failed to install Ctrl-C handler");
        }
    }

    info!(count = %count, workers, "Writing random data");

    let mut stdout = io::stdout().lock();
    match pump(&generator, &mut stdout, count.limit(), &stop) {
        Ok(written) => info!(bytes = written, "Done"),
        // Expected when the sink closes the pipe
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => info!("Output closed by reader"),
        Err(e) => fatal(&format!("Generation failed: {e}")),
    }

    let snapshot = generator.metrics().snapshot();
    info!(
        bytes_read = snapshot.bytes_read,
        blocks = snapshot.blocks_delivered,
        "Generator statistics"
    );
}

/// Copies generator output to `out` until `limit` bytes or `stop` is set.
fn pump(
    generator: &Generator,
    out: &mut impl Write,
    limit: Option<u64>,
    stop: &AtomicBool,
) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    while !stop.load(Ordering::Relaxed) {
        let want = match limit {
            Some(limit) if written >= limit => break,
            Some(limit) => (limit - written).min(CHUNK_SIZE as u64) as usize,
            None => CHUNK_SIZE,
        };

        let n = generator.read(&mut buf[..want])?;
        out.write_all(&buf[..n])?;
        written += n as u64;
    }

    out.flush()?;
    Ok(written)
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, metrics: Arc<GeneratorMetrics>) {
    use cbcrand::metrics::{MetricsServer, MetricsServerConfig};

    let spawned = std::thread::Builder::new()
        .name("cbcrand-metrics".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "Failed to start metrics runtime");
                    return;
                }
            };

            let server = MetricsServer::new(MetricsServerConfig::with_port(port), metrics);
            if let Err(e) = runtime.block_on(server.run()) {
                warn!(error = %e, "Metrics server stopped");
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Failed to spawn metrics thread");
    }
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(port: u16, _metrics: Arc<GeneratorMetrics>) {
    warn!(port, "Metrics server requested but the `metrics` feature is disabled");
}

/// Prints `msg` and the usage text, then exits with status 1.
fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}\n");
    eprintln!("{}", Cli::command().render_help());
    process::exit(1);
}

/// Logs and prints `msg`, then exits with status 1.
fn fatal(msg: &str) -> ! {
    error!("{msg}");
    eprintln!("cbcrand: {msg}");
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["cbcrand", "-n", "16Mi", "-f", "-p", "4"]).unwrap();
        assert_eq!(cli.count, "16Mi");
        assert!(cli.force);
        assert_eq!(cli.procs, Some(4));
    }

    #[test]
    fn test_cli_accepts_negative_values() {
        let cli = Cli::try_parse_from(["cbcrand", "-n", "-1", "-p", "-2"]).unwrap();
        assert_eq!(cli.count, "-1");
        assert_eq!(cli.procs, Some(-2));
    }

    #[test]
    fn test_pump_honors_limit() {
        let generator = Generator::new().unwrap();
        let stop = AtomicBool::new(false);
        let mut out = Vec::new();

        let written = pump(&generator, &mut out, Some(100_000), &stop).unwrap();
        assert_eq!(written, 100_000);
        assert_eq!(out.len(), 100_000);
    }

    #[test]
    fn test_pump_stops_on_flag() {
        let generator = Generator::new().unwrap();
        let stop = AtomicBool::new(true);
        let mut out = Vec::new();

        assert_eq!(pump(&generator, &mut out, None, &stop).unwrap(), 0);
    }
}
