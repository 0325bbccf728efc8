use clap::{Arg, ArgAction, Command};
use proclog_core::{
    discover, CancelFlag, DiscoveryPaths, MetricsCollector, RowSink, RunConfig, Sampler,
};
use proclog_sink::{ConsoleSink, CsvSink};
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use std::time::Duration;

static CANCEL: OnceLock<CancelFlag> = OnceLock::new();

/// The handler only sets the flag; the loop observes it at the next tick
/// boundary and finishes the in-progress row first.
#[cfg(unix)]
extern "C" fn on_sigint(_signum: i32) {
    if let Some(cancel) = CANCEL.get() {
        cancel.cancel();
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().try_get_matches().unwrap_or_else(|e| {
        let _ = e.print();
        process::exit(if e.use_stderr() { 1 } else { 0 });
    });

    let config = RunConfig {
        interval: Duration::from_secs(matches.get_one::<u64>("interval").copied().unwrap_or(1)),
        duration_secs: matches.get_one::<u64>("duration").copied(),
        sample_count: matches.get_one::<u64>("samples").copied(),
        csv_path: matches.get_one::<PathBuf>("out").cloned(),
        sensor_list: matches.get_one::<PathBuf>("sensors").cloned(),
        quiet: matches.get_flag("quiet"),
    };
    config.validate()?;

    let cancel = CANCEL.get_or_init(CancelFlag::new).clone();
    #[cfg(unix)]
    install_sigint()?;

    let paths = DiscoveryPaths::default();
    let inventory = discover(&paths, &config)?;
    let collector = MetricsCollector::new(inventory, paths.proc_stat.clone());

    let mut sinks: Vec<Box<dyn RowSink>> = Vec::new();
    match &config.csv_path {
        Some(path) => sinks.push(Box::new(CsvSink::create(path)?)),
        None => tracing::info!("no --out given, csv output disabled"),
    }
    if !config.quiet {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }

    let mut sampler = Sampler::new(collector, config);
    tracing::info!(
        columns = sampler.columns().len(),
        "monitoring started, press Ctrl+C to stop"
    );
    let stats = sampler.run(&mut sinks, &cancel)?;
    tracing::info!(
        rows = stats.rows_emitted,
        skipped = stats.ticks_skipped,
        "monitoring stopped"
    );
    Ok(())
}

#[cfg(unix)]
fn install_sigint() -> anyhow::Result<()> {
    use nix::sys::signal::{self, SigHandler, Signal};
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(on_sigint))?;
    }
    Ok(())
}

fn cli() -> Command {
    Command::new("proclog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Logs per-core CPU utilization, GPU, thermal, and custom sysfs metrics to CSV")
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("PATH")
                .help("CSV output file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("duration")
                .short('d')
                .long("duration")
                .short_alias('t')
                .visible_alias("time")
                .value_name("SECONDS")
                .help("Run length in seconds (default: run until interrupted)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECONDS")
                .help("Sampling interval in seconds")
                .default_value("1")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("samples")
                .short('n')
                .long("samples")
                .value_name("COUNT")
                .help("Stop after this many emitted rows")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("sensors")
                .short('s')
                .long("sensors")
                .value_name("PATH")
                .help("File listing extra sysfs paths to sample, one per line")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress the console view")
                .action(ArgAction::SetTrue),
        )
}
