mod args;
mod output;

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mailverdict::{BatchExecutor, DisposableDomains, DnsResolver, MxResolver, Pipeline, SmtpProber};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

/// `Ok(true)` when every address came back `Valid`.
fn run(cli: &Cli) -> Result<bool> {
    let pipeline = build_pipeline(cli)?;

    match &cli.cmd {
        Commands::Check { email, suggestions } => {
            let (verdict, suggested) = pipeline.evaluate_with_suggestions(email, *suggestions);
            output::write_check(email, &verdict, &suggested, cli)?;
            Ok(verdict.label.is_valid())
        }
        Commands::Batch { input } => {
            let addresses = read_addresses(input.as_deref())?;
            let executor = BatchExecutor::new(pipeline, &cli.batch_options())
                .context("start worker pool")?;

            let progress = progress_bar(addresses.len() as u64);
            let results = executor.run_observed(&addresses, |_, _| progress.inc(1));
            progress.finish_and_clear();

            output::write_results(&results, cli)?;
            Ok(output::all_valid(&results))
        }
    }
}

fn build_pipeline(cli: &Cli) -> Result<Pipeline> {
    let disposable = match &cli.disposable_list {
        Some(path) => DisposableDomains::with_extra_file(path)?,
        None => DisposableDomains::builtin(),
    };

    let mx_options = cli.mx_options();
    let dns = Arc::new(
        DnsResolver::from_system_conf(&mx_options).context("initialize DNS resolver")?,
    );
    let mx = MxResolver::with_backend(Arc::clone(&dns), &mx_options);
    let prober = SmtpProber::new(dns, cli.smtp_options()).context("initialize SMTP prober")?;

    Ok(Pipeline::new(
        Arc::new(disposable),
        mx,
        prober,
        cli.pipeline_options(),
    ))
}

/// One address per line, trimmed; blank lines are skipped.
fn read_addresses(input: Option<&Path>) -> Result<Vec<String>> {
    let lines: Vec<String> = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .context("read stdin")?,
    };
    Ok(lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.enable_steady_tick(Duration::from_millis(100));
    match ProgressStyle::with_template("{elapsed_precise} {bar:36.cyan/blue} {pos:>5}/{len:5} {msg}") {
        Ok(style) => bar.set_style(style.progress_chars("■■□")),
        Err(err) => tracing::debug!(error = %err, "progress template rejected"),
    }
    bar
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,mailverdict={level},mailverdict_cli={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
