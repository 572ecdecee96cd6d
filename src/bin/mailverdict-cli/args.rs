use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use mailverdict::{
    BatchOptions, CheckOrder, MxOptions, PipelineOptions, SmtpProbeOptions, ValidationMode,
};

#[derive(Parser)]
#[command(
    name = "mailverdict-cli",
    version,
    about = "Classify email addresses as Valid, Risky, Unknown or Invalid"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// addresses classified concurrently in batch mode
    #[arg(long, global = true, env = "MAILVERDICT_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// timeout per DNS query (ms)
    #[arg(long, global = true, env = "MAILVERDICT_DNS_TIMEOUT_MS", default_value_t = 4_000)]
    pub dns_timeout_ms: u64,

    /// timeout per SMTP connect/read/write (ms)
    #[arg(long, global = true, env = "MAILVERDICT_SMTP_TIMEOUT_MS", default_value_t = 5_000)]
    pub smtp_timeout_ms: u64,

    /// maximum number of MX hosts probed per address
    #[arg(long, global = true, default_value_t = 3)]
    pub max_mx: usize,

    /// name sent with EHLO/HELO
    #[arg(long, global = true, env = "MAILVERDICT_HELO", default_value = "localhost")]
    pub helo: String,

    /// envelope sender for MAIL FROM (default postmaster@<domain>, "" for <>)
    #[arg(long = "from", global = true, env = "MAILVERDICT_FROM")]
    pub mail_from: Option<String>,

    /// treat servers without STARTTLS as inconclusive
    #[arg(long, global = true)]
    pub require_starttls: bool,

    /// random aliases sent after an accepted recipient to spot catch-all domains
    #[arg(long, global = true, default_value_t = 0)]
    pub catchall_probes: u8,

    /// SMTP port
    #[arg(long, global = true, env = "MAILVERDICT_SMTP_PORT", default_value_t = 25)]
    pub port: u16,

    /// also connect to IPv6 exchanger addresses
    #[arg(long, global = true)]
    pub ipv6: bool,

    #[arg(long, global = true, value_enum, default_value_t = ModeArg::Strict)]
    pub mode: ModeArg,

    #[arg(long, global = true, value_enum, default_value_t = OrderArg::DisposableFirst)]
    pub order: OrderArg,

    /// extra disposable domains, one per line
    #[arg(long, global = true, env = "MAILVERDICT_DISPOSABLE_LIST")]
    pub disposable_list: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = Format::Human)]
    pub format: Format,

    /// write the report to a file instead of stdout (replaced atomically)
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// -v info, -vv debug, -vvv trace (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a single address
    Check {
        email: String,
        /// domain suggestions shown when the domain has no MX
        #[arg(long, default_value_t = 3)]
        suggestions: usize,
    },
    /// Classify addresses read one per line from a file or stdin
    Batch {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Strict,
    Relaxed,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    DisposableFirst,
    ProbeFirst,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Csv,
    Tsv,
    Json,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn mx_options(&self) -> MxOptions {
        MxOptions {
            timeout: Duration::from_millis(self.dns_timeout_ms),
            ..MxOptions::default()
        }
    }

    pub fn smtp_options(&self) -> SmtpProbeOptions {
        SmtpProbeOptions {
            helo_domain: self.helo.clone(),
            mail_from: self.mail_from.clone(),
            starttls_required: self.require_starttls,
            timeout: Duration::from_millis(self.smtp_timeout_ms),
            max_mx: self.max_mx,
            port: self.port,
            catchall_probes: self.catchall_probes,
            ipv6: self.ipv6,
            ..SmtpProbeOptions::default()
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            mode: match self.mode {
                ModeArg::Strict => ValidationMode::Strict,
                ModeArg::Relaxed => ValidationMode::Relaxed,
            },
            order: match self.order {
                OrderArg::DisposableFirst => CheckOrder::DisposableFirst,
                OrderArg::ProbeFirst => CheckOrder::ProbeFirst,
            },
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn flags_after_subcommand_are_accepted() {
        let cli = Cli::try_parse_from([
            "mailverdict-cli",
            "batch",
            "--workers",
            "8",
            "--order",
            "probe-first",
            "--from",
            "",
        ])
        .expect("parse");
        assert_eq!(cli.batch_options().workers, 8);
        assert_eq!(cli.pipeline_options().order, CheckOrder::ProbeFirst);
        assert_eq!(cli.smtp_options().envelope_sender("example.com"), "");
    }

    #[test]
    fn defaults_match_library() {
        let cli =
            Cli::try_parse_from(["mailverdict-cli", "check", "a@example.com"]).expect("parse");
        assert_eq!(cli.smtp_options().timeout, Duration::from_secs(5));
        assert_eq!(cli.mx_options().timeout, Duration::from_secs(4));
        assert_eq!(cli.pipeline_options(), PipelineOptions::default());
    }
}
