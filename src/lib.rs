#![forbid(unsafe_code)]
//! mailverdict: email verification in stages (syntax, disposable domain, MX,
//! SMTP recipient probe) folded into one label per address, with a bounded
//! batch executor on top.

pub mod address;
pub mod batch;
pub mod disposable;
pub mod mx;
pub mod pipeline;
pub mod report;
pub mod smtp_verify;
pub mod suggest;
pub mod validator;

pub use address::EmailAddress;
pub use batch::{BatchError, BatchExecutor, BatchOptions, CancelFlag};
pub use disposable::{DisposableDomains, DisposableError, is_disposable};
pub use mx::{DnsResolver, Error as MxError, MxLookup, MxOptions, MxRecord, MxResolver, MxStatus, check_mx};
pub use pipeline::{CheckOrder, Label, Pipeline, PipelineOptions, Stage, Verdict, VerificationResult};
pub use report::write_delimited;
pub use smtp_verify::{
    MailboxProbe, ProbeError, ProbeOutcome, SmtpProbeOptions, SmtpProbeReport, SmtpProber,
};
pub use suggest::{Suggestion, suggest_domains};
pub use validator::{ValidationMode, ValidationReport, is_valid_syntax, validate_email};
