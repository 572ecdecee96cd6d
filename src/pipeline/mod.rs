//! Per-address verification: syntax, disposable domain, MX, SMTP probe.

mod types;

pub use types::{CheckOrder, Label, PipelineOptions, Stage, Verdict, VerificationResult};

use std::sync::Arc;

use crate::address::EmailAddress;
use crate::disposable::DisposableDomains;
use crate::mx::{MxLookup, MxRecord, MxResolver};
use crate::smtp_verify::{MailboxProbe, ProbeOutcome, SmtpProber};
use crate::suggest::{Suggestion, suggest_common};
use crate::validator::validate_email;

pub struct Pipeline<M = MxResolver, P = SmtpProber> {
    disposable: Arc<DisposableDomains>,
    mx: M,
    prober: P,
    options: PipelineOptions,
}

impl<M: MxLookup, P: MailboxProbe> Pipeline<M, P> {
    pub fn new(
        disposable: Arc<DisposableDomains>,
        mx: M,
        prober: P,
        options: PipelineOptions,
    ) -> Self {
        Self {
            disposable,
            mx,
            prober,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn mx(&self) -> &M {
        &self.mx
    }

    pub fn classify(&self, address: &str) -> Label {
        self.evaluate(address).label
    }

    pub fn verify(&self, address: &str) -> VerificationResult {
        VerificationResult::new(address, self.classify(address))
    }

    /// Runs the checks in the configured order, stopping at the first one
    /// that settles the label.
    pub fn evaluate(&self, address: &str) -> Verdict {
        let verdict = self.run_checks(&EmailAddress::new(address));
        tracing::debug!(
            address,
            label = %verdict.label,
            stage = %verdict.decided_by,
            "classified"
        );
        verdict
    }

    /// [`evaluate`](Self::evaluate), plus typo suggestions for the domain when
    /// the verdict came from the MX stage. Any other verdict gets none.
    pub fn evaluate_with_suggestions(&self, address: &str, max: usize) -> (Verdict, Vec<Suggestion>) {
        let verdict = self.evaluate(address);
        let suggestions = if verdict.decided_by == Stage::Mx {
            suggest_common(EmailAddress::new(address).domain(), max)
        } else {
            Vec::new()
        };
        (verdict, suggestions)
    }

    fn run_checks(&self, address: &EmailAddress) -> Verdict {
        let report = validate_email(address.as_str(), self.options.mode);
        if !report.ok {
            tracing::trace!(address = %address, reasons = ?report.reasons, "syntax rejected");
            return Verdict::new(Label::Invalid, Stage::Syntax);
        }
        let domain = address.domain();

        match self.options.order {
            CheckOrder::DisposableFirst => {
                if self.disposable.is_disposable(domain) {
                    return Verdict::new(Label::Risky, Stage::Disposable);
                }
                let Some(exchanges) = self.resolve(domain) else {
                    return Verdict::new(Label::Invalid, Stage::Mx);
                };
                let label = match self.probe(address, &exchanges) {
                    Some(ProbeOutcome::Accepted) => Label::Valid,
                    Some(ProbeOutcome::Rejected) => Label::Invalid,
                    Some(ProbeOutcome::Inconclusive) | None => Label::Unknown,
                };
                Verdict::new(label, Stage::Smtp)
            }
            CheckOrder::ProbeFirst => {
                let Some(exchanges) = self.resolve(domain) else {
                    return Verdict::new(Label::Invalid, Stage::Mx);
                };
                let outcome = self.probe(address, &exchanges);
                if outcome == Some(ProbeOutcome::Rejected) {
                    return Verdict::new(Label::Invalid, Stage::Smtp);
                }
                if self.disposable.is_disposable(domain) {
                    return Verdict::new(Label::Risky, Stage::Disposable);
                }
                let label = match outcome {
                    Some(ProbeOutcome::Accepted) => Label::Valid,
                    _ => Label::Unknown,
                };
                Verdict::new(label, Stage::Smtp)
            }
        }
    }

    fn resolve(&self, domain: &str) -> Option<Vec<MxRecord>> {
        match self.mx.exchanges(domain) {
            Ok(records) if !records.is_empty() => Some(records),
            Ok(_) => {
                tracing::debug!(domain, "no MX records");
                None
            }
            Err(err) => {
                tracing::debug!(domain, error = %err, "MX resolution failed");
                None
            }
        }
    }

    fn probe(&self, address: &EmailAddress, exchanges: &[MxRecord]) -> Option<ProbeOutcome> {
        match self.prober.probe(address, exchanges) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::warn!(address = %address, error = %err, "SMTP probe failed");
                None
            }
        }
    }
}
