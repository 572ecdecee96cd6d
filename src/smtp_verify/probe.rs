use std::sync::Arc;

use native_tls::TlsConnector;

use crate::address::EmailAddress;
use crate::mx::{DnsBackend, DnsResolver, MxRecord};

use super::dns::exchanger_addrs;
use super::error::ProbeError;
use super::options::SmtpProbeOptions;
use super::session::{SmtpReply, SmtpSession};
use super::types::{ProbeOutcome, SmtpProbeReport};
use super::util::random_local_part;

/// Seam the verification pipeline asks "would this mailbox be accepted?"
/// through. An `Err` means the question could not be asked at all.
pub trait MailboxProbe: Send + Sync {
    fn probe(
        &self,
        address: &EmailAddress,
        exchanges: &[MxRecord],
    ) -> Result<ProbeOutcome, ProbeError>;
}

/// Recipient verification over SMTP: `EHLO`, optional `STARTTLS`,
/// `MAIL FROM`, `RCPT TO`, then `RSET` and `QUIT`. `DATA` is never sent.
pub struct SmtpProber<D = Arc<DnsResolver>> {
    dns: D,
    options: SmtpProbeOptions,
    tls: Option<TlsConnector>,
}

impl<D: DnsBackend> SmtpProber<D> {
    pub fn new(dns: D, options: SmtpProbeOptions) -> Result<Self, ProbeError> {
        let tls = if options.use_starttls || options.starttls_required {
            let connector = TlsConnector::builder()
                .danger_accept_invalid_certs(!options.verify_tls)
                .danger_accept_invalid_hostnames(!options.verify_tls)
                .build()
                .map_err(|source| ProbeError::TlsSetup { source })?;
            Some(connector)
        } else {
            None
        };
        Ok(Self { dns, options, tls })
    }

    pub fn options(&self) -> &SmtpProbeOptions {
        &self.options
    }

    /// Probes `exchanges` in order (at most `max_mx`). The first host giving a
    /// conclusive answer wins. Hosts that error are skipped; if every host
    /// errored, the last error is returned.
    pub fn probe_report(
        &self,
        address: &EmailAddress,
        exchanges: &[MxRecord],
    ) -> Result<SmtpProbeReport, ProbeError> {
        let mut mx_tried = Vec::new();
        let mut transcript = Vec::new();
        let mut fallback: Option<(String, HostVerdict)> = None;
        let mut last_err = None;

        for record in exchanges.iter().take(self.options.max_mx.max(1)) {
            let host = record.exchange.as_str();
            mx_tried.push(host.to_string());
            match self.probe_host(host, address, &mut transcript) {
                Ok(verdict) if verdict.outcome.is_conclusive() => {
                    return Ok(verdict.into_report(host, mx_tried, transcript));
                }
                Ok(verdict) => {
                    tracing::debug!(host, reason = ?verdict.reason, "inconclusive answer");
                    fallback = Some((host.to_string(), verdict));
                }
                Err(err) => {
                    tracing::debug!(host, error = %err, "probe attempt failed");
                    transcript.push(format!("[{host}] ! {err}"));
                    last_err = Some(err);
                }
            }
        }

        match (fallback, last_err) {
            (Some((host, verdict)), _) => Ok(verdict.into_report(&host, mx_tried, transcript)),
            (None, Some(err)) => Err(err),
            (None, None) => Err(ProbeError::NoExchangers),
        }
    }

    fn probe_host(
        &self,
        host: &str,
        address: &EmailAddress,
        transcript: &mut Vec<String>,
    ) -> Result<HostVerdict, ProbeError> {
        let addrs = exchanger_addrs(&self.dns, host, self.options.port, self.options.ipv6)?;
        let mut session = SmtpSession::connect(host, &addrs, self.options.timeout)?;
        let result = self.dialogue(&mut session, address);
        if let Ok(verdict) = &result {
            if verdict.in_transaction && session.command("RSET").is_err() {
                tracing::trace!(host, "RSET not acknowledged");
            }
            session.quit();
        }
        transcript.extend(session.take_transcript());
        result
    }

    fn dialogue(
        &self,
        session: &mut SmtpSession,
        address: &EmailAddress,
    ) -> Result<HostVerdict, ProbeError> {
        let banner = session.read_banner()?;
        if !banner.is_positive_completion() {
            return Ok(HostVerdict::inconclusive(format!(
                "banner refused with {}",
                banner.code
            )));
        }

        let helo = self.options.helo_name();
        let ehlo_cmd = format!("EHLO {helo}");
        let mut greeting = session.command(&ehlo_cmd)?;
        if !greeting.is_positive_completion() {
            greeting = session.command(&format!("HELO {helo}"))?;
            if !greeting.is_positive_completion() {
                return Ok(HostVerdict::inconclusive(format!(
                    "HELO refused with {}",
                    greeting.code
                )));
            }
        }

        let offers_tls = greeting.has_capability("STARTTLS");
        if self.options.starttls_required && !offers_tls {
            return Ok(HostVerdict::inconclusive("STARTTLS required but not offered"));
        }
        if let (true, Some(connector)) = (offers_tls, self.tls.as_ref()) {
            let reply = session.starttls(connector)?;
            if reply.is_positive_completion() {
                let again = session.command(&ehlo_cmd)?;
                if !again.is_positive_completion() {
                    return Ok(HostVerdict::inconclusive(format!(
                        "EHLO over TLS refused with {}",
                        again.code
                    )));
                }
            } else if self.options.starttls_required {
                return Ok(HostVerdict::inconclusive(format!(
                    "STARTTLS refused with {}",
                    reply.code
                )));
            }
        }

        let sender = self.options.envelope_sender(address.domain());
        let mail = session.command(&format!("MAIL FROM:<{sender}>"))?;
        if !mail.is_positive_completion() {
            return Ok(HostVerdict::inconclusive(format!(
                "MAIL FROM refused with {}",
                mail.code
            )));
        }

        let rcpt = session.command(&format!("RCPT TO:<{}>", address.as_str()))?;
        let mut verdict = classify_rcpt(&rcpt);
        verdict.in_transaction = true;
        if verdict.outcome == ProbeOutcome::Accepted && self.options.catchall_probes > 0 {
            verdict.catch_all = self.detect_catch_all(session, address);
        }
        verdict.tls = session.is_tls();
        Ok(verdict)
    }

    fn detect_catch_all(&self, session: &mut SmtpSession, address: &EmailAddress) -> Option<bool> {
        let mut accepted = 0usize;
        let mut rejected = 0usize;
        for _ in 0..self.options.catchall_probes.min(5) {
            let alias = random_local_part(address.local_part().len());
            if alias == address.local_part() {
                continue;
            }
            match session.command(&format!("RCPT TO:<{alias}@{}>", address.domain())) {
                Ok(reply) if reply.is_positive_completion() => accepted += 1,
                Ok(reply) if is_mailbox_rejection(&reply) => rejected += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(error = %err, "catch-all probe aborted");
                    return None;
                }
            }
        }
        if accepted > 0 {
            Some(true)
        } else if rejected > 0 {
            Some(false)
        } else {
            None
        }
    }
}

impl<D: DnsBackend> MailboxProbe for SmtpProber<D> {
    fn probe(
        &self,
        address: &EmailAddress,
        exchanges: &[MxRecord],
    ) -> Result<ProbeOutcome, ProbeError> {
        let report = self.probe_report(address, exchanges)?;
        tracing::debug!(
            address = %address,
            outcome = %report.outcome,
            exchange = ?report.exchange,
            code = ?report.reply_code,
            "smtp probe finished"
        );
        Ok(report.outcome)
    }
}

struct HostVerdict {
    outcome: ProbeOutcome,
    reply_code: Option<u16>,
    reason: Option<String>,
    catch_all: Option<bool>,
    tls: bool,
    in_transaction: bool,
}

impl HostVerdict {
    fn inconclusive(reason: impl Into<String>) -> Self {
        Self {
            outcome: ProbeOutcome::Inconclusive,
            reply_code: None,
            reason: Some(reason.into()),
            catch_all: None,
            tls: false,
            in_transaction: false,
        }
    }

    fn into_report(
        self,
        host: &str,
        mx_tried: Vec<String>,
        transcript: Vec<String>,
    ) -> SmtpProbeReport {
        SmtpProbeReport {
            outcome: self.outcome,
            exchange: Some(host.to_string()),
            reply_code: self.reply_code,
            reason: self.reason,
            catch_all: self.catch_all,
            tls: self.tls,
            mx_tried,
            transcript,
        }
    }
}

fn classify_rcpt(reply: &SmtpReply) -> HostVerdict {
    let outcome = if reply.is_positive_completion() {
        ProbeOutcome::Accepted
    } else if is_mailbox_rejection(reply) {
        ProbeOutcome::Rejected
    } else {
        ProbeOutcome::Inconclusive
    };
    let reason = match outcome {
        ProbeOutcome::Accepted => None,
        _ => Some(format!("RCPT TO answered {} {}", reply.code, reply.text())),
    };
    HostVerdict {
        outcome,
        reply_code: Some(reply.code),
        reason,
        catch_all: None,
        tls: false,
        in_transaction: false,
    }
}

/// 550/551/553, or any 5xx carrying an enhanced `5.1.x` (addressing) status.
fn is_mailbox_rejection(reply: &SmtpReply) -> bool {
    if matches!(reply.code, 550 | 551 | 553) {
        return true;
    }
    reply.is_permanent_failure()
        && reply
            .lines
            .first()
            .is_some_and(|line| line.trim_start().starts_with("5.1."))
}
