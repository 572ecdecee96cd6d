use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// What the target server said about the recipient.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    Accepted,
    Rejected,
    Inconclusive,
}

impl ProbeOutcome {
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Inconclusive => "inconclusive",
        })
    }
}

/// Full account of a probe across the exchangers that were tried.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeReport {
    pub outcome: ProbeOutcome,
    pub exchange: Option<String>,
    pub reply_code: Option<u16>,
    pub reason: Option<String>,
    pub catch_all: Option<bool>,
    pub tls: bool,
    pub mx_tried: Vec<String>,
    pub transcript: Vec<String>,
}
