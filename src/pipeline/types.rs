use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::address::EmailAddress;
use crate::validator::ValidationMode;

/// Final classification of one address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Invalid,
    Risky,
    Unknown,
    Valid,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Risky => "Risky",
            Self::Unknown => "Unknown",
            Self::Valid => "Valid",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that produced a [`Verdict`].
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Syntax,
    Disposable,
    Mx,
    Smtp,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Disposable => "disposable",
            Self::Mx => "mx",
            Self::Smtp => "smtp",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub label: Label,
    pub decided_by: Stage,
}

impl Verdict {
    pub fn new(label: Label, decided_by: Stage) -> Self {
        Self { label, decided_by }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub address: EmailAddress,
    pub label: Label,
}

impl VerificationResult {
    pub fn new(address: impl Into<EmailAddress>, label: Label) -> Self {
        Self {
            address: address.into(),
            label,
        }
    }
}

/// Where the disposable-domain check sits relative to the network checks.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckOrder {
    #[default]
    DisposableFirst,
    ProbeFirst,
}

impl CheckOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisposableFirst => "disposable-first",
            Self::ProbeFirst => "probe-first",
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub mode: ValidationMode,
    pub order: CheckOrder,
}
