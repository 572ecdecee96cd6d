use std::fmt;

/// One MX answer. Ordering is by preference first, so a sorted list is in
/// the order exchangers should be tried.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

impl fmt::Display for MxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

/// Outcome of a successful MX query. `NoRecords` covers NXDOMAIN as well as
/// an empty answer.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxStatus {
    Records(Vec<MxRecord>),
    NoRecords,
}

impl MxStatus {
    pub fn records(&self) -> &[MxRecord] {
        if let Self::Records(records) = self {
            records
        } else {
            &[]
        }
    }

    pub fn has_records(&self) -> bool {
        !self.records().is_empty()
    }

    /// Sorted by preference, duplicates dropped. A null MX (RFC 7505, an
    /// exchange of `.`) names no host and is dropped too.
    pub(crate) fn from_records(mut records: Vec<MxRecord>) -> Self {
        records.retain(|r| !r.exchange.trim_end_matches('.').is_empty());
        records.sort();
        records.dedup();
        if records.is_empty() {
            Self::NoRecords
        } else {
            Self::Records(records)
        }
    }
}
