//! DNS MX resolution.

mod cache;
mod error;
mod options;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use options::MxOptions;
pub use resolver::{DnsBackend, DnsResolver, MxLookup, MxResolver, check_mx};
pub use types::{MxRecord, MxStatus};
