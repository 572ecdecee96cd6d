//! SMTP recipient probing.

mod dns;
mod error;
mod options;
mod probe;
mod session;
mod types;
mod util;

pub use error::ProbeError;
pub use options::SmtpProbeOptions;
pub use probe::{MailboxProbe, SmtpProber};
pub use session::SmtpReply;
pub use types::{ProbeOutcome, SmtpProbeReport};
