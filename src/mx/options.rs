use std::time::Duration;

/// Knobs for [`MxResolver`](super::MxResolver) and the DNS backend it wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxOptions {
    pub timeout: Duration,
    pub attempts: usize,
    /// Zero disables caching.
    pub cache_capacity: usize,
}

impl Default for MxOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            attempts: 1,
            cache_capacity: 1024,
        }
    }
}
