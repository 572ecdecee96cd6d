//! Disposable-domain detection.
//!
//! The built-in list is a compile-time perfect-hash set. A deployment can add
//! its own entries once at startup; afterwards the set is read-only and meant
//! to be shared behind an `Arc`.

mod list;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::address::domain_key;

#[derive(Debug, Error)]
pub enum DisposableError {
    #[error("cannot read disposable list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DisposableDomains {
    extra: HashSet<String>,
}

impl DisposableDomains {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_extra<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra = domains
            .into_iter()
            .map(|d| domain_key(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { extra }
    }

    /// Built-in list plus one domain per line from `path`. Blank lines and
    /// `#` comments are skipped.
    pub fn with_extra_file(path: impl AsRef<Path>) -> Result<Self, DisposableError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DisposableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let domains = contents
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty());
        let set = Self::with_extra(domains);
        tracing::debug!(path = %path.display(), extra = set.extra.len(), "loaded disposable list");
        Ok(set)
    }

    pub fn is_disposable(&self, domain: &str) -> bool {
        let key = domain_key(domain);
        list::BUILTIN.contains(key.as_str()) || self.extra.contains(&key)
    }

    pub fn len(&self) -> usize {
        let added = self
            .extra
            .iter()
            .filter(|d| !list::BUILTIN.contains(d.as_str()))
            .count();
        list::BUILTIN.len() + added
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Membership test against the built-in list.
pub fn is_disposable(domain: &str) -> bool {
    list::BUILTIN.contains(domain_key(domain).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_contains_mailinator() {
        assert!(is_disposable("mailinator.com"));
        assert!(!is_disposable("example.com"));
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let set = DisposableDomains::builtin();
        assert!(set.is_disposable("MailInator.COM"));
        assert!(set.is_disposable("yopmail.com."));
    }

    #[test]
    fn subdomains_are_not_members() {
        assert!(!is_disposable("eu.mailinator.com"));
    }

    #[test]
    fn extra_entries_extend_builtin() {
        let set = DisposableDomains::with_extra(["Throwaway.Example", ""]);
        assert!(set.is_disposable("throwaway.example"));
        assert!(set.is_disposable("mailinator.com"));
        assert_eq!(set.len(), list::BUILTIN.len() + 1);
    }

    #[test]
    fn extra_file_skips_comments_and_blanks() {
        let path = std::env::temp_dir().join(format!(
            "mailverdict-disposable-{}.txt",
            std::process::id()
        ));
        {
            let mut f = std::fs::File::create(&path).expect("create list");
            writeln!(f, "# local additions").expect("write");
            writeln!(f).expect("write");
            writeln!(f, "junkbox.test  # added after abuse report").expect("write");
        }
        let set = DisposableDomains::with_extra_file(&path).expect("load list");
        std::fs::remove_file(&path).ok();
        assert!(set.is_disposable("junkbox.test"));
        assert!(!set.is_disposable("# local additions"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = DisposableDomains::with_extra_file("/nonexistent/mailverdict/list.txt")
            .expect_err("missing file");
        assert!(matches!(err, DisposableError::Read { .. }));
    }
}
