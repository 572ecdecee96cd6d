//! Typo suggestions for mail domains.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::address::domain_key;

/// Largest edit distance still reported as a likely typo.
pub const MAX_DISTANCE: usize = 2;

/// Default candidates for [`suggest_domains`].
pub const COMMON_PROVIDERS: &[&str] = &[
    "aol.com",
    "comcast.net",
    "gmail.com",
    "gmx.com",
    "gmx.de",
    "googlemail.com",
    "hotmail.co.uk",
    "hotmail.com",
    "hotmail.fr",
    "icloud.com",
    "live.com",
    "mac.com",
    "mail.com",
    "me.com",
    "msn.com",
    "orange.fr",
    "outlook.com",
    "proton.me",
    "protonmail.com",
    "web.de",
    "yahoo.co.uk",
    "yahoo.com",
    "yahoo.fr",
    "yandex.com",
    "zoho.com",
];

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub domain: String,
    pub distance: usize,
}

/// Candidates within [`MAX_DISTANCE`] edits of `domain`, closest first, ties
/// broken alphabetically. An exact match is never suggested.
pub fn suggest_domains<S: AsRef<str>>(
    domain: &str,
    candidates: &[S],
    max: usize,
) -> Vec<Suggestion> {
    let needle = domain_key(domain);
    if needle.is_empty() || max == 0 {
        return Vec::new();
    }

    let mut found: Vec<Suggestion> = candidates
        .iter()
        .map(|c| domain_key(c.as_ref()))
        .filter(|c| !c.is_empty() && *c != needle)
        .filter_map(|candidate| {
            let distance = levenshtein(&needle, &candidate);
            (distance <= MAX_DISTANCE).then_some(Suggestion {
                domain: candidate,
                distance,
            })
        })
        .collect();
    found.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.domain.cmp(&b.domain)));
    found.dedup_by(|a, b| a.domain == b.domain);
    found.truncate(max);
    found
}

/// [`suggest_domains`] against [`COMMON_PROVIDERS`].
pub fn suggest_common(domain: &str, max: usize) -> Vec<Suggestion> {
    suggest_domains(domain, COMMON_PROVIDERS, max)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("gmial.com", "gmail.com"), 2);
        assert_eq!(levenshtein("gmai.com", "gmail.com"), 1);
    }

    #[test]
    fn common_typo_is_suggested_first() {
        let found = suggest_common("gmai.com", 3);
        assert_eq!(
            found.first(),
            Some(&Suggestion {
                domain: "gmail.com".into(),
                distance: 1
            })
        );
    }

    #[test]
    fn ranking_is_distance_then_alphabetical() {
        let candidates = ["yahoo.fr", "yahoo.com", "yahoo.co", "yahoo.com"];
        let found = suggest_domains("yahoo.cm", &candidates, 5);
        let names: Vec<_> = found.iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(names, ["yahoo.co", "yahoo.com", "yahoo.fr"]);
        assert_eq!(found[0].distance, 1);
        assert_eq!(found[2].distance, 2);
    }

    #[test]
    fn exact_match_and_far_candidates_are_excluded() {
        assert!(suggest_common("GMAIL.com", 3).iter().all(|s| s.domain != "gmail.com"));
        assert!(suggest_domains("example.org", &["gmail.com"], 3).is_empty());
    }

    #[test]
    fn max_limits_output() {
        assert_eq!(suggest_common("hotmail.cm", 1).len(), 1);
        assert!(suggest_common("hotmail.cm", 0).is_empty());
        assert!(suggest_common("", 3).is_empty());
    }
}
