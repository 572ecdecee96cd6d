use rand::{Rng, distributions::Alphanumeric};

/// Random local part used to detect catch-all servers. Lower-case so it
/// cannot collide with a case-sensitive mailbox by accident.
pub(crate) fn random_local_part(len: usize) -> String {
    let length = len.clamp(10, 32);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_alias_is_bounded_and_alphanumeric() {
        let alias = random_local_part(3);
        assert_eq!(alias.len(), 10);
        assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(random_local_part(100).len(), 32);
    }
}
