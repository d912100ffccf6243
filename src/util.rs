//! Small shared helpers

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random ASCII alphanumeric string of `len` characters
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_length_and_charset() {
        let s = random_string(18);
        assert_eq!(s.len(), 18);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_string_zero_len() {
        assert!(random_string(0).is_empty());
    }
}
