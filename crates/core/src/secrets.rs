//! Strength checks for operator-supplied secrets.
//!
//! Both servers sign account tokens with the shared `ACCOUNT_TOKEN_SECRET`,
//! so both validate it at startup with the same rules: minimum length, no
//! placeholder values, and enough entropy to plausibly be randomly generated.

use thiserror::Error;

/// Minimum length for a signing secret.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Minimum Shannon entropy (bits per character) for secrets.
///
/// A hex-encoded random string has ~4 bits/char; base64 has ~6 bits/char.
/// Human-chosen passwords and repeated characters fall well below 3.3.
pub const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Patterns that indicate a placeholder value rather than a real secret.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "changeme",
    "change-me",
    "change_me",
    "placeholder",
    "example",
    "sample",
    "your-secret",
    "your_secret",
    "yoursecret",
    "secret-here",
    "secret_here",
    "insert-",
    "insert_",
    "xxxx",
    "todo",
    "fixme",
    "test-secret",
    "test_secret",
    "dev-secret",
    "dev_secret",
    "password",
    "12345",
    "abcdef",
];

/// Why a secret was rejected.
#[derive(Debug, Error)]
pub enum SecretStrengthError {
    #[error("must be at least {MIN_SECRET_LENGTH} characters")]
    TooShort,

    #[error("contains placeholder pattern '{0}'")]
    Placeholder(&'static str),

    #[error("entropy too low ({0:.2} bits/char, need {MIN_ENTROPY_BITS_PER_CHAR})")]
    LowEntropy(f64),
}

/// Validate that a secret is long enough, not a known placeholder, and
/// has enough entropy to plausibly be randomly generated.
pub fn validate_strength(value: &str) -> Result<(), SecretStrengthError> {
    if value.len() < MIN_SECRET_LENGTH {
        return Err(SecretStrengthError::TooShort);
    }

    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(SecretStrengthError::Placeholder(pattern));
        }
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(SecretStrengthError::LowEntropy(entropy));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
    }

    let len = s.chars().count() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_secret() {
        assert!(matches!(
            validate_strength("short"),
            Err(SecretStrengthError::TooShort)
        ));
    }

    #[test]
    fn rejects_placeholder() {
        let result = validate_strength("changeme-changeme-changeme-changeme-changeme");
        assert!(matches!(result, Err(SecretStrengthError::Placeholder(_))));
    }

    #[test]
    fn rejects_low_entropy() {
        let result = validate_strength(&"ab".repeat(20));
        assert!(matches!(result, Err(SecretStrengthError::LowEntropy(_))));
    }

    #[test]
    fn accepts_random_secret() {
        assert!(validate_strength("kJ8vN2pQ7wX4mR9sT6yU3bC5dF1gH0aZ").is_ok());
    }

    #[test]
    fn entropy_of_repeated_char_is_zero() {
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
    }

    #[test]
    fn entropy_grows_with_variety() {
        let low = shannon_entropy("abababab");
        let high = shannon_entropy("kJ8vN2pQ7wX4mR9s");
        assert!(low < high);
        assert!((low - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn errors_render_operator_readable_reasons() {
        assert_eq!(
            SecretStrengthError::TooShort.to_string(),
            "must be at least 32 characters"
        );
        let placeholder = SecretStrengthError::Placeholder("changeme").to_string();
        assert!(placeholder.contains("changeme"));
    }
}
