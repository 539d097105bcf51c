//! Password policy and hashing.
//!
//! One rule set for every place a password is chosen: storefront
//! registration, password reset, and staff-created accounts in the admin.
//! Messages are user-facing Spanish.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords nobody should be allowed to keep.
const COMMON_PASSWORDS: &[&str] = &[
    "12345678",
    "password",
    "qwerty",
    "123456789",
    "abc123",
    "111111",
    "123123",
];

/// Easy keyboard runs rejected anywhere inside a password.
const EASY_SEQUENCES: &[&str] = &[
    "1234", "2345", "3456", "4567", "5678", "abcd", "bcde", "cdef", "defg",
];

/// Symbols that satisfy the symbol requirement.
const REQUIRED_SYMBOLS: &str = "!@#$%^&*";

/// Errors from password validation or hashing.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Password fails the policy; the message is shown to the user.
    #[error("{0}")]
    Weak(String),

    /// Password and confirmation differ.
    #[error("Las contraseñas no coinciden.")]
    Mismatch,

    /// Hashing failed.
    #[error("password hashing failed")]
    Hash,
}

/// Validate a password and its confirmation together.
///
/// # Errors
///
/// Returns `PasswordError::Mismatch` when the two differ, otherwise any
/// `PasswordError::Weak` from [`validate`].
pub fn validate_pair(password: &str, confirm: &str) -> Result<(), PasswordError> {
    validate(password)?;
    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    Ok(())
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `PasswordError::Weak` with the message shown to the user.
pub fn validate(password: &str) -> Result<(), PasswordError> {
    if password != password.trim() {
        return Err(PasswordError::Weak(
            "La contraseña no puede tener espacios al inicio o final.".to_string(),
        ));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::Weak(
            "La contraseña debe tener al menos 8 caracteres.".to_string(),
        ));
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(PasswordError::Weak(
            "La contraseña es demasiado común.".to_string(),
        ));
    }

    if EASY_SEQUENCES.iter().any(|seq| lowered.contains(seq)) {
        return Err(PasswordError::Weak(
            "La contraseña no puede contener secuencias fáciles.".to_string(),
        ));
    }

    if is_single_repeated_char(password) {
        return Err(PasswordError::Weak(
            "La contraseña no puede contener caracteres repetidos.".to_string(),
        ));
    }

    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| REQUIRED_SYMBOLS.contains(c));
    if !(has_upper && has_lower && has_digit && has_symbol) {
        return Err(PasswordError::Weak(
            "La contraseña debe incluir mayúscula, minúscula, número y símbolo (!@#$%^&*)."
                .to_string(),
        ));
    }

    Ok(())
}

/// Whether the whole password is one character repeated six or more times.
fn is_single_repeated_char(password: &str) -> bool {
    let mut chars = password.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    password.chars().count() >= 6 && chars.all(|c| c == first)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if hashing fails.
pub fn hash(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored hash.
#[must_use]
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weak_message(password: &str) -> String {
        match validate(password) {
            Err(PasswordError::Weak(msg)) => msg,
            other => panic!("expected Weak, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_strong_password() {
        assert!(validate("Rst!7uWq").is_ok());
        assert!(validate("Muy$eguro9").is_ok());
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        assert!(weak_message(" Rst!7uWq").contains("espacios"));
        assert!(weak_message("Rst!7uWq ").contains("espacios"));
    }

    #[test]
    fn rejects_short_passwords() {
        assert!(weak_message("Ab1!xyz").contains("al menos 8"));
    }

    #[test]
    fn rejects_common_passwords() {
        assert!(weak_message("Password").contains("demasiado común"));
        assert!(weak_message("12345678").contains("demasiado común"));
    }

    #[test]
    fn rejects_easy_sequences() {
        assert!(weak_message("Xy!a1234zz").contains("secuencias"));
        assert!(weak_message("AbCdEf!9x").contains("secuencias"));
    }

    #[test]
    fn rejects_single_repeated_char() {
        assert!(weak_message("aaaaaaaa").contains("repetidos"));
    }

    #[test]
    fn requires_all_character_classes() {
        assert!(weak_message("solominusculas!7").contains("mayúscula"));
        assert!(weak_message("SOLOMAYUSCULAS!7").contains("mayúscula"));
        assert!(weak_message("SinNumeros!!").contains("mayúscula"));
        assert!(weak_message("SinSimbolos77").contains("mayúscula"));
    }

    #[test]
    fn pair_must_match() {
        assert!(matches!(
            validate_pair("Rst!7uWq", "Rst!7uWr"),
            Err(PasswordError::Mismatch)
        ));
        assert!(validate_pair("Rst!7uWq", "Rst!7uWq").is_ok());
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hashed = hash("Rst!7uWq").unwrap();
        assert!(verify("Rst!7uWq", &hashed));
        assert!(!verify("otra", &hashed));
        assert!(!verify("Rst!7uWq", "not-a-phc-string"));
    }

    #[test]
    fn repeated_char_detector_needs_six() {
        assert!(is_single_repeated_char("zzzzzz"));
        assert!(!is_single_repeated_char("zzzzz"));
        assert!(!is_single_repeated_char("zzzzzy"));
        assert!(!is_single_repeated_char(""));
    }
}
