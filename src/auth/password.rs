use bcrypt::{hash, verify};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PasswordError {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must be no more than 128 characters long")]
    TooLong,
    #[error("Password must contain at least one letter")]
    NoLetter,
    #[error("Password must contain at least one number")]
    NoNumber,
    #[error("Failed to hash password")]
    HashingFailed,
    #[error("Failed to verify password")]
    VerificationFailed,
}

impl PasswordError {
    /// True for rule violations, false for bcrypt failures
    pub fn is_policy_violation(&self) -> bool {
        !matches!(self, PasswordError::HashingFailed | PasswordError::VerificationFailed)
    }
}

/// Password strength requirements
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_letter: bool,
    pub require_number: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: true,
            require_number: true,
        }
    }
}

/// Validate password strength according to policy
pub fn validate_password_strength(password: &str, policy: &PasswordPolicy) -> Result<(), PasswordError> {
    let length = password.chars().count();

    if length < policy.min_length {
        return Err(PasswordError::TooShort);
    }

    if length > policy.max_length {
        return Err(PasswordError::TooLong);
    }

    if policy.require_letter && !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(PasswordError::NoLetter);
    }

    if policy.require_number && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::NoNumber);
    }

    Ok(())
}

pub fn is_valid_password(password: &str) -> bool {
    validate_password_strength(password, &PasswordPolicy::default()).is_ok()
}

/// Hash a password using bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    hash(password, cost).map_err(|_| PasswordError::HashingFailed)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    verify(password, hash).map_err(|_| PasswordError::VerificationFailed)
}

/// Generate a random 32-character alphanumeric password reset token
pub fn generate_reset_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    const TOKEN_LEN: usize = 32;

    let mut rng = rand::thread_rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
