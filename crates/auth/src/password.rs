//! Password policy and bcrypt hashing.
//!
//! Stored form is the bcrypt modular crypt string, e.g. `$2b$12$<salt><hash>`.

use crate::error::{AuthError, AuthResult};

pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

const SPECIAL_CHARS: &str = "@$!%*?&";
const MIN_LEN: usize = 8;
const MAX_LEN: usize = 20;

/// 8-20 characters, with at least one lowercase letter, one uppercase letter, one
/// digit and one of `@$!%*?&`. No other characters are allowed.
pub fn validate_password_policy(password: &str) -> AuthResult<()> {
    let len = password.chars().count();
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SPECIAL_CHARS.contains(c));

    let ok = (MIN_LEN..=MAX_LEN).contains(&len)
        && allowed
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c));

    if ok {
        Ok(())
    } else {
        Err(AuthError::WeakPassword)
    }
}

/// Hash `password` with bcrypt at the given cost (clamped to bcrypt's 4..=31).
pub fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
    bcrypt::hash(password, cost.clamp(MIN_HASH_COST, MAX_HASH_COST))
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check `password` against a stored bcrypt hash.
pub fn verify_password(password: &str, stored: &str) -> AuthResult<bool> {
    bcrypt::verify(password, stored).map_err(|_| AuthError::MalformedHash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_strong_passwords() {
        for ok in ["Passw0rd!", "aB3$aaaa", "short1!A", "Zz9&Zz9&Zz9&Zz9&Zz9&"] {
            assert!(validate_password_policy(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_policy_rejects_weak_passwords() {
        for bad in [
            "Pa1!",
            "password1!",
            "PASSWORD1!",
            "Password!!",
            "Password12",
            "Passw0rd!Passw0rd!xyz",
            "Passw0rd #",
        ] {
            assert!(
                matches!(validate_password_policy(bad), Err(AuthError::WeakPassword)),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("Passw0rd!", MIN_HASH_COST).unwrap();
        assert!(stored.starts_with("$2"));
        assert!(verify_password("Passw0rd!", &stored).unwrap());
        assert!(!verify_password("Passw0rd?", &stored).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(
            hash_password("Passw0rd!", MIN_HASH_COST).unwrap(),
            hash_password("Passw0rd!", MIN_HASH_COST).unwrap()
        );
    }

    #[test]
    fn test_cost_is_clamped() {
        let stored = hash_password("Passw0rd!", 1).unwrap();
        assert!(stored.contains("$04$"), "{stored}");
    }

    #[test]
    fn test_malformed_hash() {
        for bad in ["", "plain", "sha256$1$00$00", "$2b$04$tooshort"] {
            assert!(matches!(
                verify_password("x", bad),
                Err(AuthError::MalformedHash)
            ));
        }
    }
}
