//! Argon2 password hashing and constant-time verification.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use crate::AuthError;

/// Hash a password with a fresh OS-random salt and default Argon2id cost.
///
/// The result is a PHC string that embeds algorithm, version, cost and salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with(password, Params::default())
}

/// Hash a password with explicit Argon2id cost parameters.
pub fn hash_password_with(password: &str, params: Params) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Default-cost hash that no password verifies against. Checked in place of a
/// missing user's hash so unknown usernames cost one full verification too.
pub const DECOY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Compare a user-entered password against a stored PHC hash.
///
/// The entered password is re-hashed with the stored hash's algorithm, version,
/// cost and salt, and the two raw outputs are compared in constant time.
/// A stored hash that cannot be parsed never matches.
pub fn compare_passwords(entered_password: &str, password_hash: &str) -> bool {
    let Ok(stored) = PasswordHash::new(password_hash) else {
        return false;
    };
    let (Some(salt), Some(expected)) = (stored.salt, stored.hash) else {
        return false;
    };
    let Ok(params) = Params::try_from(&stored) else {
        return false;
    };

    let recomputed = Argon2::default().hash_password_customized(
        entered_password.as_bytes(),
        Some(stored.algorithm),
        stored.version,
        params,
        salt,
    );

    match recomputed.ok().and_then(|h| h.hash) {
        Some(actual) => actual.as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}

#[cfg(test)]
pub(crate) fn fast_params() -> Params {
    Params::new(1024, 1, 1, None).expect("valid argon2 params")
}
