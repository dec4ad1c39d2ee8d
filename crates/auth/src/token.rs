//! Session token generation.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Default number of random bytes in a session token.
pub const DEFAULT_TOKEN_SIZE: usize = 32;

/// Generate `size` bytes from the OS CSPRNG, base64-encoded for use as a cookie value.
pub fn generate_token(size: usize) -> String {
    let mut bytes = vec![0u8; size];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn token_decodes_to_requested_size() {
        for size in [1, 16, DEFAULT_TOKEN_SIZE, 64] {
            let token = generate_token(size);
            assert_eq!(STANDARD.decode(&token).unwrap().len(), size);
        }
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_token(DEFAULT_TOKEN_SIZE)).collect();
        assert_eq!(tokens.len(), 1000);
    }
}
