use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

/// Generate a random 256-bit key for signing session cookies.
pub fn generate_session_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Generate a session secret in the base64 form accepted by
/// `WARBLER_SESSION_SECRET`.
pub fn generate_session_secret() -> String {
    key_to_base64(&generate_session_key())
}

/// Encode a key to base64 for display/sharing.
pub fn key_to_base64(key: &[u8; 32]) -> String {
    BASE64.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_encodes_a_full_key() {
        let secret = generate_session_secret();
        assert_eq!(BASE64.decode(&secret).unwrap().len(), 32);
        assert_ne!(secret, generate_session_secret());
    }
}
