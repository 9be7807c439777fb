//! Sign-in request signature.
//!
//! The web client signs `grant_type + client_id + source + timestamp` with
//! HMAC-SHA1 under a key baked into the site's JavaScript.

use hmac::{Hmac, Mac};
use sha1::Sha1;

/// HMAC key used by the web sign-in form.
pub const SIGNATURE_KEY: &[u8] = b"d1b964811afb40118a12068ff74a12f4";

type HmacSha1 = Hmac<Sha1>;

/// Computes the lowercase hex signature for a sign-in attempt.
#[must_use]
pub fn compute_signature(grant_type: &str, client_id: &str, source: &str, timestamp: u64) -> String {
    let mut mac = match HmacSha1::new_from_slice(SIGNATURE_KEY) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(grant_type.as_bytes());
    mac.update(client_id.as_bytes());
    mac.update(source.as_bytes());
    mac.update(timestamp.to_string().as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_ID: &str = "c3cef7c66a1843f8b3a9e6a1e3160e20";

    #[test]
    fn test_signature_is_forty_lowercase_hex_chars() {
        let sig = compute_signature("password", CLIENT_ID, "com.zhihu.web", 1_528_102_861_123);
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_matches_single_update_over_concatenation() {
        let timestamp = 1_528_102_861_123_u64;
        let mut mac = HmacSha1::new_from_slice(SIGNATURE_KEY).unwrap();
        mac.update(format!("password{CLIENT_ID}com.zhihu.web{timestamp}").as_bytes());
        let expected = hex_encode(&mac.finalize().into_bytes());

        assert_eq!(
            compute_signature("password", CLIENT_ID, "com.zhihu.web", timestamp),
            expected
        );
    }

    #[test]
    fn test_signature_known_vector_for_web_sign_in() {
        assert_eq!(
            compute_signature("password", CLIENT_ID, "com.zhihu.web", 1_528_102_861_123),
            "a5fd58110ffa7b668706bc381bc0fd1ca68b3c96"
        );
    }

    #[test]
    fn test_signature_changes_with_timestamp() {
        let a = compute_signature("password", CLIENT_ID, "com.zhihu.web", 1);
        let b = compute_signature("password", CLIENT_ID, "com.zhihu.web", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hmac_sha1_known_vector() {
        // RFC 2202 test case 2
        let mut mac = HmacSha1::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        assert_eq!(
            hex_encode(&mac.finalize().into_bytes()),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn test_hex_encode_pads_small_bytes() {
        assert_eq!(hex_encode(&[0x00, 0x0f, 0xff]), "000fff");
    }
}
