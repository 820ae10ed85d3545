//! One-way password hashing in Django's format: `pbkdf2_sha256$<iterations>$<salt>$<digest>`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const ALGORITHM: &str = "pbkdf2_sha256";
const ITERATIONS: u32 = 260_000;
/// SHA-256 output size, Django's default derived key length.
const KEY_LEN: usize = 32;

fn digest(salt: &str, password: &str, iterations: u32) -> String {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    STANDARD.encode(key)
}

/// Hash with a fresh random salt at the default work factor.
pub fn hash_password(password: &str) -> String {
    hash_password_with_iterations(password, ITERATIONS)
}

/// The iteration count is stored in the hash, so verification needs no configuration.
pub fn hash_password_with_iterations(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}${}${}${}",
        ALGORITHM,
        iterations,
        salt,
        digest(&salt, password, iterations)
    )
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let actual = digest(salt, password, iterations);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let encoded = hash_password("drivEr123");
        assert!(encoded.starts_with("pbkdf2_sha256$260000$"));
        assert!(verify_password("drivEr123", &encoded));
        assert!(!verify_password("driver123", &encoded));
    }

    #[test]
    fn matches_pbkdf2_hmac_sha256_test_vector() {
        // RFC 7914 section 11, truncated to 32 bytes.
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut key);
        assert_eq!(
            key,
            [
                0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f, 0xec, 0x16, 0x91, 0xc2, 0x25, 0x44, 0xb6, 0x05,
                0xf9, 0x41, 0x85, 0x21, 0x6d, 0xde, 0x04, 0x65, 0xe6, 0x8b, 0x9d, 0x57, 0xc2, 0x0d, 0xac, 0xbc,
            ]
        );
        let encoded = format!("pbkdf2_sha256$1$salt${}", STANDARD.encode(key));
        assert!(verify_password("passwd", &encoded));
    }

    #[test]
    fn iteration_count_travels_with_the_hash() {
        let encoded = hash_password_with_iterations("driver123", 1_000);
        assert!(encoded.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("driver123", &encoded));
        assert!(hash_password_with_iterations("x", 0).starts_with("pbkdf2_sha256$1$"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$salt$abc"));
        assert!(!verify_password("x", "sha256$1$salt$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$zero$salt$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$0$salt$abc"));
    }
}
