//! Credential hashing.
//!
//! Two implementations share one contract: `digest` produces the stored form
//! and `verify` recomputes from plaintext and compares. Plaintext is never
//! stored and there is no path back from a digest to a password.

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// One-way transform of plaintext passwords into storable digests.
pub trait CredentialHasher: Send + Sync {
    fn digest(&self, plaintext: &str) -> Result<String, HashError>;

    /// `true` when `plaintext` produces `stored`.
    fn verify(&self, plaintext: &str, stored: &str) -> bool;
}

impl<H> CredentialHasher for std::sync::Arc<H>
where
    H: CredentialHasher + ?Sized,
{
    fn digest(&self, plaintext: &str) -> Result<String, HashError> {
        (**self).digest(plaintext)
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        (**self).verify(plaintext, stored)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy deterministic digest
// ─────────────────────────────────────────────────────────────────────────────

/// Unsalted SHA-256, lower-case hex.
///
/// Deterministic: the same input always yields the same digest. Kept for
/// accounts created before salted hashing was introduced.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn hex_digest(plaintext: &str) -> String {
        format!("{:x}", Sha256::digest(plaintext.as_bytes()))
    }
}

impl CredentialHasher for Sha256Hasher {
    fn digest(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(Self::hex_digest(plaintext))
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        Self::hex_digest(plaintext)
            .as_bytes()
            .ct_eq(stored.as_bytes())
            .into()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Argon2id
// ─────────────────────────────────────────────────────────────────────────────

/// Salted Argon2id producing PHC strings (`$argon2id$v=19$...`).
///
/// Stored values that are not PHC strings are checked as legacy SHA-256
/// digests, so existing accounts keep working.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: argon2::Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn digest(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        if !stored.starts_with("$argon2") {
            return Sha256Hasher.verify(plaintext, stored);
        }

        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "stored credential is not a valid PHC string");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast_argon2() -> Argon2Hasher {
        Argon2Hasher::with_params(argon2::Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            Sha256Hasher.digest("secret123").unwrap(),
            "fcf730b6d95236ecd3c9fc2d92d7b6b2bb061514961aec041d6c7a7192f592e4"
        );
        assert_eq!(
            Sha256Hasher.digest("").unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_verify_requires_the_exact_stored_digest() {
        let stored = Sha256Hasher.digest("secret123").unwrap();
        assert!(Sha256Hasher.verify("secret123", &stored));
        assert!(!Sha256Hasher.verify("secret123", &stored[..63]));
        assert!(!Sha256Hasher.verify("secret123", &stored.to_uppercase()));
        assert!(!Sha256Hasher.verify("secret123", ""));
    }

    #[test]
    fn argon2_salts_each_digest_but_verifies_both() {
        let hasher = fast_argon2();
        let a = hasher.digest("secret123").unwrap();
        let b = hasher.digest("secret123").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(hasher.verify("secret123", &a));
        assert!(hasher.verify("secret123", &b));
        assert!(!hasher.verify("secret124", &a));
    }

    #[test]
    fn argon2_accepts_legacy_digests() {
        let legacy = Sha256Hasher.digest("old-password").unwrap();
        let hasher = fast_argon2();
        assert!(hasher.verify("old-password", &legacy));
        assert!(!hasher.verify("other", &legacy));
    }

    #[test]
    fn malformed_phc_never_verifies() {
        assert!(!fast_argon2().verify("x", "$argon2id$garbage"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: digest is a pure function of its input.
        #[test]
        fn sha256_digest_is_deterministic(plaintext in ".{0,64}") {
            let first = Sha256Hasher.digest(&plaintext).unwrap();
            let second = Sha256Hasher.digest(&plaintext).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(Sha256Hasher.verify(&plaintext, &first));
            prop_assert_ne!(first, plaintext);
        }

        /// Property: a different password never verifies against the digest.
        #[test]
        fn sha256_rejects_other_plaintext(a in "[a-z]{1,16}", b in "[a-z]{1,16}") {
            prop_assume!(a != b);
            let digest = Sha256Hasher.digest(&a).unwrap();
            prop_assert!(!Sha256Hasher.verify(&b, &digest));
        }
    }
}
