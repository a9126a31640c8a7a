//! Session identifiers and signed session tokens.
//!
//! The session id is the key in the session store. The client receives
//! `{sid}.{signature}` where the signature is an HMAC-SHA256 of the id under
//! the server's session secret. A token with a bad signature is treated the
//! same as an unknown session.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Opaque server-side session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// 256 bits of randomness, base64url without padding.
    pub fn generate() -> Self {
        let mut buf = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut buf);
        Self(URL_SAFE_NO_PAD.encode(buf))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionKeyError {
    #[error("session secret must not be empty")]
    Empty,
}

/// Signs and verifies session tokens with the configured secret.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl core::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionSigner").finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SessionKeyError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SessionKeyError::Empty);
        }
        // HMAC accepts keys of any length; only an empty secret is refused above.
        let mac = <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| SessionKeyError::Empty)?;
        Ok(Self { mac })
    }

    /// Token handed to the client for `sid`.
    pub fn sign(&self, sid: &SessionId) -> String {
        let mut mac = self.mac.clone();
        mac.update(sid.as_str().as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", sid.as_str(), sig)
    }

    /// Session id carried by `token`, if the signature checks out.
    pub fn verify(&self, token: &str) -> Option<SessionId> {
        let (sid, sig) = token.rsplit_once('.')?;
        if sid.is_empty() {
            return None;
        }
        let sig = URL_SAFE_NO_PAD.decode(sig).ok()?;

        let mut mac = self.mac.clone();
        mac.update(sid.as_bytes());
        mac.verify_slice(&sig).ok()?;

        Some(SessionId::from_raw(sid))
    }
}
