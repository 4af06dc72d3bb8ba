//! Square webhook signature verification.
//!
//! Square signs each notification with HMAC-SHA1 over the notification URL
//! followed by the raw request body, keyed with the webhook signature key,
//! and sends the base64 digest in the `X-Square-Signature` header.
//! Reference: https://docs.connect.squareup.com/api/connect/v1/#webhooks-overview

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// HTTP header carrying the claimed signature.
pub const SIGNATURE_HEADER: &str = "X-Square-Signature";

/// Keyed hash used to sign notifications.
///
/// `HmacSha1` is what Square sends. `HmacSha256` keeps the same key and
/// message construction for deployments whose sender signs with SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    HmacSha1,
    HmacSha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::HmacSha1 => "sha1",
            SignatureAlgorithm::HmacSha256 => "sha256",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an algorithm name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlgorithm;

impl FromStr for SignatureAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "hmac-sha1" => Ok(SignatureAlgorithm::HmacSha1),
            "sha256" | "hmac-sha256" => Ok(SignatureAlgorithm::HmacSha256),
            _ => Err(UnknownAlgorithm),
        }
    }
}

/// Verifier bound to one sender identity.
///
/// Built once at startup from configuration and shared read-only by every
/// request.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    notification_url: String,
    algorithm: SignatureAlgorithm,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("notification_url", &self.notification_url)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(
        secret: impl Into<String>,
        notification_url: impl Into<String>,
        algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            secret: secret.into(),
            notification_url: notification_url.into(),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Compute the signature Square would send for `body`.
    ///
    /// Returns `None` when no secret is configured.
    pub fn sign(&self, body: &[u8]) -> Option<String> {
        if self.secret.is_empty() {
            return None;
        }

        let key = self.secret.as_bytes();
        let url = self.notification_url.as_bytes();

        match self.algorithm {
            SignatureAlgorithm::HmacSha1 => mac_base64::<HmacSha1>(key, url, body),
            SignatureAlgorithm::HmacSha256 => mac_base64::<HmacSha256>(key, url, body),
        }
    }

    /// Check a claimed signature against the body.
    ///
    /// Never fails: a missing header or secret is simply an invalid signature.
    pub fn verify(&self, body: &[u8], claimed_signature: &str) -> bool {
        if self.secret.is_empty() || claimed_signature.is_empty() {
            warn!(
                has_secret = !self.secret.is_empty(),
                has_signature = !claimed_signature.is_empty(),
                "square_signature_missing_fields"
            );
            return false;
        }

        let expected_signature = match self.sign(body) {
            Some(signature) => signature,
            None => {
                warn!("square_signature_invalid_key");
                return false;
            }
        };

        let valid = constant_time_eq(expected_signature.as_bytes(), claimed_signature.as_bytes());

        if !valid {
            warn!(
                algorithm = %self.algorithm,
                expected_length = expected_signature.len(),
                actual_length = claimed_signature.len(),
                "square_signature_mismatch"
            );
        }

        valid
    }
}

/// Verify a Square webhook signature with the default algorithm.
///
/// # Arguments
///
/// * `body` - Raw request body, exactly as received
/// * `claimed_signature` - Value of the `X-Square-Signature` header
/// * `secret` - Webhook signature key
/// * `notification_url` - The URL registered for notifications
pub fn verify(body: &[u8], claimed_signature: &str, secret: &str, notification_url: &str) -> bool {
    SignatureVerifier::new(secret, notification_url, SignatureAlgorithm::HmacSha1)
        .verify(body, claimed_signature)
}

/// Compute the default-algorithm signature for a body.
pub fn sign(body: &[u8], secret: &str, notification_url: &str) -> Option<String> {
    SignatureVerifier::new(secret, notification_url, SignatureAlgorithm::HmacSha1).sign(body)
}

/// base64(HMAC(key, url || body))
fn mac_base64<M>(key: &[u8], url: &[u8], body: &[u8]) -> Option<String>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as KeyInit>::new_from_slice(key).ok()?;
    mac.update(url);
    mac.update(body);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time byte comparison. Only the length may short-circuit, and the
/// expected length is public.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
