//! PKCE (Proof Key for Code Exchange) challenge computation and verification.
//!
//! Implements the S256 code challenge method per RFC 7636. The plain
//! method is not supported anywhere in this server.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compute the S256 code challenge for a verifier.
///
/// `BASE64URL(SHA256(code_verifier))`, unpadded.
#[must_use]
pub fn challenge_s256(code_verifier: &str) -> String {
    let hash = Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Verify a PKCE S256 code challenge.
///
/// Recomputes the challenge from the verifier and compares it to the
/// stored challenge in constant time.
#[must_use]
pub fn verify_s256(code_verifier: &str, code_challenge: &str) -> bool {
    let computed = challenge_s256(code_verifier);
    computed.as_bytes().ct_eq(code_challenge.as_bytes()).into()
}
