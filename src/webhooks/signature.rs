//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs webhook payloads using HMAC-SHA256 with a shared secret.
//! The signature is provided in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//!
//! Verification is the first step in webhook processing: it runs over the
//! exact raw request bytes, before any parsing, and fails closed on any
//! missing input.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The only algorithm prefix we accept on the signature header.
const ALGORITHM: &str = "sha256";

/// Parses a GitHub signature header (e.g., "sha256=abc123...") into raw bytes.
///
/// The algorithm prefix is stripped if present; a bare hex digest is also
/// accepted. Returns `None` for a foreign algorithm, invalid hex, or an empty
/// digest. Never panics.
///
/// # Examples
///
/// ```
/// use issue_autopatch::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=abcd1234"), Some(vec![0xab, 0xcd, 0x12, 0x34]));
/// assert_eq!(parse_signature_header("abcd1234"), Some(vec![0xab, 0xcd, 0x12, 0x34]));
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = match header.trim().split_once('=') {
        Some((algorithm, digest)) if algorithm.eq_ignore_ascii_case(ALGORITHM) => digest,
        Some(_) => return None,
        None => header.trim(),
    };

    if hex_sig.is_empty() {
        return None;
    }

    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 signature of a payload using the given secret.
///
/// This is useful for testing purposes (generating expected signatures).
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value.
///
/// Returns a string in the format "sha256=<hex>".
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{}={}", ALGORITHM, hex::encode(signature))
}

/// Verifies a GitHub webhook signature against the payload and secret.
///
/// Returns `true` only if the signature is valid. A missing header or an
/// empty secret is treated as invalid. The digest comparison is constant-time
/// (delegated to `Mac::verify_slice`), so it never short-circuits on the first
/// mismatched byte.
///
/// # Examples
///
/// ```
/// use issue_autopatch::webhooks::{verify_signature, compute_signature, format_signature_header};
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
///
/// let header = format_signature_header(&compute_signature(payload, secret));
///
/// assert!(verify_signature(payload, Some(&header), secret));
/// assert!(!verify_signature(payload, Some(&header), b"wrong-secret"));
/// assert!(!verify_signature(payload, None, secret));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: Option<&str>, secret: &[u8]) -> bool {
    let Some(signature_header) = signature_header else {
        return false;
    };
    if secret.is_empty() {
        return false;
    }

    let expected_signature = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    mac.verify_slice(&expected_signature).is_ok()
}
