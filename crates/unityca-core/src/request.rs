//! Rotation request parsing and validation
//!
//! A rotation request proves continuity of a host identity: the body
//! carries a signed section (hostnames, timestamp, new key, old key) and
//! an unsigned section with one signature per key over the signed section.
//! A `RotationRequest` is only ever constructed once every structural
//! check has passed and both signatures have verified — downstream logic
//! never sees a partially validated request.
//!
//! The signed timestamp is part of the signer identity but is not checked
//! against current time; the protocol does not enforce a replay window.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::codec::reconstitute_signature;
use crate::error::{KeySlot, Result, RotationError};
use crate::verify::SignatureVerifier;

/// The single supported key algorithm. Supporting multiple key types has
/// security implications for the continuity check; resolve those before
/// relaxing this.
pub const SUPPORTED_ALGORITHM: &str = "ed25519";

/// A fully validated key rotation request.
#[derive(Debug, Clone)]
pub struct RotationRequest {
    hostnames: Vec<String>,
    timestamp: DateTime<Utc>,
    identity: String,
    new_pubkey: String,
    old_pubkey: String,
    new_pubkey_sig: String,
    old_pubkey_sig: String,
    new_type: String,
    old_type: String,
}

impl RotationRequest {
    /// Parse and authenticate a raw request body.
    ///
    /// Performs, in order: structural validation of both sections,
    /// algorithm validation, then verification of the new-key and old-key
    /// signatures over the signed section (short-circuiting on the first
    /// failure). The full hostname list is passed as the allowed namespace
    /// set so a signature scoped to a narrower alias set is rejected.
    pub async fn parse(body: &str, verifier: &dyn SignatureVerifier) -> Result<Self> {
        let (signed, unsigned) = split_sections(body)
            .ok_or_else(|| RotationError::MalformedRequest("need signed and unsigned section".into()))?;

        let request = Self::parse_sections(signed, unsigned)?;

        // The signed content is the section text plus a trailing newline;
        // the signers produced their signatures over exactly these bytes.
        let message = format!("{}\n", signed);

        if !verifier
            .verify(
                &message,
                &request.new_pubkey_sig,
                &request.new_pubkey,
                &request.identity,
                &request.hostnames,
            )
            .await?
        {
            return Err(RotationError::InvalidSignature(KeySlot::New));
        }

        if !verifier
            .verify(
                &message,
                &request.old_pubkey_sig,
                &request.old_pubkey,
                &request.identity,
                &request.hostnames,
            )
            .await?
        {
            return Err(RotationError::InvalidSignature(KeySlot::Old));
        }

        debug!(
            hostname = %request.hostname(),
            aliases = request.hostnames.len() - 1,
            "authenticated rotation request"
        );

        Ok(request)
    }

    /// Structural validation of the two sections. Only reachable through
    /// [`RotationRequest::parse`], which keeps the atomic-construction
    /// invariant: no request value escapes before authentication.
    fn parse_sections(signed: &str, unsigned: &str) -> Result<Self> {
        let signed_lines: Vec<&str> = signed.lines().collect();
        let unsigned_lines: Vec<&str> = unsigned.lines().collect();

        if signed_lines.len() < 4 {
            return Err(RotationError::MalformedRequest(
                "expect >= 4 lines in signed section".into(),
            ));
        }
        if unsigned_lines.len() < 2 {
            return Err(RotationError::MalformedRequest(
                "expect >= 2 lines in unsigned section".into(),
            ));
        }

        let hostnames = parse_hostnames(signed_lines[0])?;

        let timestamp_field = signed_lines[1];
        if timestamp_field.is_empty() || !timestamp_field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RotationError::MalformedRequest(
                "expect valid millisecond timestamp in second line of signed section".into(),
            ));
        }
        let millis: i64 = timestamp_field.parse().map_err(|_| {
            RotationError::MalformedRequest(
                "expect valid millisecond timestamp in second line of signed section".into(),
            )
        })?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            RotationError::MalformedRequest("timestamp out of representable range".into())
        })?;

        let new_pubkey = signed_lines[2].to_string();
        let old_pubkey = signed_lines[3].to_string();

        let new_type = key_algorithm(&new_pubkey)?;
        let old_type = key_algorithm(&old_pubkey)?;
        if new_type != old_type {
            return Err(RotationError::UnsupportedAlgorithm(format!(
                "{}/{}",
                new_type, old_type
            )));
        }
        if new_type != SUPPORTED_ALGORITHM {
            return Err(RotationError::UnsupportedAlgorithm(new_type));
        }

        let identity = format!("unityca-{}@{}", timestamp_field, hostnames[0]);

        Ok(Self {
            identity,
            timestamp,
            hostnames,
            new_pubkey,
            old_pubkey,
            new_pubkey_sig: reconstitute_signature(unsigned_lines[0]),
            old_pubkey_sig: reconstitute_signature(unsigned_lines[1]),
            new_type,
            old_type,
        })
    }

    /// The canonical hostname (first entry of the hostname list).
    pub fn hostname(&self) -> &str {
        &self.hostnames[0]
    }

    /// Every hostname the certificate will cover, canonical first.
    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    /// Non-canonical hostnames that receive mirrored key/cert files.
    pub fn aliases(&self) -> &[String] {
        &self.hostnames[1..]
    }

    /// Signer identity string, derived from timestamp and canonical
    /// hostname; used as the certificate key ID and the verification
    /// identity for both signatures.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn new_pubkey(&self) -> &str {
        &self.new_pubkey
    }

    pub fn old_pubkey(&self) -> &str {
        &self.old_pubkey
    }

    /// Algorithm token of the replacement key (always the supported one
    /// once validated; both keys carry the same token).
    pub fn key_type(&self) -> &str {
        &self.new_type
    }

    pub fn old_key_type(&self) -> &str {
        &self.old_type
    }

    /// Comma-joined hostname list, as passed to the signer as the
    /// certificate principals.
    pub fn principals(&self) -> String {
        self.hostnames.join(",")
    }
}

/// Split the body into the signed and unsigned sections at the first blank
/// line. Anything after a second blank line belongs to the unsigned
/// section's tail and is ignored by line indexing.
fn split_sections(body: &str) -> Option<(&str, &str)> {
    let mut parts = body.splitn(2, "\n\n");
    let signed = parts.next()?;
    let unsigned = parts.next()?;
    if signed.is_empty() || unsigned.trim().is_empty() {
        return None;
    }
    Some((signed, unsigned))
}

/// Validate and split the hostname line: lower-cased, charset
/// `[a-z0-9,.-]`, no empty comma segments.
fn parse_hostnames(line: &str) -> Result<Vec<String>> {
    let lowered = line.to_lowercase();
    let valid = !lowered.is_empty()
        && lowered
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b',' | b'.' | b'-'));
    if !valid {
        return Err(RotationError::MalformedRequest(
            "expect valid hostname in first line of signed section".into(),
        ));
    }

    let hostnames: Vec<String> = lowered.split(',').map(str::to_string).collect();
    if hostnames.iter().any(|h| h.is_empty()) {
        return Err(RotationError::MalformedRequest(
            "expect valid hostname in first line of signed section".into(),
        ));
    }
    Ok(hostnames)
}

/// Extract the algorithm token from a public key line: the second
/// dash-segment of the first whitespace token (`ssh-ed25519` → `ed25519`).
fn key_algorithm(pubkey: &str) -> Result<String> {
    pubkey
        .split_whitespace()
        .next()
        .and_then(|prefix| prefix.split('-').nth(1))
        .map(str::to_string)
        .ok_or_else(|| RotationError::MalformedRequest("expect algorithm-prefixed public key".into()))
}
