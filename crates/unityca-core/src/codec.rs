//! Armored SSH signature reconstitution
//!
//! Rotation requests carry each signature as a single unbroken base64 line.
//! `ssh-keygen -Y verify` only accepts the armored form, and it is
//! line-sensitive: the body must be wrapped at exactly 70 columns between
//! the literal BEGIN/END framing lines. The re-wrap must be bit-exact or
//! verification fails.

const HEADER: &str = "-----BEGIN SSH SIGNATURE-----";
const FOOTER: &str = "-----END SSH SIGNATURE-----";
const LINE_WIDTH: usize = 70;

/// Rebuild an armored signature blob from its compact one-line encoding.
///
/// The compact body is wrapped at 70 characters (last line may be shorter)
/// and framed with the BEGIN/END lines. The output ends with a newline
/// after the footer. Empty input produces header + footer with no body
/// lines.
pub fn reconstitute_signature(compact: &str) -> String {
    let body = compact.trim_end_matches(['\r', '\n']);

    let mut armored = String::with_capacity(body.len() + HEADER.len() + FOOTER.len() + 16);
    armored.push_str(HEADER);
    armored.push('\n');

    let bytes = body.as_bytes();
    for chunk in bytes.chunks(LINE_WIDTH) {
        // The compact encoding is plain base64, so chunking on bytes never
        // splits a character.
        armored.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        armored.push('\n');
    }

    armored.push_str(FOOTER);
    armored.push('\n');
    armored
}
