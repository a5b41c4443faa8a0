//! Revocation list aggregation
//!
//! The revocation store is a flat directory written only by operators:
//! dropping a file containing public key or certificate lines into it
//! revokes those keys. The service's read path flattens every file into
//! one listing, keeps only lines that look like key material, and orders
//! them by reversed domain labels so entries group by top-level domain
//! first.

use std::path::PathBuf;

use tokio::fs;

use crate::error::Result;

/// Read path over the operator-managed revocation directory.
#[derive(Debug, Clone)]
pub struct RevocationStore {
    dir: PathBuf,
}

impl RevocationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Aggregate every revoked key/certificate line in the store.
    ///
    /// Scans the directory non-recursively in filename order, keeps lines
    /// matching the key/certificate pattern, sorts them by reversed
    /// domain labels of the trailing `@domain` comment (entries without
    /// one sort with an empty key), and joins with newlines.
    pub async fn list(&self) -> Result<String> {
        let mut entries = Vec::new();
        let mut reader = fs::read_dir(&self.dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            if entry.file_type().await?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();

        let mut revoked = Vec::new();
        for path in entries {
            let contents = fs::read_to_string(&path).await?;
            revoked.extend(
                contents
                    .lines()
                    .filter(|line| is_revocation_line(line))
                    .map(str::to_string),
            );
        }

        revoked.sort_by_key(|line| domain_sort_key(line));
        Ok(revoked.join("\n"))
    }
}

/// Whether a line is a public key or certificate line: an `ssh-` prefixed
/// algorithm token, a base64 body, and an optional trailing comment.
fn is_revocation_line(line: &str) -> bool {
    let mut tokens = line.split(' ');

    let algorithm = match tokens.next() {
        Some(t) => t,
        None => return false,
    };
    let rest = match algorithm.strip_prefix("ssh-") {
        Some(r) => r,
        None => return false,
    };
    if rest.is_empty() || !rest.bytes().all(is_algorithm_byte) {
        return false;
    }

    let body = match tokens.next() {
        Some(t) => t,
        None => return false,
    };
    if body.is_empty() || !body.bytes().all(is_base64_byte) {
        return false;
    }

    match tokens.next() {
        None => true,
        Some(comment) => {
            !comment.is_empty()
                && comment.bytes().all(is_algorithm_byte)
                && tokens.next().is_none()
        }
    }
}

/// Sort key: the reversed, dot-split labels of the domain in the trailing
/// `identity@domain` comment, so `user@a.example.com` keys as
/// `com.example.a`. Lines without a trailing domain key as empty.
fn domain_sort_key(line: &str) -> String {
    let last = match line.split(' ').next_back() {
        Some(t) => t,
        None => return String::new(),
    };
    let domain = match last.split_once('@') {
        // Any further '@'s belong to the domain part, joined as labels.
        Some((_, domain)) => domain.replace('@', "."),
        None => return String::new(),
    };
    domain.split('.').rev().collect::<Vec<_>>().join(".")
}

fn is_algorithm_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'@')
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_line_with_comment_matches() {
        assert!(is_revocation_line("ssh-ed25519 AAAAC3NzaC1lZDI1 user@a.example.com"));
    }

    #[test]
    fn test_certificate_line_matches() {
        assert!(is_revocation_line(
            "ssh-ed25519-cert-v01@openssh.com AAAAIHNvbWVjZXJ0 root@db.example.org"
        ));
    }

    #[test]
    fn test_comment_is_optional() {
        assert!(is_revocation_line("ssh-ed25519 AAAAC3NzaC1lZDI1"));
    }

    #[test]
    fn test_non_key_lines_rejected() {
        assert!(!is_revocation_line(""));
        assert!(!is_revocation_line("# revoked 2026-01-10 by ops"));
        assert!(!is_revocation_line("ecdsa-sha2-nistp256 AAAA user@host"));
        assert!(!is_revocation_line("ssh-ed25519"));
        assert!(!is_revocation_line("ssh-ed25519 not_base64! user@host"));
        assert!(!is_revocation_line("ssh-ed25519 AAAA user@host trailing junk"));
        assert!(!is_revocation_line("ssh-ed25519  AAAA"));
    }

    #[test]
    fn test_domain_sort_key_reverses_labels() {
        assert_eq!(
            domain_sort_key("ssh-ed25519 AAAA user@a.example.com"),
            "com.example.a"
        );
        assert_eq!(domain_sort_key("ssh-ed25519 AAAA"), "");
        assert_eq!(domain_sort_key("ssh-ed25519 AAAA nodomain"), "");
    }

    #[tokio::test]
    async fn test_listing_aggregates_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("batch-1"),
            "ssh-ed25519 AAAAfirst user@b.example.com\n# operator note\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("batch-2"),
            "ssh-ed25519 AAAAsecond user@a.example.com\nnot a key line\n",
        )
        .unwrap();

        let store = RevocationStore::new(dir.path());
        let listing = store.list().await.unwrap();

        assert_eq!(
            listing,
            "ssh-ed25519 AAAAsecond user@a.example.com\nssh-ed25519 AAAAfirst user@b.example.com"
        );
    }

    #[tokio::test]
    async fn test_listing_groups_by_top_level_domain_first() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("mixed"),
            "ssh-ed25519 AAAA user@zzz.aa\nssh-ed25519 BBBB user@aaa.zz\n",
        )
        .unwrap();

        let store = RevocationStore::new(dir.path());
        let listing = store.list().await.unwrap();

        // Reversed labels: "aa.zzz" sorts before "zz.aaa".
        assert_eq!(
            listing,
            "ssh-ed25519 AAAA user@zzz.aa\nssh-ed25519 BBBB user@aaa.zz"
        );
    }

    #[tokio::test]
    async fn test_commentless_lines_sort_first() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("keys"),
            "ssh-ed25519 BBBB user@example.com\nssh-ed25519 AAAA\n",
        )
        .unwrap();

        let store = RevocationStore::new(dir.path());
        let listing = store.list().await.unwrap();

        assert_eq!(listing, "ssh-ed25519 AAAA\nssh-ed25519 BBBB user@example.com");
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = RevocationStore::new(dir.path());
        assert_eq!(store.list().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_subdirectories_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        std::fs::write(dir.path().join("keys"), "ssh-ed25519 AAAA user@x.example.com\n").unwrap();

        let store = RevocationStore::new(dir.path());
        assert_eq!(store.list().await.unwrap(), "ssh-ed25519 AAAA user@x.example.com");
    }
}
