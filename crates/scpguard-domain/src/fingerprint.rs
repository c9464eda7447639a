use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a finding.
///
/// Identity fields:
/// - check_id
/// - code
/// - document path (empty for set-level findings)
/// - subject
pub fn fingerprint_for(check_id: &str, code: &str, path: Option<&str>, subject: &str) -> String {
    let canonical = [check_id, code, path.unwrap_or(""), subject].join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
