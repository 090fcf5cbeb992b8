use sha2::{Digest, Sha256};

/// One-way transform applied to passwords before storage and comparison.
///
/// Deterministic and unsalted on purpose: login resolves credentials with a
/// single equality query on (email, password), so the stored and submitted
/// digests must match byte for byte. Identical passwords therefore collide
/// across users, and the transform is fast rather than memory-hard. Known
/// weakness, kept as-is.
pub fn digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
