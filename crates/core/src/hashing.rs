//! SHA-256 helpers for patch digests and registry ids.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let hash = Sha256::digest(data.as_ref());
    format!("{hash:x}")
}

/// The first `len` hex characters of [`sha256_hex`].
pub fn short_digest(data: impl AsRef<[u8]>, len: usize) -> String {
    let mut hex = sha256_hex(data);
    hex.truncate(len);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn short_digest_is_prefix() {
        let full = sha256_hex(b"psf/requests#42");
        assert_eq!(short_digest(b"psf/requests#42", 8), full[..8]);
    }
}
