// crates/ssztree-core/src/hash.rs

//! SHA-256 chunk hashing and the zero-subtree hash lineage.
//!
//! SSZ fixes the Merkle hash to SHA-256 over the concatenation of the two
//! child roots. `ZERO_HASHES[d]` is the root of a fully zero subtree of
//! depth `d`; lists and vectors below their length share this lineage
//! instead of materializing all-zero subtrees.

use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Size of one Merkle chunk / leaf payload.
pub const BYTES_PER_CHUNK: usize = 32;

/// Deepest subtree the zero lineage covers. Beacon-state gindices stay
/// well below this (validator registry depth 40 plus the state wrapper).
pub const MAX_TREE_DEPTH: usize = 64;

/// A 32-byte Merkle root.
pub type Root = [u8; BYTES_PER_CHUNK];

/// `SHA256(a ‖ b)`.
#[inline]
#[must_use]
pub fn hash_concat(a: &Root, b: &Root) -> Root {
    let mut h = Sha256::new();
    h.update(a);
    h.update(b);
    h.finalize().into()
}

static ZERO_HASHES: OnceLock<[Root; MAX_TREE_DEPTH + 1]> = OnceLock::new();

/// Root of the all-zero subtree of `depth`.
#[inline]
#[must_use]
pub fn zero_hash(depth: u32) -> &'static Root {
    let table = ZERO_HASHES.get_or_init(|| {
        let mut t = [[0u8; BYTES_PER_CHUNK]; MAX_TREE_DEPTH + 1];
        for d in 1..=MAX_TREE_DEPTH {
            t[d] = hash_concat(&t[d - 1], &t[d - 1]);
        }
        t
    });
    &table[depth as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_lineage_is_consistent() {
        assert_eq!(zero_hash(0), &[0u8; 32]);
        for d in 1..=8u32 {
            assert_eq!(
                zero_hash(d),
                &hash_concat(zero_hash(d - 1), zero_hash(d - 1))
            );
        }
    }

    #[test]
    fn sha256_vector() {
        // SHA256 of 64 zero bytes, the depth-1 zero hash.
        assert_eq!(
            hex::encode(zero_hash(1)),
            "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"
        );
    }
}
