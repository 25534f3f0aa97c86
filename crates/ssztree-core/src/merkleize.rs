// crates/ssztree-core/src/merkleize.rs

//! Value-level merkleization helpers.
//!
//! - `pack_bytes`: break a serialized byte string into zero-padded chunks.
//! - `merkleize_chunks`: fold chunks into the root of a subtree of a given
//!   depth, padding with the zero lineage instead of materializing zeros.
//! - `mix_in_length`: the list length mix-in `H(root ‖ le64(len) ‖ 0…)`.

use crate::hash::{hash_concat, zero_hash, Root, BYTES_PER_CHUNK};

/// Break `bytes` into 32-byte chunks, zero-padding the final partial chunk.
#[must_use]
pub fn pack_bytes(bytes: &[u8]) -> Vec<Root> {
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(BYTES_PER_CHUNK));
    for piece in bytes.chunks(BYTES_PER_CHUNK) {
        let mut chunk = [0u8; BYTES_PER_CHUNK];
        chunk[..piece.len()].copy_from_slice(piece);
        chunks.push(chunk);
    }
    chunks
}

/// Merkleize `chunks` as the leaves of a subtree of `depth`, padding the
/// tail of every level with the zero lineage.
///
/// `chunks.len()` must not exceed `2^depth`.
#[must_use]
pub fn merkleize_chunks(chunks: &[Root], depth: u32) -> Root {
    debug_assert!(depth as usize <= crate::hash::MAX_TREE_DEPTH);
    debug_assert!(chunks.len() as u64 <= max_leaves(depth));

    if chunks.is_empty() {
        return *zero_hash(depth);
    }
    let mut level: Vec<Root> = chunks.to_vec();
    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let right = pair.get(1).unwrap_or_else(|| zero_hash(d));
            next.push(hash_concat(&pair[0], right));
        }
        level = next;
    }
    level[0]
}

/// Mix a list length into a subtree root: `H(root ‖ le64(len) ‖ zeros)`.
#[inline]
#[must_use]
pub fn mix_in_length(root: &Root, length: u64) -> Root {
    let mut len_chunk = [0u8; BYTES_PER_CHUNK];
    len_chunk[..8].copy_from_slice(&length.to_le_bytes());
    hash_concat(root, &len_chunk)
}

#[inline]
const fn max_leaves(depth: u32) -> u64 {
    if depth >= 64 {
        u64::MAX
    } else {
        1u64 << depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_pads_the_tail() {
        let chunks = pack_bytes(&[1u8; 33]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], [1u8; 32]);
        let mut tail = [0u8; 32];
        tail[0] = 1;
        assert_eq!(chunks[1], tail);
    }

    #[test]
    fn empty_equals_zero_lineage() {
        for d in 0..6u32 {
            assert_eq!(merkleize_chunks(&[], d), *zero_hash(d));
        }
    }

    #[test]
    fn single_chunk_identity_at_depth_zero() {
        let c = [7u8; 32];
        assert_eq!(merkleize_chunks(&[c], 0), c);
    }

    #[test]
    fn two_levels_with_padding() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        let left = hash_concat(&a, &b);
        let right = hash_concat(&c, zero_hash(0));
        assert_eq!(merkleize_chunks(&[a, b, c], 2), hash_concat(&left, &right));
    }

    #[test]
    fn empty_list_root_vector() {
        // List[uint8, 128]: 4 chunks → depth 2, mixed with length 0.
        let root = mix_in_length(&merkleize_chunks(&[], 2), 0);
        assert_eq!(
            hex::encode(root),
            "28ba1834a3a7b657460ce79fa3a1d909ab8828fd557659d4d0554a9bdbc0ec30"
        );
    }
}
