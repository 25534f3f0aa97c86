// crates/ssztree-schema/src/bits.rs

//! SSZ bit collections.
//!
//! Bits pack little-endian within bytes, 256 per chunk. A bitlist carries a
//! delimiter bit on the wire (one bit past the end) and mixes its *bit*
//! length into the root; a bitvector has a fixed bit count and neither.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssztree_core::gindex::ceil_log2;
use ssztree_core::hash::{Root, BYTES_PER_CHUNK};
use ssztree_core::merkleize::{merkleize_chunks, mix_in_length, pack_bytes};
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::{NodeId, NodePool};

use crate::list::{length_from_chunk, LENGTH_GINDEX};
use crate::types::{Kind, SszComposite, SszType};
use crate::vector::leaves_from_chunks;

/// Bits per 32-byte chunk.
pub const BITS_PER_CHUNK: usize = BYTES_PER_CHUNK * 8;

/// Decompose a bit index into (chunk index, byte within chunk, bit mask).
#[inline]
#[must_use]
pub const fn bit_slot(index: usize) -> (u64, usize, u8) {
    (
        (index / BITS_PER_CHUNK) as u64,
        (index % BITS_PER_CHUNK) / 8,
        1u8 << (index % 8),
    )
}

#[inline]
fn get_bit(bytes: &[u8], index: usize) -> bool {
    bytes[index / 8] & (1 << (index % 8)) != 0
}

#[inline]
fn set_bit(bytes: &mut [u8], index: usize, value: bool) {
    if value {
        bytes[index / 8] |= 1 << (index % 8);
    } else {
        bytes[index / 8] &= !(1 << (index % 8));
    }
}

/// Reject padding bits at and above `bit_len`.
fn check_padding(bytes: &[u8], bit_len: usize) -> TreeResult<()> {
    for i in bit_len..bytes.len() * 8 {
        if get_bit(bytes, i) {
            return Err(TreeError::InvalidSize);
        }
    }
    Ok(())
}

/* -------------------- Bitvector -------------------- */

/// `Bitvector[N]`: exactly `N` bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitvector<const N: usize> {
    bytes: Vec<u8>,
}

impl<const N: usize> Bitvector<N> {
    /// All-false bitvector.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: vec![0u8; N.div_ceil(8)] }
    }

    /// Build from a bool slice of exactly `N` entries.
    pub fn from_bools(bits: &[bool]) -> TreeResult<Self> {
        if bits.len() != N {
            return Err(TreeError::InvalidSize);
        }
        let mut v = Self::new();
        for (i, &b) in bits.iter().enumerate() {
            set_bit(&mut v.bytes, i, b);
        }
        Ok(v)
    }

    /// Bit at `index`.
    pub fn get(&self, index: usize) -> TreeResult<bool> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        Ok(get_bit(&self.bytes, index))
    }

    /// Set the bit at `index`.
    pub fn set(&mut self, index: usize, value: bool) -> TreeResult<()> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        set_bit(&mut self.bytes, index, value);
        Ok(())
    }

    /// All bits in order.
    #[must_use]
    pub fn to_bools(&self) -> Vec<bool> {
        (0..N).map(|i| get_bit(&self.bytes, i)).collect()
    }

    /// Raw little-endian packed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> Default for Bitvector<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Serialize for Bitvector<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bytes.serialize(serializer)
    }
}

impl<'de, const N: usize> Deserialize<'de> for Bitvector<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        <Self as SszType>::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

impl<const N: usize> SszType for Bitvector<N> {
    const KIND: Kind = Kind::Bitvector;
    const FIXED_SIZE: Option<usize> = Some((N + 7) / 8);
    const MIN_SIZE: usize = (N + 7) / 8;
    const MAX_SIZE: usize = (N + 7) / 8;
    const CHUNK_COUNT: u64 = ((N + BITS_PER_CHUNK - 1) / BITS_PER_CHUNK) as u64;
    const CHUNK_DEPTH: u32 = ceil_log2(Self::CHUNK_COUNT);

    fn serialized_size(&self) -> usize {
        self.bytes.len()
    }

    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
        if out.len() < self.bytes.len() {
            return Err(TreeError::InvalidSize);
        }
        out[..self.bytes.len()].copy_from_slice(&self.bytes);
        Ok(self.bytes.len())
    }

    fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
        if bytes.len() != N.div_ceil(8) {
            return Err(TreeError::InvalidSize);
        }
        check_padding(bytes, N)?;
        Ok(Self { bytes: bytes.to_vec() })
    }

    fn hash_tree_root(&self) -> Root {
        merkleize_chunks(&pack_bytes(&self.bytes), Self::CHUNK_DEPTH)
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        let leaves = leaves_from_chunks(pool, pack_bytes(&value.bytes));
        pool.fill_with_contents(&leaves, Self::CHUNK_DEPTH)
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let bytes = bytes_from_tree(pool, root, Self::CHUNK_DEPTH, N.div_ceil(8))?;
        check_padding(&bytes, N)?;
        Ok(Self { bytes })
    }
}

impl<const N: usize> SszComposite for Bitvector<N> {}

/* -------------------- Bitlist -------------------- */

/// `Bitlist[LIMIT]`: up to `LIMIT` bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitlist<const LIMIT: usize> {
    bytes: Vec<u8>,
    len: usize,
}

impl<const LIMIT: usize> Bitlist<LIMIT> {
    /// Empty bitlist.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: Vec::new(), len: 0 }
    }

    /// Build from a bool slice of at most `LIMIT` entries.
    pub fn from_bools(bits: &[bool]) -> TreeResult<Self> {
        if bits.len() > LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        let mut v = Self { bytes: vec![0u8; bits.len().div_ceil(8)], len: bits.len() };
        for (i, &b) in bits.iter().enumerate() {
            set_bit(&mut v.bytes, i, b);
        }
        Ok(v)
    }

    /// Current bit count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the bitlist holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index`.
    pub fn get(&self, index: usize) -> TreeResult<bool> {
        if index >= self.len {
            return Err(TreeError::IndexOutOfBounds);
        }
        Ok(get_bit(&self.bytes, index))
    }

    /// Set the bit at `index`.
    pub fn set(&mut self, index: usize, value: bool) -> TreeResult<()> {
        if index >= self.len {
            return Err(TreeError::IndexOutOfBounds);
        }
        set_bit(&mut self.bytes, index, value);
        Ok(())
    }

    /// Append a bit, failing at the schema limit.
    pub fn push(&mut self, value: bool) -> TreeResult<()> {
        if self.len >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        let at = self.len;
        self.len += 1;
        set_bit(&mut self.bytes, at, value);
        Ok(())
    }

    /// All bits in order.
    #[must_use]
    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len).map(|i| get_bit(&self.bytes, i)).collect()
    }
}

impl<const LIMIT: usize> Default for Bitlist<LIMIT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LIMIT: usize> Serialize for Bitlist<LIMIT> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Wire form (with delimiter) keeps the length unambiguous.
        let bytes = SszType::serialize(self).map_err(serde::ser::Error::custom)?;
        bytes.serialize(serializer)
    }
}

impl<'de, const LIMIT: usize> Deserialize<'de> for Bitlist<LIMIT> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        <Self as SszType>::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

impl<const LIMIT: usize> SszType for Bitlist<LIMIT> {
    const KIND: Kind = Kind::Bitlist;
    const FIXED_SIZE: Option<usize> = None;
    const MIN_SIZE: usize = 1;
    const MAX_SIZE: usize = LIMIT / 8 + 1;
    const CHUNK_COUNT: u64 = ((LIMIT + BITS_PER_CHUNK - 1) / BITS_PER_CHUNK) as u64;
    const CHUNK_DEPTH: u32 = ceil_log2(Self::CHUNK_COUNT);

    fn serialized_size(&self) -> usize {
        self.len / 8 + 1
    }

    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
        let total = self.serialized_size();
        if out.len() < total {
            return Err(TreeError::InvalidSize);
        }
        out[..total].fill(0);
        out[..self.bytes.len()].copy_from_slice(&self.bytes);
        set_bit(&mut out[..total], self.len, true);
        Ok(total)
    }

    fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
        let Some(&last) = bytes.last() else {
            return Err(TreeError::InvalidSize);
        };
        if last == 0 {
            // The delimiter bit must live in the final byte.
            return Err(TreeError::InvalidSize);
        }
        let high = 7 - last.leading_zeros() as usize;
        let len = (bytes.len() - 1) * 8 + high;
        if len > LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        let mut data = bytes[..len.div_ceil(8)].to_vec();
        if len % 8 != 0 {
            // Strip the delimiter when it shares the last data byte.
            set_bit(&mut data, len, false);
        }
        check_padding(&data, len)?;
        Ok(Self { bytes: data, len })
    }

    fn hash_tree_root(&self) -> Root {
        mix_in_length(
            &merkleize_chunks(&pack_bytes(&self.bytes), Self::CHUNK_DEPTH),
            self.len as u64,
        )
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        let leaves = leaves_from_chunks(pool, pack_bytes(&value.bytes));
        let subtree = pool.fill_with_contents(&leaves, Self::CHUNK_DEPTH)?;
        let length = pool.create_leaf_from_uint(value.len as u64);
        Ok(pool.create_branch(subtree, length))
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let length_chunk = {
            let node = pool.get_node(root, LENGTH_GINDEX)?;
            pool.get_root(node)
        };
        let len = length_from_chunk(&length_chunk) as usize;
        if len > LIMIT {
            return Err(TreeError::InvalidSize);
        }
        let subtree = pool.get_node(root, 2)?;
        let bytes = bytes_from_tree(pool, subtree, Self::CHUNK_DEPTH, len.div_ceil(8))?;
        check_padding(&bytes, len)?;
        Ok(Self { bytes, len })
    }
}

impl<const LIMIT: usize> SszComposite for Bitlist<LIMIT> {}

/// Read `n_bytes` packed bytes from the chunk layer of `subtree`.
fn bytes_from_tree(
    pool: &mut NodePool,
    subtree: NodeId,
    depth: u32,
    n_bytes: usize,
) -> TreeResult<Vec<u8>> {
    let n_chunks = n_bytes.div_ceil(BYTES_PER_CHUNK);
    let mut nodes = vec![NodeId::zero(0); n_chunks];
    pool.get_nodes_at_depth(subtree, depth, 0, &mut nodes)?;
    let mut bytes = Vec::with_capacity(n_bytes);
    for (c, node) in nodes.iter().enumerate() {
        let chunk = pool.get_root(*node);
        let take = (n_bytes - c * BYTES_PER_CHUNK).min(BYTES_PER_CHUNK);
        bytes.extend_from_slice(&chunk[..take]);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitvector_roundtrip() {
        let v = Bitvector::<10>::from_bools(&[
            true, false, true, false, false, false, false, false, true, true,
        ])
        .unwrap();
        let bytes = SszType::serialize(&v).unwrap();
        assert_eq!(bytes, vec![0b0000_0101, 0b0000_0011]);
        assert_eq!(<Bitvector<10> as SszType>::deserialize(&bytes).unwrap(), v);
    }

    #[test]
    fn bitvector_rejects_padding() {
        // Bit 10 set in a Bitvector[10].
        assert_eq!(
            <Bitvector<10> as SszType>::deserialize(&[0, 0b0000_0100]).unwrap_err(),
            TreeError::InvalidSize
        );
    }

    #[test]
    fn bitlist_delimiter() {
        let l = Bitlist::<16>::from_bools(&[true, true, false]).unwrap();
        // Bits 0,1 set, delimiter at bit 3 → 0b1011.
        assert_eq!(SszType::serialize(&l).unwrap(), vec![0b0000_1011]);
        assert_eq!(
            <Bitlist<16> as SszType>::deserialize(&[0b0000_1011]).unwrap(),
            l
        );

        // Empty bitlist is the lone delimiter byte.
        let empty = Bitlist::<16>::new();
        assert_eq!(SszType::serialize(&empty).unwrap(), vec![1]);
        assert_eq!(<Bitlist<16> as SszType>::deserialize(&[1]).unwrap(), empty);
    }

    #[test]
    fn bitlist_byte_aligned_lengths() {
        let l = Bitlist::<16>::from_bools(&[true; 8]).unwrap();
        assert_eq!(SszType::serialize(&l).unwrap(), vec![0xff, 0x01]);
        let back = <Bitlist<16> as SszType>::deserialize(&[0xff, 0x01]).unwrap();
        assert_eq!(back.len(), 8);
        assert_eq!(back, l);
    }

    #[test]
    fn bitlist_push_and_limit() {
        let mut l = Bitlist::<2>::new();
        l.push(true).unwrap();
        l.push(false).unwrap();
        assert_eq!(l.push(true).unwrap_err(), TreeError::LengthOverLimit);
        assert_eq!(l.to_bools(), vec![true, false]);
    }

    #[test]
    fn tree_roundtrip_matches_value_root() {
        let mut pool = NodePool::new();
        let l = Bitlist::<300>::from_bools(&vec![true; 280]).unwrap();
        let node = Bitlist::<300>::tree_from_value(&mut pool, &l).unwrap();
        assert_eq!(pool.get_root(node), l.hash_tree_root());
        assert_eq!(Bitlist::<300>::tree_to_value(&mut pool, node).unwrap(), l);
    }
}
