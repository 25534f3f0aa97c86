// crates/ssztree-schema/src/types.rs

//! The [`SszType`] / [`SszBasic`] traits and the basic-type impls.
//!
//! Basic types (`u8`/`u16`/`u32`/`u64`/`bool`) are their own descriptors:
//! the value *is* the Rust primitive, and the packed-slot accessors place it
//! inside a 32-byte chunk. Composite types keep the defaulted packed
//! accessors, which report `UnsupportedCompositeType`.

use serde::{de::DeserializeOwned, Serialize};
use ssztree_core::hash::{Root, BYTES_PER_CHUNK};
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::{NodeId, NodePool};

/// SSZ type kind, mirrored by the view family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Unsigned little-endian integer.
    Uint,
    /// Single byte 0/1.
    Bool,
    /// Fixed-length collection.
    Vector,
    /// Variable-length, limit-bounded collection.
    List,
    /// Heterogeneous fixed field set.
    Container,
    /// Fixed-length bit collection.
    Bitvector,
    /// Variable-length bit collection.
    Bitlist,
}

/// An SSZ type descriptor. The implementing type is the value itself.
pub trait SszType:
    Sized + Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned
{
    /// Type kind.
    const KIND: Kind;
    /// `Some(n)` when every value of this type serializes to exactly `n`
    /// bytes.
    const FIXED_SIZE: Option<usize>;
    /// Smallest possible serialization.
    const MIN_SIZE: usize;
    /// Largest possible serialization.
    const MAX_SIZE: usize;
    /// Depth of the value subtree. For lists this is the depth of the
    /// element subtree, excluding the length mix-in level.
    const CHUNK_DEPTH: u32;
    /// Number of leaf chunks (or element subtrees) the value subtree
    /// addresses at `CHUNK_DEPTH`.
    const CHUNK_COUNT: u64;

    /// Exact size of the canonical encoding of `self`.
    fn serialized_size(&self) -> usize;

    /// Write the canonical encoding into the front of `out`; returns bytes
    /// written. Fails with `InvalidSize` when `out` is too short.
    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize>;

    /// Canonical encoding as a fresh vector.
    fn serialize(&self) -> TreeResult<Vec<u8>> {
        let mut out = vec![0u8; self.serialized_size()];
        let written = self.serialize_into(&mut out)?;
        debug_assert_eq!(written, out.len());
        Ok(out)
    }

    /// Parse a value from exactly `bytes`.
    fn deserialize(bytes: &[u8]) -> TreeResult<Self>;

    /// Canonical 32-byte Merkle identity of the value.
    fn hash_tree_root(&self) -> Root;

    /* ---------------- tree lowering ---------------- */

    /// Build the pool subtree for `value`; the returned root is floating.
    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId>;

    /// Read the value back out of a pool subtree.
    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self>;

    /// Exact serialized size of the value stored under `root`.
    fn tree_serialized_size(pool: &mut NodePool, root: NodeId) -> TreeResult<usize> {
        Ok(Self::tree_to_value(pool, root)?.serialized_size())
    }

    /// Serialize the value stored under `root` into `out`; returns bytes
    /// written.
    fn tree_serialize_into(
        pool: &mut NodePool,
        root: NodeId,
        out: &mut [u8],
    ) -> TreeResult<usize> {
        Self::tree_to_value(pool, root)?.serialize_into(out)
    }

    /* ---------------- packed slots (basic types only) ---------------- */

    /// Read the value at packed `slot` of `chunk`.
    fn read_packed(chunk: &Root, slot: usize) -> TreeResult<Self> {
        let _ = (chunk, slot);
        Err(TreeError::UnsupportedCompositeType)
    }

    /// Write the value into packed `slot` of `chunk`.
    fn write_packed(&self, chunk: &mut Root, slot: usize) -> TreeResult<()> {
        let _ = (chunk, slot);
        Err(TreeError::UnsupportedCompositeType)
    }
}

/// Basic SSZ types: fixed-size values that pack into 32-byte chunks.
pub trait SszBasic: SszType + Copy + Default {
    /// Serialized size in bytes; divides 32.
    const SIZE: usize;
    /// Values per chunk.
    const ITEMS_PER_CHUNK: usize = BYTES_PER_CHUNK / Self::SIZE;

    /// Infallible packed read; `slot < ITEMS_PER_CHUNK`.
    fn from_slot(chunk: &Root, slot: usize) -> Self;
    /// Infallible packed write; `slot < ITEMS_PER_CHUNK`.
    fn to_slot(self, chunk: &mut Root, slot: usize);
}

/// Marker for types whose values own a whole subtree (everything that is
/// not a basic uint/bool).
pub trait SszComposite: SszType {}

macro_rules! impl_uint {
    ($t:ty, $size:expr) => {
        impl SszType for $t {
            const KIND: Kind = Kind::Uint;
            const FIXED_SIZE: Option<usize> = Some($size);
            const MIN_SIZE: usize = $size;
            const MAX_SIZE: usize = $size;
            const CHUNK_DEPTH: u32 = 0;
            const CHUNK_COUNT: u64 = 1;

            fn serialized_size(&self) -> usize {
                $size
            }

            fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
                if out.len() < $size {
                    return Err(TreeError::InvalidSize);
                }
                out[..$size].copy_from_slice(&self.to_le_bytes());
                Ok($size)
            }

            fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
                if bytes.len() != $size {
                    return Err(TreeError::InvalidSize);
                }
                let mut le = [0u8; $size];
                le.copy_from_slice(bytes);
                Ok(<$t>::from_le_bytes(le))
            }

            fn hash_tree_root(&self) -> Root {
                let mut chunk = [0u8; BYTES_PER_CHUNK];
                chunk[..$size].copy_from_slice(&self.to_le_bytes());
                chunk
            }

            fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
                Ok(pool.create_leaf(value.hash_tree_root()))
            }

            fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
                let chunk = pool.get_root(root);
                Ok(Self::from_slot(&chunk, 0))
            }

            fn read_packed(chunk: &Root, slot: usize) -> TreeResult<Self> {
                if slot >= Self::ITEMS_PER_CHUNK {
                    return Err(TreeError::IndexOutOfBounds);
                }
                Ok(Self::from_slot(chunk, slot))
            }

            fn write_packed(&self, chunk: &mut Root, slot: usize) -> TreeResult<()> {
                if slot >= Self::ITEMS_PER_CHUNK {
                    return Err(TreeError::IndexOutOfBounds);
                }
                self.to_slot(chunk, slot);
                Ok(())
            }
        }

        impl SszBasic for $t {
            const SIZE: usize = $size;

            #[inline]
            fn from_slot(chunk: &Root, slot: usize) -> Self {
                let at = slot * $size;
                let mut le = [0u8; $size];
                le.copy_from_slice(&chunk[at..at + $size]);
                <$t>::from_le_bytes(le)
            }

            #[inline]
            fn to_slot(self, chunk: &mut Root, slot: usize) {
                let at = slot * $size;
                chunk[at..at + $size].copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_uint!(u8, 1);
impl_uint!(u16, 2);
impl_uint!(u32, 4);
impl_uint!(u64, 8);

impl SszType for bool {
    const KIND: Kind = Kind::Bool;
    const FIXED_SIZE: Option<usize> = Some(1);
    const MIN_SIZE: usize = 1;
    const MAX_SIZE: usize = 1;
    const CHUNK_DEPTH: u32 = 0;
    const CHUNK_COUNT: u64 = 1;

    fn serialized_size(&self) -> usize {
        1
    }

    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
        if out.is_empty() {
            return Err(TreeError::InvalidSize);
        }
        out[0] = u8::from(*self);
        Ok(1)
    }

    fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            _ => Err(TreeError::InvalidSize),
        }
    }

    fn hash_tree_root(&self) -> Root {
        let mut chunk = [0u8; BYTES_PER_CHUNK];
        chunk[0] = u8::from(*self);
        chunk
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        Ok(pool.create_leaf(value.hash_tree_root()))
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let chunk = pool.get_root(root);
        Ok(Self::from_slot(&chunk, 0))
    }

    fn read_packed(chunk: &Root, slot: usize) -> TreeResult<Self> {
        if slot >= Self::ITEMS_PER_CHUNK {
            return Err(TreeError::IndexOutOfBounds);
        }
        Ok(Self::from_slot(chunk, slot))
    }

    fn write_packed(&self, chunk: &mut Root, slot: usize) -> TreeResult<()> {
        if slot >= Self::ITEMS_PER_CHUNK {
            return Err(TreeError::IndexOutOfBounds);
        }
        self.to_slot(chunk, slot);
        Ok(())
    }
}

impl SszBasic for bool {
    const SIZE: usize = 1;

    #[inline]
    fn from_slot(chunk: &Root, slot: usize) -> Self {
        chunk[slot] != 0
    }

    #[inline]
    fn to_slot(self, chunk: &mut Root, slot: usize) {
        chunk[slot] = u8::from(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_roundtrip_and_root() {
        let v: u64 = 0xdead_beef;
        let bytes = SszType::serialize(&v).unwrap();
        assert_eq!(bytes, v.to_le_bytes());
        assert_eq!(<u64 as SszType>::deserialize(&bytes).unwrap(), v);
        let mut expect = [0u8; 32];
        expect[..8].copy_from_slice(&v.to_le_bytes());
        assert_eq!(v.hash_tree_root(), expect);
    }

    #[test]
    fn packed_slots() {
        let mut chunk = [0u8; 32];
        7u64.write_packed(&mut chunk, 3).unwrap();
        assert_eq!(u64::read_packed(&chunk, 3).unwrap(), 7);
        assert_eq!(u64::read_packed(&chunk, 0).unwrap(), 0);
        assert_eq!(
            u64::read_packed(&chunk, 4).unwrap_err(),
            TreeError::IndexOutOfBounds
        );
        // 4 u64 per chunk, 32 u8 per chunk.
        assert_eq!(<u64 as SszBasic>::ITEMS_PER_CHUNK, 4);
        assert_eq!(<u8 as SszBasic>::ITEMS_PER_CHUNK, 32);
    }

    #[test]
    fn bool_is_strict() {
        assert_eq!(bool::deserialize(&[2]).unwrap_err(), TreeError::InvalidSize);
        assert!(bool::deserialize(&[1]).unwrap());
    }

    #[test]
    fn uint_tree_lowering() {
        let mut pool = NodePool::new();
        let n = u64::tree_from_value(&mut pool, &123).unwrap();
        assert_eq!(u64::tree_to_value(&mut pool, n).unwrap(), 123);
    }
}
