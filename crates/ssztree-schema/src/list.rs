// crates/ssztree-schema/src/list.rs

//! Variable-length SSZ lists.
//!
//! The tree of a list is a branch: the left subtree (of `CHUNK_DEPTH`)
//! holds the elements, the right child is a leaf whose first 8 bytes are
//! the little-endian `u64` length. The length therefore lives at gindex 3
//! and is mixed into the root, never into the wire encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssztree_core::gindex::ceil_log2;
use ssztree_core::hash::{Root, BYTES_PER_CHUNK};
use ssztree_core::merkleize::{merkleize_chunks, mix_in_length};
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::{NodeId, NodePool};

use crate::types::{Kind, SszBasic, SszComposite, SszType};
use crate::vector::{
    basic_values_from_tree, chunks_from_basic, deserialize_elements, leaves_from_chunks,
    serialize_elements,
};

/// Gindex of the length leaf relative to a list root.
pub const LENGTH_GINDEX: u64 = 3;

/// Read a list length out of its length leaf payload.
#[inline]
#[must_use]
pub fn length_from_chunk(chunk: &Root) -> u64 {
    let mut le = [0u8; 8];
    le.copy_from_slice(&chunk[..8]);
    u64::from_le_bytes(le)
}

/* -------------------- BasicList -------------------- */

/// `List[T, LIMIT]` for basic `T`, packed into chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicList<T: SszBasic, const LIMIT: usize> {
    data: Vec<T>,
}

impl<T: SszBasic, const LIMIT: usize> BasicList<T, LIMIT> {
    /// Wrap `data`; its length must not exceed `LIMIT`.
    pub fn from_elements(data: Vec<T>) -> TreeResult<Self> {
        if data.len() > LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        Ok(Self { data })
    }

    /// Current element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> TreeResult<T> {
        self.data
            .get(index)
            .copied()
            .ok_or(TreeError::IndexOutOfBounds)
    }

    /// Append `value`, failing at the schema limit.
    pub fn push(&mut self, value: T) -> TreeResult<()> {
        if self.data.len() >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        self.data.push(value);
        Ok(())
    }

    /// All elements in order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: SszBasic, const LIMIT: usize> Default for BasicList<T, LIMIT> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T: SszBasic, const LIMIT: usize> Serialize for BasicList<T, LIMIT> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de, T: SszBasic, const LIMIT: usize> Deserialize<'de> for BasicList<T, LIMIT> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = Vec::<T>::deserialize(deserializer)?;
        Self::from_elements(data).map_err(serde::de::Error::custom)
    }
}

impl<T: SszBasic, const LIMIT: usize> SszType for BasicList<T, LIMIT> {
    const KIND: Kind = Kind::List;
    const FIXED_SIZE: Option<usize> = None;
    const MIN_SIZE: usize = 0;
    const MAX_SIZE: usize = LIMIT * T::SIZE;
    const CHUNK_COUNT: u64 =
        ((LIMIT * T::SIZE + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK) as u64;
    const CHUNK_DEPTH: u32 = ceil_log2(Self::CHUNK_COUNT);

    fn serialized_size(&self) -> usize {
        self.data.len() * T::SIZE
    }

    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
        serialize_elements(&self.data, out)
    }

    fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
        Self::from_elements(deserialize_elements(bytes)?)
    }

    fn hash_tree_root(&self) -> Root {
        let chunks = chunks_from_basic(&self.data);
        mix_in_length(
            &merkleize_chunks(&chunks, Self::CHUNK_DEPTH),
            self.data.len() as u64,
        )
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        let leaves = leaves_from_chunks(pool, chunks_from_basic(&value.data));
        let subtree = pool.fill_with_contents(&leaves, Self::CHUNK_DEPTH)?;
        let length = pool.create_leaf_from_uint(value.data.len() as u64);
        Ok(pool.create_branch(subtree, length))
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let length_chunk = {
            let node = pool.get_node(root, LENGTH_GINDEX)?;
            pool.get_root(node)
        };
        let length = length_from_chunk(&length_chunk) as usize;
        if length > LIMIT {
            return Err(TreeError::InvalidSize);
        }
        let subtree = pool.get_node(root, 2)?;
        let data = basic_values_from_tree(pool, subtree, Self::CHUNK_DEPTH, length)?;
        Self::from_elements(data)
    }
}

impl<T: SszBasic, const LIMIT: usize> SszComposite for BasicList<T, LIMIT> {}

/* -------------------- CompositeList -------------------- */

/// `List[T, LIMIT]` for composite `T`; one subtree per element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeList<T: SszComposite, const LIMIT: usize> {
    data: Vec<T>,
}

impl<T: SszComposite, const LIMIT: usize> CompositeList<T, LIMIT> {
    /// Wrap `data`; its length must not exceed `LIMIT`.
    pub fn from_elements(data: Vec<T>) -> TreeResult<Self> {
        if data.len() > LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        Ok(Self { data })
    }

    /// Current element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> TreeResult<&T> {
        self.data.get(index).ok_or(TreeError::IndexOutOfBounds)
    }

    /// Append `value`, failing at the schema limit.
    pub fn push(&mut self, value: T) -> TreeResult<()> {
        if self.data.len() >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        self.data.push(value);
        Ok(())
    }

    /// All elements in order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: SszComposite, const LIMIT: usize> Default for CompositeList<T, LIMIT> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T: SszComposite, const LIMIT: usize> Serialize for CompositeList<T, LIMIT> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de, T: SszComposite, const LIMIT: usize> Deserialize<'de> for CompositeList<T, LIMIT> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = Vec::<T>::deserialize(deserializer)?;
        Self::from_elements(data).map_err(serde::de::Error::custom)
    }
}

impl<T: SszComposite, const LIMIT: usize> SszType for CompositeList<T, LIMIT> {
    const KIND: Kind = Kind::List;
    const FIXED_SIZE: Option<usize> = None;
    const MIN_SIZE: usize = 0;
    const MAX_SIZE: usize = match T::FIXED_SIZE {
        Some(size) => LIMIT * size,
        None => LIMIT * (4 + T::MAX_SIZE),
    };
    const CHUNK_COUNT: u64 = LIMIT as u64;
    const CHUNK_DEPTH: u32 = ceil_log2(LIMIT as u64);

    fn serialized_size(&self) -> usize {
        if let Some(size) = T::FIXED_SIZE {
            self.data.len() * size
        } else {
            self.data
                .iter()
                .map(|e| 4 + e.serialized_size())
                .sum::<usize>()
        }
    }

    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
        serialize_elements(&self.data, out)
    }

    fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
        Self::from_elements(deserialize_elements(bytes)?)
    }

    fn hash_tree_root(&self) -> Root {
        let roots: Vec<Root> = self.data.iter().map(SszType::hash_tree_root).collect();
        mix_in_length(
            &merkleize_chunks(&roots, Self::CHUNK_DEPTH),
            self.data.len() as u64,
        )
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        let mut nodes = Vec::with_capacity(value.data.len());
        for e in &value.data {
            nodes.push(T::tree_from_value(pool, e)?);
        }
        let subtree = pool.fill_with_contents(&nodes, Self::CHUNK_DEPTH)?;
        let length = pool.create_leaf_from_uint(value.data.len() as u64);
        Ok(pool.create_branch(subtree, length))
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let length_chunk = {
            let node = pool.get_node(root, LENGTH_GINDEX)?;
            pool.get_root(node)
        };
        let length = length_from_chunk(&length_chunk) as usize;
        if length > LIMIT {
            return Err(TreeError::InvalidSize);
        }
        let subtree = pool.get_node(root, 2)?;
        let mut nodes = vec![NodeId::zero(0); length];
        pool.get_nodes_at_depth(subtree, Self::CHUNK_DEPTH, 0, &mut nodes)?;
        let mut data = Vec::with_capacity(length);
        for n in nodes {
            data.push(T::tree_to_value(pool, n)?);
        }
        Self::from_elements(data)
    }
}

impl<T: SszComposite, const LIMIT: usize> SszComposite for CompositeList<T, LIMIT> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_u8_list_root_vector() {
        let list = BasicList::<u8, 128>::default();
        assert_eq!(
            hex::encode(list.hash_tree_root()),
            "28ba1834a3a7b657460ce79fa3a1d909ab8828fd557659d4d0554a9bdbc0ec30"
        );
    }

    #[test]
    fn u8_list_root_vector() {
        let list = BasicList::<u8, 128>::from_elements(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(
            hex::encode(list.hash_tree_root()),
            "bac511d1f641d6b8823200bb4b3cced3bd4720701f18571dff35a5d2a40190fa"
        );
    }

    #[test]
    fn u64_list_root_vector() {
        let list =
            BasicList::<u64, 128>::from_elements(vec![100_000, 200_000, 300_000, 400_000])
                .unwrap();
        assert_eq!(
            hex::encode(list.hash_tree_root()),
            "d1daef215502b7746e5ff3e8833e399cb249ab3f81d824be60e174ff5633c1bf"
        );
    }

    #[test]
    fn push_stops_at_limit() {
        let mut list = BasicList::<u8, 2>::default();
        list.push(1).unwrap();
        list.push(2).unwrap();
        assert_eq!(list.push(3).unwrap_err(), TreeError::LengthOverLimit);
    }

    #[test]
    fn tree_roundtrip_matches_value_root() {
        let mut pool = NodePool::new();
        let list = BasicList::<u64, 128>::from_elements(vec![5, 6, 7]).unwrap();
        let node = BasicList::<u64, 128>::tree_from_value(&mut pool, &list).unwrap();
        assert_eq!(pool.get_root(node), list.hash_tree_root());
        assert_eq!(
            BasicList::<u64, 128>::tree_to_value(&mut pool, node).unwrap(),
            list
        );
    }

    #[test]
    fn serialization_has_no_length_prefix() {
        let list = BasicList::<u64, 128>::from_elements(vec![1, 2]).unwrap();
        assert_eq!(SszType::serialize(&list).unwrap().len(), 16);
        let back =
            <BasicList<u64, 128> as SszType>::deserialize(&SszType::serialize(&list).unwrap())
                .unwrap();
        assert_eq!(back, list);
    }
}
