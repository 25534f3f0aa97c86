// crates/ssztree-schema/src/vector.rs

//! Fixed-length SSZ vectors.
//!
//! Two variants, matching the closed view family: [`BasicVector`] packs
//! basic elements into 32-byte chunks; [`CompositeVector`] gives every
//! element its own subtree. `ByteVector<N>` is the ubiquitous
//! `Vector[uint8, N]` alias (roots, pubkeys, version bytes).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssztree_core::gindex::ceil_log2;
use ssztree_core::hash::{Root, BYTES_PER_CHUNK};
use ssztree_core::merkleize::merkleize_chunks;
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::{NodeId, NodePool};

use crate::types::{Kind, SszBasic, SszComposite, SszType};

/// `Vector[uint8, N]`.
pub type ByteVector<const N: usize> = BasicVector<u8, N>;

/* -------------------- packing helpers (shared with lists) -------------------- */

/// Pack `values` into zero-padded 32-byte chunks.
pub(crate) fn chunks_from_basic<T: SszBasic>(values: &[T]) -> Vec<Root> {
    let mut chunks = vec![[0u8; BYTES_PER_CHUNK]; values.len().div_ceil(T::ITEMS_PER_CHUNK)];
    for (i, v) in values.iter().enumerate() {
        v.to_slot(&mut chunks[i / T::ITEMS_PER_CHUNK], i % T::ITEMS_PER_CHUNK);
    }
    chunks
}

/// Intern `chunks` as leaves, trimming the all-zero tail so it can be
/// shared with the zero lineage.
pub(crate) fn leaves_from_chunks(pool: &mut NodePool, mut chunks: Vec<Root>) -> Vec<NodeId> {
    while chunks.last() == Some(&[0u8; BYTES_PER_CHUNK]) {
        chunks.pop();
    }
    chunks.into_iter().map(|c| pool.create_leaf(c)).collect()
}

/// Read `count` basic values from the chunk layer of `subtree`.
pub(crate) fn basic_values_from_tree<T: SszBasic>(
    pool: &mut NodePool,
    subtree: NodeId,
    depth: u32,
    count: usize,
) -> TreeResult<Vec<T>> {
    let n_chunks = count.div_ceil(T::ITEMS_PER_CHUNK);
    let mut nodes = vec![NodeId::zero(0); n_chunks];
    pool.get_nodes_at_depth(subtree, depth, 0, &mut nodes)?;
    let mut values = Vec::with_capacity(count);
    for (c, node) in nodes.iter().enumerate() {
        let chunk = pool.get_root(*node);
        let in_chunk = (count - c * T::ITEMS_PER_CHUNK).min(T::ITEMS_PER_CHUNK);
        for slot in 0..in_chunk {
            values.push(T::from_slot(&chunk, slot));
        }
    }
    Ok(values)
}

/// Serialize a run of elements, fixed or offset-prefixed.
pub(crate) fn serialize_elements<T: SszType>(
    elements: &[T],
    out: &mut [u8],
) -> TreeResult<usize> {
    if let Some(size) = T::FIXED_SIZE {
        let total = elements.len() * size;
        if out.len() < total {
            return Err(TreeError::InvalidSize);
        }
        for (i, e) in elements.iter().enumerate() {
            e.serialize_into(&mut out[i * size..(i + 1) * size])?;
        }
        Ok(total)
    } else {
        let mut offset = 4 * elements.len();
        let total = offset + elements.iter().map(SszType::serialized_size).sum::<usize>();
        if out.len() < total {
            return Err(TreeError::InvalidSize);
        }
        for (i, e) in elements.iter().enumerate() {
            out[i * 4..(i + 1) * 4].copy_from_slice(&(offset as u32).to_le_bytes());
            offset += e.serialize_into(&mut out[offset..])?;
        }
        Ok(total)
    }
}

/// Parse a run of elements, fixed or offset-prefixed. The whole of `bytes`
/// must be consumed.
pub(crate) fn deserialize_elements<T: SszType>(bytes: &[u8]) -> TreeResult<Vec<T>> {
    if let Some(size) = T::FIXED_SIZE {
        if size == 0 || bytes.len() % size != 0 {
            return Err(TreeError::InvalidSize);
        }
        bytes.chunks(size).map(<T as SszType>::deserialize).collect()
    } else if bytes.is_empty() {
        Ok(Vec::new())
    } else {
        let first = read_offset(bytes, 0)?;
        if first == 0 || first % 4 != 0 || first > bytes.len() {
            return Err(TreeError::InvalidSize);
        }
        let count = first / 4;
        let mut offsets = Vec::with_capacity(count + 1);
        for i in 0..count {
            offsets.push(read_offset(bytes, i * 4)?);
        }
        offsets.push(bytes.len());
        let mut elements = Vec::with_capacity(count);
        for w in offsets.windows(2) {
            let (start, end) = (w[0], w[1]);
            if start > end || end > bytes.len() {
                return Err(TreeError::InvalidSize);
            }
            elements.push(<T as SszType>::deserialize(&bytes[start..end])?);
        }
        Ok(elements)
    }
}

pub(crate) fn read_offset(bytes: &[u8], at: usize) -> TreeResult<usize> {
    let raw: [u8; 4] = bytes
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(TreeError::InvalidSize)?;
    Ok(u32::from_le_bytes(raw) as usize)
}

/* -------------------- BasicVector -------------------- */

/// `Vector[T, N]` for basic `T`, packed into chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicVector<T: SszBasic, const N: usize> {
    data: Vec<T>,
}

impl<T: SszBasic, const N: usize> BasicVector<T, N> {
    /// Wrap `data`, which must hold exactly `N` elements.
    pub fn from_elements(data: Vec<T>) -> TreeResult<Self> {
        if data.len() != N {
            return Err(TreeError::InvalidSize);
        }
        Ok(Self { data })
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> TreeResult<T> {
        self.data
            .get(index)
            .copied()
            .ok_or(TreeError::IndexOutOfBounds)
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: T) -> TreeResult<()> {
        *self.data.get_mut(index).ok_or(TreeError::IndexOutOfBounds)? = value;
        Ok(())
    }

    /// All elements in order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<const N: usize> ByteVector<N> {
    /// Wrap a raw byte string of exactly `N` bytes.
    pub fn from_bytes(bytes: &[u8]) -> TreeResult<Self> {
        Self::from_elements(bytes.to_vec())
    }
}

impl<T: SszBasic, const N: usize> Default for BasicVector<T, N> {
    fn default() -> Self {
        Self { data: vec![T::default(); N] }
    }
}

impl<T: SszBasic, const N: usize> Serialize for BasicVector<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de, T: SszBasic, const N: usize> Deserialize<'de> for BasicVector<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = Vec::<T>::deserialize(deserializer)?;
        Self::from_elements(data).map_err(serde::de::Error::custom)
    }
}

impl<T: SszBasic, const N: usize> SszType for BasicVector<T, N> {
    const KIND: Kind = Kind::Vector;
    const FIXED_SIZE: Option<usize> = Some(N * T::SIZE);
    const MIN_SIZE: usize = N * T::SIZE;
    const MAX_SIZE: usize = N * T::SIZE;
    const CHUNK_COUNT: u64 = ((N * T::SIZE + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK) as u64;
    const CHUNK_DEPTH: u32 = ceil_log2(Self::CHUNK_COUNT);

    fn serialized_size(&self) -> usize {
        N * T::SIZE
    }

    fn serialize_into(&self, out: &mut [u8]) -> TreeResult<usize> {
        serialize_elements(&self.data, out)
    }

    fn deserialize(bytes: &[u8]) -> TreeResult<Self> {
        if bytes.len() != N * T::SIZE {
            return Err(TreeError::InvalidSize);
        }
        Self::from_elements(deserialize_elements(bytes)?)
    }

    fn hash_tree_root(&self) -> Root {
        merkleize_chunks(&chunks_from_basic(&self.data), Self::CHUNK_DEPTH)
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        let leaves = leaves_from_chunks(pool, chunks_from_basic(&value.data));
        pool.fill_with_contents(&leaves, Self::CHUNK_DEPTH)
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let data = basic_values_from_tree(pool, root, Self::CHUNK_DEPTH, N)?;
        Self::from_elements(data)
    }
}

impl<T: SszBasic, const N: usize> SszComposite for BasicVector<T, N> {}

/* -------------------- CompositeVector -------------------- */

/// `Vector[T, N]` for composite `T`; one subtree per element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeVector<T: SszComposite, const N: usize> {
    data: Vec<T>,
}

impl<T: SszComposite, const N: usize> CompositeVector<T, N> {
    /// Wrap `data`, which must hold exactly `N` elements.
    pub fn from_elements(data: Vec<T>) -> TreeResult<Self> {
        if data.len() != N {
            return Err(TreeError::InvalidSize);
        }
        Ok(Self { data })
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> TreeResult<&T> {
        self.data.get(index).ok_or(TreeError::IndexOutOfBounds)
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: T) -> TreeResult<()> {
        *self.data.get_mut(index).ok_or(TreeError::IndexOutOfBounds)? = value;
        Ok(())
    }

    /// All elements in order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: SszComposite + Default, const N: usize> Default for CompositeVector<T, N> {
    fn default() -> Self {
        Self { data: (0..N).map(|_| T::default()).collect() }
    }
}

impl<T: SszComposite, const N: usize> Serialize for CompositeVector<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de, T: SszComposite, const N: usize> Deserialize<'de> for CompositeVector<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = Vec::<T>::deserialize(deserializer)?;
        Self::from_elements(data).map_err(serde::de::Error::custom)
    }
}

impl<T: SszComposite, const N: usize> SszType for CompositeVector<T, N> {
    const KIND: Kind = Kind::Vector;
    const FIXED_SIZE: Option<usize> = match T::FIXED_SIZE {
        Some(size) => Some(N * size),
        None => None,
    };
    const MIN_SIZE: usize = match T::FIXED_SIZE {
        Some(size) => N * size,
        None => N * (4 + T::MIN_SIZE),
    };
    const MAX_SIZE: usize = match T::FIXED_SIZE {
        Some(size) => N * size,
        None => N * (4 + T::MAX_SIZE),
    };
    const CHUNK_COUNT: u64 = N as u64;
    const CHUNK_DEPTH: u32 = ceil_log2(N as u64);

    fn serialized_size(&self) -> usize {
        if let Some(size) = T::FIXED_SIZE {
            N * size
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
        merkleize_chunks(&roots, Self::CHUNK_DEPTH)
    }

    fn tree_from_value(pool: &mut NodePool, value: &Self) -> TreeResult<NodeId> {
        let mut nodes = Vec::with_capacity(N);
        for e in &value.data {
            nodes.push(T::tree_from_value(pool, e)?);
        }
        pool.fill_with_contents(&nodes, Self::CHUNK_DEPTH)
    }

    fn tree_to_value(pool: &mut NodePool, root: NodeId) -> TreeResult<Self> {
        let mut nodes = vec![NodeId::zero(0); N];
        pool.get_nodes_at_depth(root, Self::CHUNK_DEPTH, 0, &mut nodes)?;
        let mut data = Vec::with_capacity(N);
        for n in nodes {
            data.push(T::tree_to_value(pool, n)?);
        }
        Self::from_elements(data)
    }
}

impl<T: SszComposite, const N: usize> SszComposite for CompositeVector<T, N> {}
