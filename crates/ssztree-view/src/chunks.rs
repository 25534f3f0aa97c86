// crates/ssztree-view/src/chunks.rs

//! Chunk addressing shared by the array/list/bit views.
//!
//! Basic elements pack `32 / size` per leaf; bits pack 256 per leaf. The
//! `element_depth` parameter is the depth of the chunk layer below the
//! *view root*: a vector's own `CHUNK_DEPTH`, or `CHUNK_DEPTH + 1` for
//! lists, whose chunks live under the left child of the length mix-in.

use ssztree_core::gindex::from_depth;
use ssztree_core::hash::Root;
use ssztree_core::TreeResult;
use ssztree_pool::NodeId;
use ssztree_schema::bits::bit_slot;
use ssztree_schema::SszBasic;

use crate::store::{SharedStore, ViewId};

/// Chunk payload of `node` (a leaf or zero sentinel).
pub(crate) fn read_chunk(store: &SharedStore, node: NodeId) -> Root {
    let pool = store.borrow().pool_rc();
    let chunk = pool.borrow_mut().get_root(node);
    chunk
}

/* -------------------- packed basic elements -------------------- */

pub(crate) fn get_packed<T: SszBasic>(
    store: &SharedStore,
    id: ViewId,
    element_depth: u32,
    index: usize,
) -> TreeResult<T> {
    let gindex = from_depth(element_depth, (index / T::ITEMS_PER_CHUNK) as u64);
    let node = store.borrow_mut().get_child_node(id, gindex)?;
    let chunk = read_chunk(store, node);
    Ok(T::from_slot(&chunk, index % T::ITEMS_PER_CHUNK))
}

/// Read-modify-write of the chunk holding `index`; stages the new leaf and
/// marks the chunk dirty.
pub(crate) fn set_packed<T: SszBasic>(
    store: &SharedStore,
    id: ViewId,
    element_depth: u32,
    index: usize,
    value: T,
) -> TreeResult<()> {
    let gindex = from_depth(element_depth, (index / T::ITEMS_PER_CHUNK) as u64);
    let node = store.borrow_mut().get_child_node(id, gindex)?;
    let mut chunk = read_chunk(store, node);
    value.to_slot(&mut chunk, index % T::ITEMS_PER_CHUNK);
    let leaf = {
        let pool = store.borrow().pool_rc();
        let leaf = pool.borrow_mut().create_leaf(chunk);
        leaf
    };
    store.borrow_mut().set_child_node(id, gindex, leaf);
    Ok(())
}

/// Decode `count` elements, prefetching the chunk range in one traversal.
pub(crate) fn get_all_packed<T: SszBasic>(
    store: &SharedStore,
    id: ViewId,
    element_depth: u32,
    count: usize,
) -> TreeResult<Vec<T>> {
    let n_chunks = count.div_ceil(T::ITEMS_PER_CHUNK);
    let nodes = store.borrow_mut().chunk_nodes(id, element_depth, n_chunks)?;
    let mut values = Vec::with_capacity(count);
    for (c, node) in nodes.iter().enumerate() {
        let chunk = read_chunk(store, *node);
        let in_chunk = (count - c * T::ITEMS_PER_CHUNK).min(T::ITEMS_PER_CHUNK);
        for slot in 0..in_chunk {
            values.push(T::from_slot(&chunk, slot));
        }
    }
    Ok(values)
}

/* -------------------- packed bits -------------------- */

pub(crate) fn get_bit_at(
    store: &SharedStore,
    id: ViewId,
    element_depth: u32,
    index: usize,
) -> TreeResult<bool> {
    let (chunk_index, byte, mask) = bit_slot(index);
    let node = store
        .borrow_mut()
        .get_child_node(id, from_depth(element_depth, chunk_index))?;
    let chunk = read_chunk(store, node);
    Ok(chunk[byte] & mask != 0)
}

pub(crate) fn set_bit_at(
    store: &SharedStore,
    id: ViewId,
    element_depth: u32,
    index: usize,
    value: bool,
) -> TreeResult<()> {
    let (chunk_index, byte, mask) = bit_slot(index);
    let gindex = from_depth(element_depth, chunk_index);
    let node = store.borrow_mut().get_child_node(id, gindex)?;
    let mut chunk = read_chunk(store, node);
    if value {
        chunk[byte] |= mask;
    } else {
        chunk[byte] &= !mask;
    }
    let leaf = {
        let pool = store.borrow().pool_rc();
        let leaf = pool.borrow_mut().create_leaf(chunk);
        leaf
    };
    store.borrow_mut().set_child_node(id, gindex, leaf);
    Ok(())
}

/// Decode `count` bits, prefetching the chunk range in one traversal.
pub(crate) fn get_all_bits(
    store: &SharedStore,
    id: ViewId,
    element_depth: u32,
    count: usize,
) -> TreeResult<Vec<bool>> {
    let n_chunks = count.div_ceil(ssztree_schema::bits::BITS_PER_CHUNK);
    let nodes = store.borrow_mut().chunk_nodes(id, element_depth, n_chunks)?;
    let mut bits = Vec::with_capacity(count);
    for (c, node) in nodes.iter().enumerate() {
        let chunk = read_chunk(store, *node);
        let in_chunk =
            (count - c * ssztree_schema::bits::BITS_PER_CHUNK).min(ssztree_schema::bits::BITS_PER_CHUNK);
        for i in 0..in_chunk {
            bits.push(chunk[i / 8] & (1 << (i % 8)) != 0);
        }
    }
    Ok(bits)
}
