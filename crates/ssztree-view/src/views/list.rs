// crates/ssztree-view/src/views/list.rs

//! List views: length-mixed arrays with push and slice operations.
//!
//! Element chunks live under the left child of the list root, so the chunk
//! layer sits at `CHUNK_DEPTH + 1` below the view root and the length leaf
//! at gindex 3. `slice_to`/`slice_from` build *independent* views that
//! share every untouched subtree with the source.

use std::marker::PhantomData;
use std::rc::Rc;

use ssztree_core::gindex::from_depth;
use ssztree_core::hash::BYTES_PER_CHUNK;
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::NodeId;
use ssztree_schema::{BasicList, CompositeList, SszBasic, SszComposite, SszType};

use crate::chunks::{get_all_packed, get_packed, set_packed};
use crate::store::{SharedStore, ViewId};
use crate::view::{TreeView, TreeViewType};

/* -------------------- basic elements -------------------- */

/// Mutable view over `List[T, LIMIT]` for basic `T`.
#[derive(Clone, Debug)]
pub struct BasicListView<T: SszBasic, const LIMIT: usize> {
    store: SharedStore,
    id: ViewId,
    _element: PhantomData<fn() -> T>,
}

impl<T: SszBasic, const LIMIT: usize> TreeView for BasicListView<T, LIMIT> {
    type Ssz = BasicList<T, LIMIT>;

    fn from_raw(store: SharedStore, id: ViewId) -> Self {
        Self { store, id, _element: PhantomData }
    }

    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn id(&self) -> ViewId {
        self.id
    }
}

impl<T: SszBasic, const LIMIT: usize> BasicListView<T, LIMIT> {
    const CHUNK_DEPTH: u32 = <BasicList<T, LIMIT> as SszType>::CHUNK_DEPTH;
    const ELEMENT_DEPTH: u32 = Self::CHUNK_DEPTH + 1;

    /// Current element count (cached read of the length leaf).
    pub fn length(&mut self) -> TreeResult<u64> {
        self.store.borrow_mut().list_length(self.id)
    }

    /// Element at `index`.
    pub fn get(&mut self, index: usize) -> TreeResult<T> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        get_packed(&self.store, self.id, Self::ELEMENT_DEPTH, index)
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: T) -> TreeResult<()> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        set_packed(&self.store, self.id, Self::ELEMENT_DEPTH, index, value)
    }

    /// Append `value`, failing at the schema limit.
    pub fn push(&mut self, value: T) -> TreeResult<()> {
        let length = self.length()? as usize;
        if length >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        set_packed(&self.store, self.id, Self::ELEMENT_DEPTH, length, value)?;
        self.store.borrow_mut().set_list_length(self.id, length as u64 + 1);
        Ok(())
    }

    /// All elements, prefetching the chunk range in one traversal.
    pub fn get_all(&mut self) -> TreeResult<Vec<T>> {
        let length = self.length()? as usize;
        get_all_packed(&self.store, self.id, Self::ELEMENT_DEPTH, length)
    }

    /// Fill `out` with all elements; its length must equal the list's.
    pub fn get_all_into(&mut self, out: &mut [T]) -> TreeResult<()> {
        let length = self.length()? as usize;
        if out.len() != length {
            return Err(TreeError::InvalidSize);
        }
        let values = get_all_packed(&self.store, self.id, Self::ELEMENT_DEPTH, length)?;
        out.copy_from_slice(&values);
        Ok(())
    }

    /// Independent view over elements `[0, index]`, sharing every chunk
    /// subtree fully contained in the kept range.
    pub fn slice_to(&mut self, index: usize) -> TreeResult<Self> {
        self.commit()?;
        let length = self.length()? as usize;
        if index >= length {
            return Err(TreeError::IndexOutOfBounds);
        }
        let new_length = index + 1;
        let root = self.root_node();
        let pool_rc = self.store.borrow().pool_rc();
        let new_root = {
            let mut pool = pool_rc.borrow_mut();
            let subtree = pool.get_node(root, 2)?;
            let last_chunk = (index / T::ITEMS_PER_CHUNK) as u64;
            let mut truncated =
                pool.truncate_after_index(subtree, Self::CHUNK_DEPTH, last_chunk)?;
            // Zero the unused tail bytes inside the boundary chunk.
            let tail_items = new_length - (last_chunk as usize) * T::ITEMS_PER_CHUNK;
            if tail_items < T::ITEMS_PER_CHUNK {
                let chunk_node = pool.get_node_at_depth(truncated, Self::CHUNK_DEPTH, last_chunk)?;
                let mut chunk = pool.get_root(chunk_node);
                let from = tail_items * T::SIZE;
                if chunk[from..].iter().any(|&b| b != 0) {
                    chunk[from..].fill(0);
                    let leaf = pool.create_leaf(chunk);
                    let zeroed =
                        pool.set_node(truncated, from_depth(Self::CHUNK_DEPTH, last_chunk), leaf)?;
                    pool.release_floating(truncated);
                    truncated = zeroed;
                }
            }
            let length_leaf = pool.create_leaf_from_uint(new_length as u64);
            pool.create_branch(truncated, length_leaf)
        };
        let id = self.store.borrow_mut().create_view(new_root);
        Ok(Self::from_raw(SharedStore::clone(&self.store), id))
    }

    /// Independent view over elements `[index, length)`. Chunk-aligned
    /// starts reuse source chunk nodes; unaligned starts shift bytes
    /// through fresh leaves.
    pub fn slice_from(&mut self, index: usize) -> TreeResult<Self> {
        self.commit()?;
        let length = self.length()? as usize;
        if index > length {
            return Err(TreeError::IndexOutOfBounds);
        }
        let root = self.root_node();
        let pool_rc = self.store.borrow().pool_rc();
        let new_root = {
            let mut pool = pool_rc.borrow_mut();
            if index == 0 {
                root
            } else {
                let new_length = length - index;
                let ipc = T::ITEMS_PER_CHUNK;
                let first_chunk = index / ipc;
                let n_new = new_length.div_ceil(ipc);
                let subtree = pool.get_node(root, 2)?;
                let contents = if index % ipc == 0 {
                    let mut nodes = vec![NodeId::zero(0); n_new];
                    pool.get_nodes_at_depth(
                        subtree,
                        Self::CHUNK_DEPTH,
                        first_chunk as u64,
                        &mut nodes,
                    )?;
                    nodes
                } else {
                    let n_src = (length - first_chunk * ipc).div_ceil(ipc);
                    let mut src = vec![NodeId::zero(0); n_src];
                    pool.get_nodes_at_depth(
                        subtree,
                        Self::CHUNK_DEPTH,
                        first_chunk as u64,
                        &mut src,
                    )?;
                    let chunks: Vec<[u8; BYTES_PER_CHUNK]> =
                        src.iter().map(|n| pool.get_root(*n)).collect();
                    let shift = (index % ipc) * T::SIZE;
                    let mut nodes = Vec::with_capacity(n_new);
                    for c in 0..n_new {
                        let mut out = [0u8; BYTES_PER_CHUNK];
                        out[..BYTES_PER_CHUNK - shift].copy_from_slice(&chunks[c][shift..]);
                        if c + 1 < chunks.len() {
                            out[BYTES_PER_CHUNK - shift..].copy_from_slice(&chunks[c + 1][..shift]);
                        }
                        nodes.push(pool.create_leaf(out));
                    }
                    nodes
                };
                let new_subtree = pool.fill_with_contents(&contents, Self::CHUNK_DEPTH)?;
                let length_leaf = pool.create_leaf_from_uint(new_length as u64);
                pool.create_branch(new_subtree, length_leaf)
            }
        };
        let id = self.store.borrow_mut().create_view(new_root);
        Ok(Self::from_raw(SharedStore::clone(&self.store), id))
    }
}

impl<T: SszBasic, const LIMIT: usize> TreeViewType for BasicList<T, LIMIT> {
    type View = BasicListView<T, LIMIT>;
}

/* -------------------- composite elements -------------------- */

/// Mutable view over `List[T, LIMIT]` for composite `T`.
#[derive(Clone, Debug)]
pub struct CompositeListView<T, const LIMIT: usize>
where
    T: SszComposite + TreeViewType,
{
    store: SharedStore,
    id: ViewId,
    _element: PhantomData<fn() -> T>,
}

impl<T, const LIMIT: usize> TreeView for CompositeListView<T, LIMIT>
where
    T: SszComposite + TreeViewType,
{
    type Ssz = CompositeList<T, LIMIT>;

    fn from_raw(store: SharedStore, id: ViewId) -> Self {
        Self { store, id, _element: PhantomData }
    }

    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn id(&self) -> ViewId {
        self.id
    }
}

impl<T, const LIMIT: usize> CompositeListView<T, LIMIT>
where
    T: SszComposite + TreeViewType,
{
    const CHUNK_DEPTH: u32 = <CompositeList<T, LIMIT> as SszType>::CHUNK_DEPTH;
    const ELEMENT_DEPTH: u32 = Self::CHUNK_DEPTH + 1;

    /// Current element count (cached read of the length leaf).
    pub fn length(&mut self) -> TreeResult<u64> {
        self.store.borrow_mut().list_length(self.id)
    }

    /// Child view over the element at `index`.
    pub fn get(&mut self, index: usize) -> TreeResult<T::View> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        let gindex = from_depth(Self::ELEMENT_DEPTH, index as u64);
        let child = self
            .store
            .borrow_mut()
            .get_or_create_child_view(self.id, gindex)?;
        Ok(T::View::from_raw(SharedStore::clone(&self.store), child))
    }

    /// Install `child` as the element at `index`, taking ownership.
    pub fn set(&mut self, index: usize, child: T::View) -> TreeResult<()> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        if !Rc::ptr_eq(&self.store, child.store()) {
            return Err(TreeError::DifferentStore);
        }
        let gindex = from_depth(Self::ELEMENT_DEPTH, index as u64);
        let cached = self.store.borrow().child_view_at(self.id, gindex);
        if cached == Some(child.id()) {
            self.store.borrow_mut().mark_changed(self.id, gindex);
        } else {
            self.store.borrow_mut().set_child_view(self.id, gindex, child.id());
        }
        Ok(())
    }

    /// Append a subview, failing at the schema limit.
    pub fn push(&mut self, child: T::View) -> TreeResult<()> {
        let length = self.length()? as usize;
        if length >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        if !Rc::ptr_eq(&self.store, child.store()) {
            return Err(TreeError::DifferentStore);
        }
        let gindex = from_depth(Self::ELEMENT_DEPTH, length as u64);
        self.store.borrow_mut().set_child_view(self.id, gindex, child.id());
        self.store.borrow_mut().set_list_length(self.id, length as u64 + 1);
        Ok(())
    }

    /// Append a fresh lowering of `value`, failing at the schema limit.
    pub fn push_value(&mut self, value: &T) -> TreeResult<()> {
        let length = self.length()? as usize;
        if length >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        let node = {
            let pool = self.store.borrow().pool_rc();
            let node = T::tree_from_value(&mut pool.borrow_mut(), value)?;
            node
        };
        let gindex = from_depth(Self::ELEMENT_DEPTH, length as u64);
        self.store.borrow_mut().set_child_node(self.id, gindex, node);
        self.store.borrow_mut().set_list_length(self.id, length as u64 + 1);
        Ok(())
    }

    /// Current subtree node of the element at `index` (memoized).
    pub fn element_node(&mut self, index: usize) -> TreeResult<NodeId> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        let gindex = from_depth(Self::ELEMENT_DEPTH, index as u64);
        self.store.borrow_mut().get_child_node(self.id, gindex)
    }

    /// Stage a prebuilt subtree as the element at `index`. Used by loaders
    /// grafting seed-reused element trees.
    pub fn set_element_node(&mut self, index: usize, node: NodeId) -> TreeResult<()> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        let gindex = from_depth(Self::ELEMENT_DEPTH, index as u64);
        self.store.borrow_mut().set_child_node(self.id, gindex, node);
        Ok(())
    }

    /// Independent view over elements `[0, index]`, sharing all kept
    /// element subtrees with the source.
    pub fn slice_to(&mut self, index: usize) -> TreeResult<Self> {
        self.commit()?;
        let length = self.length()? as usize;
        if index >= length {
            return Err(TreeError::IndexOutOfBounds);
        }
        let root = self.root_node();
        let pool_rc = self.store.borrow().pool_rc();
        let new_root = {
            let mut pool = pool_rc.borrow_mut();
            let subtree = pool.get_node(root, 2)?;
            let truncated =
                pool.truncate_after_index(subtree, Self::CHUNK_DEPTH, index as u64)?;
            let length_leaf = pool.create_leaf_from_uint(index as u64 + 1);
            pool.create_branch(truncated, length_leaf)
        };
        let id = self.store.borrow_mut().create_view(new_root);
        Ok(Self::from_raw(SharedStore::clone(&self.store), id))
    }

    /// Independent view over elements `[index, length)`, reusing the source
    /// element subtrees.
    pub fn slice_from(&mut self, index: usize) -> TreeResult<Self> {
        self.commit()?;
        let length = self.length()? as usize;
        if index > length {
            return Err(TreeError::IndexOutOfBounds);
        }
        let root = self.root_node();
        let pool_rc = self.store.borrow().pool_rc();
        let new_root = {
            let mut pool = pool_rc.borrow_mut();
            if index == 0 {
                root
            } else {
                let new_length = length - index;
                let subtree = pool.get_node(root, 2)?;
                let mut nodes = vec![NodeId::zero(0); new_length];
                pool.get_nodes_at_depth(subtree, Self::CHUNK_DEPTH, index as u64, &mut nodes)?;
                let new_subtree = pool.fill_with_contents(&nodes, Self::CHUNK_DEPTH)?;
                let length_leaf = pool.create_leaf_from_uint(new_length as u64);
                pool.create_branch(new_subtree, length_leaf)
            }
        };
        let id = self.store.borrow_mut().create_view(new_root);
        Ok(Self::from_raw(SharedStore::clone(&self.store), id))
    }
}

impl<T, const LIMIT: usize> TreeViewType for CompositeList<T, LIMIT>
where
    T: SszComposite + TreeViewType,
{
    type View = CompositeListView<T, LIMIT>;
}
