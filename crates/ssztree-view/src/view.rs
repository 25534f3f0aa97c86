// crates/ssztree-view/src/view.rs

//! The capability set every tree view satisfies.
//!
//! A view is a `(store, id)` handle; all heavy state lives in the store.
//! Handles are non-owning: child views belong to their parent's cache, and
//! a top-level view is torn down explicitly with [`TreeView::destroy`].

use ssztree_core::hash::Root;
use ssztree_core::TreeResult;
use ssztree_pool::NodeId;
use ssztree_schema::{ContainerSchema, SszType};

use crate::store::{SharedStore, ViewId};

/// Common operations of every view in the closed family.
pub trait TreeView: Sized {
    /// The SSZ type this view presents.
    type Ssz: SszType;

    /// Wrap an existing view id owned by `store`.
    fn from_raw(store: SharedStore, id: ViewId) -> Self;

    /// The owning store.
    fn store(&self) -> &SharedStore;

    /// The underlying view id.
    fn id(&self) -> ViewId;

    /// Lower `value` into the pool and open a view over it.
    fn from_value(store: &SharedStore, value: &Self::Ssz) -> TreeResult<Self> {
        let pool = store.borrow().pool_rc();
        let root = Self::Ssz::tree_from_value(&mut pool.borrow_mut(), value)?;
        let id = store.borrow_mut().create_view(root);
        Ok(Self::from_raw(SharedStore::clone(store), id))
    }

    /// Deserialize canonical wire bytes and open a view.
    fn from_ssz_bytes(store: &SharedStore, bytes: &[u8]) -> TreeResult<Self> {
        let value = Self::Ssz::deserialize(bytes)?;
        Self::from_value(store, &value)
    }

    /// Fold all pending changes into a new committed root.
    fn commit(&mut self) -> TreeResult<()> {
        self.store().borrow_mut().commit(self.id())
    }

    /// Committed root node handle.
    fn root_node(&self) -> NodeId {
        self.store().borrow().root_node(self.id())
    }

    /// Hash-tree-root after an implicit commit.
    fn hash_tree_root(&mut self) -> TreeResult<Root> {
        self.commit()?;
        Ok(self.store().borrow_mut().root_hash(self.id()))
    }

    /// Read the whole value back out (implicit commit).
    fn to_value(&mut self) -> TreeResult<Self::Ssz> {
        self.commit()?;
        let root = self.root_node();
        let pool = self.store().borrow().pool_rc();
        let value = Self::Ssz::tree_to_value(&mut pool.borrow_mut(), root)?;
        Ok(value)
    }

    /// Exact canonical size of the current value (implicit commit).
    fn serialized_size(&mut self) -> TreeResult<usize> {
        self.commit()?;
        let root = self.root_node();
        let pool = self.store().borrow().pool_rc();
        let size = Self::Ssz::tree_serialized_size(&mut pool.borrow_mut(), root)?;
        Ok(size)
    }

    /// Serialize the current value into `out`; returns bytes written
    /// (implicit commit).
    fn serialize_into(&mut self, out: &mut [u8]) -> TreeResult<usize> {
        self.commit()?;
        let root = self.root_node();
        let pool = self.store().borrow().pool_rc();
        let written = Self::Ssz::tree_serialize_into(&mut pool.borrow_mut(), root, out)?;
        Ok(written)
    }

    /// Serialize the current value into a fresh vector (implicit commit).
    fn serialize(&mut self) -> TreeResult<Vec<u8>> {
        let size = self.serialized_size()?;
        let mut out = vec![0u8; size];
        let written = self.serialize_into(&mut out)?;
        debug_assert_eq!(written, size);
        Ok(out)
    }

    /// Independent view at the same committed root (commits first). With
    /// `transfer_cache`, the source's clean caches move to the clone.
    fn clone_view(&mut self, transfer_cache: bool) -> TreeResult<Self> {
        self.commit()?;
        let id = self.store().borrow_mut().clone_view(self.id(), transfer_cache)?;
        Ok(Self::from_raw(SharedStore::clone(self.store()), id))
    }

    /// Drop cached temporaries and pending changes.
    fn clear_cache(&mut self) {
        self.store().borrow_mut().clear_cache(self.id());
    }

    /// Tear the view down, recursively destroying owned child views.
    fn destroy(self) {
        self.store().borrow_mut().destroy_view_recursive(self.id());
    }
}

/// Maps a composite SSZ type to its member of the closed view family.
pub trait TreeViewType: SszType {
    /// The view type presenting `Self`.
    type View: TreeView<Ssz = Self>;
}

/// A typed field marker of container schema `S`, generated by
/// `ssz_container!`. Field resolution is constant-time: the marker carries
/// the field index and type at compile time.
pub trait FieldOf<S: ContainerSchema> {
    /// The field's SSZ type.
    type Type: SszType;
    /// Field position in wire and tree order.
    const INDEX: usize;
}
