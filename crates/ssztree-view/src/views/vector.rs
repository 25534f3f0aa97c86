// crates/ssztree-view/src/views/vector.rs

//! Fixed-length array views, basic and composite.

use std::marker::PhantomData;
use std::rc::Rc;

use ssztree_core::gindex::from_depth;
use ssztree_core::{TreeError, TreeResult};
use ssztree_schema::{BasicVector, CompositeVector, SszBasic, SszComposite, SszType};

use crate::chunks::{get_all_packed, get_packed, set_packed};
use crate::store::{SharedStore, ViewId};
use crate::view::{TreeView, TreeViewType};

/* -------------------- basic elements -------------------- */

/// Mutable view over `Vector[T, N]` for basic `T` (packed chunks).
#[derive(Clone, Debug)]
pub struct BasicVectorView<T: SszBasic, const N: usize> {
    store: SharedStore,
    id: ViewId,
    _element: PhantomData<fn() -> T>,
}

impl<T: SszBasic, const N: usize> TreeView for BasicVectorView<T, N> {
    type Ssz = BasicVector<T, N>;

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

impl<T: SszBasic, const N: usize> BasicVectorView<T, N> {
    const ELEMENT_DEPTH: u32 = <BasicVector<T, N> as SszType>::CHUNK_DEPTH;

    /// Element at `index`.
    pub fn get(&mut self, index: usize) -> TreeResult<T> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        get_packed(&self.store, self.id, Self::ELEMENT_DEPTH, index)
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: T) -> TreeResult<()> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        set_packed(&self.store, self.id, Self::ELEMENT_DEPTH, index, value)
    }

    /// All elements, prefetching the chunk range in one traversal.
    pub fn get_all(&mut self) -> TreeResult<Vec<T>> {
        get_all_packed(&self.store, self.id, Self::ELEMENT_DEPTH, N)
    }

    /// Fill `out` with all elements; `out` must hold exactly `N`.
    pub fn get_all_into(&mut self, out: &mut [T]) -> TreeResult<()> {
        if out.len() != N {
            return Err(TreeError::InvalidSize);
        }
        let values = self.get_all()?;
        out.copy_from_slice(&values);
        Ok(())
    }
}

impl<T: SszBasic, const N: usize> TreeViewType for BasicVector<T, N> {
    type View = BasicVectorView<T, N>;
}

/* -------------------- composite elements -------------------- */

/// Mutable view over `Vector[T, N]` for composite `T` (subtree per
/// element).
#[derive(Clone, Debug)]
pub struct CompositeVectorView<T, const N: usize>
where
    T: SszComposite + TreeViewType,
{
    store: SharedStore,
    id: ViewId,
    _element: PhantomData<fn() -> T>,
}

impl<T, const N: usize> TreeView for CompositeVectorView<T, N>
where
    T: SszComposite + TreeViewType,
{
    type Ssz = CompositeVector<T, N>;

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

impl<T, const N: usize> CompositeVectorView<T, N>
where
    T: SszComposite + TreeViewType,
{
    const ELEMENT_DEPTH: u32 = <CompositeVector<T, N> as SszType>::CHUNK_DEPTH;

    /// Child view over the element at `index`.
    pub fn get(&mut self, index: usize) -> TreeResult<T::View> {
        if index >= N {
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
        if index >= N {
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

    /// Replace the element at `index` with a fresh lowering of `value`.
    pub fn set_value(&mut self, index: usize, value: &T) -> TreeResult<()> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        let node = {
            let pool = self.store.borrow().pool_rc();
            let node = T::tree_from_value(&mut pool.borrow_mut(), value)?;
            node
        };
        let gindex = from_depth(Self::ELEMENT_DEPTH, index as u64);
        self.store.borrow_mut().set_child_node(self.id, gindex, node);
        Ok(())
    }
}

impl<T, const N: usize> TreeViewType for CompositeVector<T, N>
where
    T: SszComposite + TreeViewType,
{
    type View = CompositeVectorView<T, N>;
}
