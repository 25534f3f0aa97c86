// crates/ssztree-view/src/views/bits.rs

//! Bitvector / bitlist views.
//!
//! Bits pack 256 per chunk; a single-bit write is a read-modify-write of
//! its chunk leaf. Bitlists track their *bit* length in the gindex-3 leaf.

use std::marker::PhantomData;

use ssztree_core::{TreeError, TreeResult};
use ssztree_schema::{Bitlist, Bitvector, SszType};

use crate::chunks::{get_all_bits, get_bit_at, set_bit_at};
use crate::store::{SharedStore, ViewId};
use crate::view::{TreeView, TreeViewType};

/// Mutable view over `Bitvector[N]`.
#[derive(Clone, Debug)]
pub struct BitvectorView<const N: usize> {
    store: SharedStore,
    id: ViewId,
    _marker: PhantomData<()>,
}

impl<const N: usize> TreeView for BitvectorView<N> {
    type Ssz = Bitvector<N>;

    fn from_raw(store: SharedStore, id: ViewId) -> Self {
        Self { store, id, _marker: PhantomData }
    }

    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn id(&self) -> ViewId {
        self.id
    }
}

impl<const N: usize> BitvectorView<N> {
    const ELEMENT_DEPTH: u32 = <Bitvector<N> as SszType>::CHUNK_DEPTH;

    /// Bit at `index`.
    pub fn get(&mut self, index: usize) -> TreeResult<bool> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        get_bit_at(&self.store, self.id, Self::ELEMENT_DEPTH, index)
    }

    /// Set the bit at `index`.
    pub fn set(&mut self, index: usize, value: bool) -> TreeResult<()> {
        if index >= N {
            return Err(TreeError::IndexOutOfBounds);
        }
        set_bit_at(&self.store, self.id, Self::ELEMENT_DEPTH, index, value)
    }

    /// All bits in order.
    pub fn to_bools(&mut self) -> TreeResult<Vec<bool>> {
        get_all_bits(&self.store, self.id, Self::ELEMENT_DEPTH, N)
    }

    /// Fill `out` with all bits; `out` must hold exactly `N`.
    pub fn to_bools_into(&mut self, out: &mut [bool]) -> TreeResult<()> {
        if out.len() != N {
            return Err(TreeError::InvalidSize);
        }
        out.copy_from_slice(&self.to_bools()?);
        Ok(())
    }
}

impl<const N: usize> TreeViewType for Bitvector<N> {
    type View = BitvectorView<N>;
}

/// Mutable view over `Bitlist[LIMIT]`.
#[derive(Clone, Debug)]
pub struct BitlistView<const LIMIT: usize> {
    store: SharedStore,
    id: ViewId,
    _marker: PhantomData<()>,
}

impl<const LIMIT: usize> TreeView for BitlistView<LIMIT> {
    type Ssz = Bitlist<LIMIT>;

    fn from_raw(store: SharedStore, id: ViewId) -> Self {
        Self { store, id, _marker: PhantomData }
    }

    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn id(&self) -> ViewId {
        self.id
    }
}

impl<const LIMIT: usize> BitlistView<LIMIT> {
    const ELEMENT_DEPTH: u32 = <Bitlist<LIMIT> as SszType>::CHUNK_DEPTH + 1;

    /// Current bit count (cached read of the length leaf).
    pub fn length(&mut self) -> TreeResult<u64> {
        self.store.borrow_mut().list_length(self.id)
    }

    /// Bit at `index`.
    pub fn get(&mut self, index: usize) -> TreeResult<bool> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        get_bit_at(&self.store, self.id, Self::ELEMENT_DEPTH, index)
    }

    /// Set the bit at `index`.
    pub fn set(&mut self, index: usize, value: bool) -> TreeResult<()> {
        if (index as u64) >= self.length()? {
            return Err(TreeError::IndexOutOfBounds);
        }
        set_bit_at(&self.store, self.id, Self::ELEMENT_DEPTH, index, value)
    }

    /// Append a bit, failing at the schema limit.
    pub fn push(&mut self, value: bool) -> TreeResult<()> {
        let length = self.length()? as usize;
        if length >= LIMIT {
            return Err(TreeError::LengthOverLimit);
        }
        set_bit_at(&self.store, self.id, Self::ELEMENT_DEPTH, length, value)?;
        self.store.borrow_mut().set_list_length(self.id, length as u64 + 1);
        Ok(())
    }

    /// All bits in order.
    pub fn to_bools(&mut self) -> TreeResult<Vec<bool>> {
        let length = self.length()? as usize;
        get_all_bits(&self.store, self.id, Self::ELEMENT_DEPTH, length)
    }

    /// Fill `out` with all bits; its length must equal the bitlist's.
    pub fn to_bools_into(&mut self, out: &mut [bool]) -> TreeResult<()> {
        let length = self.length()? as usize;
        if out.len() != length {
            return Err(TreeError::InvalidSize);
        }
        out.copy_from_slice(&self.to_bools()?);
        Ok(())
    }
}

impl<const LIMIT: usize> TreeViewType for Bitlist<LIMIT> {
    type View = BitlistView<LIMIT>;
}
