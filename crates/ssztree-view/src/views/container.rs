// crates/ssztree-view/src/views/container.rs

//! Typed container views and the `ssz_container!` declaration macro.
//!
//! Field access is compile-time dispatched through marker types: each
//! field of a declared container gets a zero-sized marker implementing
//! [`FieldOf`], so `view.get::<fields::Slot>()` resolves the gindex and
//! element type at monomorphization time.

use std::marker::PhantomData;
use std::rc::Rc;

use ssztree_core::gindex::{from_depth, Gindex};
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::NodeId;
use ssztree_schema::{ContainerSchema, SszBasic, SszType};

use crate::chunks::read_chunk;
use crate::store::{SharedStore, ViewId};
use crate::view::{FieldOf, TreeView, TreeViewType};

/// Mutable view over a container value.
///
/// Basic fields read/write through their leaf chunk; composite fields
/// materialize child views that stay owned by this view's cache, so a
/// mutation through `child::<F>()` reaches the parent root on `commit`.
#[derive(Clone, Debug)]
pub struct ContainerView<S: ContainerSchema> {
    store: SharedStore,
    id: ViewId,
    _schema: PhantomData<fn() -> S>,
}

impl<S: ContainerSchema> TreeView for ContainerView<S> {
    type Ssz = S;

    fn from_raw(store: SharedStore, id: ViewId) -> Self {
        Self { store, id, _schema: PhantomData }
    }

    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn id(&self) -> ViewId {
        self.id
    }
}

impl<S: ContainerSchema> ContainerView<S> {
    #[inline]
    fn field_gindex(index: usize) -> Gindex {
        from_depth(S::CHUNK_DEPTH, index as u64)
    }

    /// Read a basic field.
    pub fn get<F>(&mut self) -> TreeResult<F::Type>
    where
        F: FieldOf<S>,
        F::Type: SszBasic,
    {
        let gindex = Self::field_gindex(F::INDEX);
        let node = self.store.borrow_mut().get_child_node(self.id, gindex)?;
        let chunk = read_chunk(&self.store, node);
        Ok(<F::Type as SszBasic>::from_slot(&chunk, 0))
    }

    /// Write a basic field.
    pub fn set<F>(&mut self, value: F::Type) -> TreeResult<()>
    where
        F: FieldOf<S>,
        F::Type: SszBasic,
    {
        let gindex = Self::field_gindex(F::INDEX);
        let leaf = {
            let pool = self.store.borrow().pool_rc();
            let leaf = pool.borrow_mut().create_leaf(value.hash_tree_root());
            leaf
        };
        self.store.borrow_mut().set_child_node(self.id, gindex, leaf);
        Ok(())
    }

    /// Child view over a composite field. Repeated calls return a handle
    /// over the same underlying view, so mutations through either reach
    /// this container on commit.
    pub fn child<F>(&mut self) -> TreeResult<<F::Type as TreeViewType>::View>
    where
        F: FieldOf<S>,
        F::Type: TreeViewType,
    {
        let gindex = Self::field_gindex(F::INDEX);
        let child = self
            .store
            .borrow_mut()
            .get_or_create_child_view(self.id, gindex)?;
        Ok(<F::Type as TreeViewType>::View::from_raw(
            SharedStore::clone(&self.store),
            child,
        ))
    }

    /// Install `child` as the composite field's subview, taking ownership.
    /// Setting the already-cached child is just a dirty mark.
    pub fn set_child<F>(&mut self, child: <F::Type as TreeViewType>::View) -> TreeResult<()>
    where
        F: FieldOf<S>,
        F::Type: TreeViewType,
    {
        if !Rc::ptr_eq(&self.store, child.store()) {
            return Err(TreeError::DifferentStore);
        }
        let gindex = Self::field_gindex(F::INDEX);
        let cached = self.store.borrow().child_view_at(self.id, gindex);
        if cached == Some(child.id()) {
            self.store.borrow_mut().mark_changed(self.id, gindex);
        } else {
            self.store.borrow_mut().set_child_view(self.id, gindex, child.id());
        }
        Ok(())
    }

    /// Current subtree node of a field (memoized).
    pub fn child_node<F>(&mut self) -> TreeResult<NodeId>
    where
        F: FieldOf<S>,
    {
        let gindex = Self::field_gindex(F::INDEX);
        self.store.borrow_mut().get_child_node(self.id, gindex)
    }

    /// Stage a raw subtree node as a field's child. Used by loaders that
    /// graft prebuilt subtrees (e.g. seed reuse during state migration).
    pub fn set_child_node<F>(&mut self, node: NodeId)
    where
        F: FieldOf<S>,
    {
        let gindex = Self::field_gindex(F::INDEX);
        self.store.borrow_mut().set_child_node(self.id, gindex, node);
    }
}

/// Declare an SSZ container: the value struct, its [`SszType`] codec and
/// tree lowering, the [`ContainerSchema`] descriptor, a typed field-marker
/// module, and the container's place in the view family.
///
/// ```ignore
/// ssz_container! {
///     module checkpoint_fields;
///     /// Finality checkpoint.
///     pub struct Checkpoint {
///         pub epoch: u64 => Epoch,
///         pub root: ByteVector<32> => Root,
///     }
/// }
/// ```
#[macro_export]
macro_rules! ssz_container {
    (
        module $fields_mod:ident;
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $fty:ty => $marker:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Default, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $fty, )+
        }

        /// Typed field markers for tree-view access.
        pub mod $fields_mod {
            use super::*;
            $crate::ssz_container_fields!($name, 0usize, $( ($marker, $field, $fty) )+ );
        }

        impl $crate::schema::ContainerSchema for $name {
            const FIELD_COUNT: usize = 0usize $( + { let _ = stringify!($field); 1 } )+;
            const FIELD_FIXED_SIZES: &'static [Option<usize>] =
                &[ $( <$fty as $crate::schema::SszType>::FIXED_SIZE ),+ ];
        }

        impl $crate::schema::SszType for $name {
            const KIND: $crate::schema::Kind = $crate::schema::Kind::Container;
            const FIXED_SIZE: Option<usize> = {
                let mut all_fixed = true;
                let mut size = 0usize;
                $(
                    match <$fty as $crate::schema::SszType>::FIXED_SIZE {
                        Some(s) => size += s,
                        None => all_fixed = false,
                    }
                )+
                if all_fixed { Some(size) } else { None }
            };
            const MIN_SIZE: usize = 0usize $(
                + match <$fty as $crate::schema::SszType>::FIXED_SIZE {
                    Some(s) => s,
                    None => 4 + <$fty as $crate::schema::SszType>::MIN_SIZE,
                }
            )+;
            const MAX_SIZE: usize = 0usize $(
                + match <$fty as $crate::schema::SszType>::FIXED_SIZE {
                    Some(s) => s,
                    None => 4 + <$fty as $crate::schema::SszType>::MAX_SIZE,
                }
            )+;
            const CHUNK_COUNT: u64 =
                <Self as $crate::schema::ContainerSchema>::FIELD_COUNT as u64;
            const CHUNK_DEPTH: u32 = $crate::schema::ceil_log2(Self::CHUNK_COUNT);

            fn serialized_size(&self) -> usize {
                let mut size = 0usize;
                $(
                    size += match <$fty as $crate::schema::SszType>::FIXED_SIZE {
                        Some(s) => s,
                        None => 4 + $crate::schema::SszType::serialized_size(&self.$field),
                    };
                )+
                size
            }

            fn serialize_into(
                &self,
                out: &mut [u8],
            ) -> $crate::schema::TreeResult<usize> {
                let total = self.serialized_size();
                if out.len() < total {
                    return Err($crate::schema::TreeError::InvalidSize);
                }
                let mut fixed_at = 0usize;
                let mut variable_at = $crate::schema::container::fixed_section_size(
                    <Self as $crate::schema::ContainerSchema>::FIELD_FIXED_SIZES,
                );
                $(
                    match <$fty as $crate::schema::SszType>::FIXED_SIZE {
                        Some(s) => {
                            $crate::schema::SszType::serialize_into(
                                &self.$field,
                                &mut out[fixed_at..fixed_at + s],
                            )?;
                            fixed_at += s;
                        }
                        None => {
                            out[fixed_at..fixed_at + 4]
                                .copy_from_slice(&(variable_at as u32).to_le_bytes());
                            fixed_at += 4;
                            variable_at += $crate::schema::SszType::serialize_into(
                                &self.$field,
                                &mut out[variable_at..],
                            )?;
                        }
                    }
                )+
                let _ = fixed_at;
                Ok(variable_at)
            }

            fn deserialize(bytes: &[u8]) -> $crate::schema::TreeResult<Self> {
                let ranges = $crate::schema::container::field_ranges(
                    <Self as $crate::schema::ContainerSchema>::FIELD_FIXED_SIZES,
                    bytes,
                )?;
                let mut ranges = ranges.into_iter();
                $(
                    let $field = {
                        let range = ranges
                            .next()
                            .ok_or($crate::schema::TreeError::InvalidSize)?;
                        <$fty as $crate::schema::SszType>::deserialize(&bytes[range])?
                    };
                )+
                Ok(Self { $( $field ),+ })
            }

            fn hash_tree_root(&self) -> $crate::schema::Root {
                let chunks: Vec<$crate::schema::Root> =
                    vec![ $( $crate::schema::SszType::hash_tree_root(&self.$field) ),+ ];
                $crate::schema::merkleize_chunks(&chunks, Self::CHUNK_DEPTH)
            }

            fn tree_from_value(
                pool: &mut $crate::schema::NodePool,
                value: &Self,
            ) -> $crate::schema::TreeResult<$crate::schema::NodeId> {
                let nodes: Vec<$crate::schema::NodeId> = {
                    let mut nodes = Vec::new();
                    $(
                        nodes.push(<$fty as $crate::schema::SszType>::tree_from_value(
                            pool,
                            &value.$field,
                        )?);
                    )+
                    nodes
                };
                pool.fill_with_contents(&nodes, Self::CHUNK_DEPTH)
            }

            fn tree_to_value(
                pool: &mut $crate::schema::NodePool,
                root: $crate::schema::NodeId,
            ) -> $crate::schema::TreeResult<Self> {
                let mut field_index = 0u64;
                $(
                    let $field = {
                        let node = pool.get_node_at_depth(root, Self::CHUNK_DEPTH, field_index)?;
                        field_index += 1;
                        <$fty as $crate::schema::SszType>::tree_to_value(pool, node)?
                    };
                )+
                let _ = field_index;
                Ok(Self { $( $field ),+ })
            }
        }

        impl $crate::schema::SszComposite for $name {}

        impl $crate::TreeViewType for $name {
            type View = $crate::ContainerView<$name>;
        }
    };
}

/// Internal: emits one field marker per `(marker, field, type)` triple,
/// threading the running field index.
#[doc(hidden)]
#[macro_export]
macro_rules! ssz_container_fields {
    ($schema:ident, $idx:expr, ) => {};
    ($schema:ident, $idx:expr, ($marker:ident, $field:ident, $fty:ty) $( $rest:tt )* ) => {
        #[doc = concat!("Marker for field `", stringify!($field), "`.")]
        pub struct $marker;

        impl $crate::FieldOf<super::$schema> for $marker {
            type Type = $fty;
            const INDEX: usize = $idx;
        }

        $crate::ssz_container_fields!($schema, $idx + 1usize, $( $rest )* );
    };
}
