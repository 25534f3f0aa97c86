// crates/ssztree-view/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Mutable tree views over SSZ values.
//!
//! - [`ViewStore`] owns all per-view state (root handle, cached child
//!   nodes, cached child views, dirty set) over a shared node pool.
//! - Typed views are thin `(store, id)` handles implementing the
//!   [`TreeView`] capability set; mutations stage nodes in the store and
//!   `commit` folds them into a new root with one batched pool update.
//! - Containers are declared with [`ssz_container!`], which generates the
//!   value struct, its schema descriptor, and typed field markers.

mod chunks;
pub mod store;
pub mod view;
pub mod views;

/// Schema re-export so `ssz_container!` expansions resolve through one
/// path.
pub use ssztree_schema as schema;

// ---- Re-exports for workspace compatibility ----
pub use store::{SharedStore, ViewId, ViewStore};
pub use view::{FieldOf, TreeView, TreeViewType};
pub use views::{
    BasicListView, BasicVectorView, BitlistView, BitvectorView, CompositeListView,
    CompositeVectorView, ContainerView,
};
