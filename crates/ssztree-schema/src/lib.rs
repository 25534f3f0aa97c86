// crates/ssztree-schema/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! SSZ type descriptors.
//!
//! Every supported SSZ type implements [`SszType`]: the canonical wire
//! codec, the hash-tree-root, and the *tree lowering* functions that turn a
//! value into a pool subtree and back. Basic uints and bool additionally
//! implement [`SszBasic`] (packed chunk slots); everything that owns its
//! own subtree implements the [`SszComposite`] marker.
//!
//! Containers are declared with the `ssz_container!` macro from
//! `ssztree-view`, which builds on [`container::ContainerSchema`] here.

pub mod bits;
pub mod container;
pub mod list;
pub mod types;
pub mod vector;

// ---- Re-exports for workspace compatibility ----
pub use bits::{Bitlist, Bitvector};
pub use container::ContainerSchema;
pub use list::{BasicList, CompositeList};
pub use types::{Kind, SszBasic, SszComposite, SszType};
pub use vector::{BasicVector, ByteVector, CompositeVector};

// Underlying primitives, re-exported so schema consumers (and the
// `ssz_container!` expansion) need only one path.
pub use ssztree_core::gindex::ceil_log2;
pub use ssztree_core::hash::Root;
pub use ssztree_core::merkleize::merkleize_chunks;
pub use ssztree_core::{TreeError, TreeResult};
pub use ssztree_pool::{NodeId, NodePool};
