// crates/ssztree-core/src/error.rs

//! Closed error taxonomy for the tree core.
//!
//! Every fallible operation in the pool/view layers returns one of these
//! variants; nothing is swallowed. File and process boundaries (snapshot
//! I/O, CLI) wrap them in `anyhow` with context instead.

use thiserror::Error;

/// Errors surfaced by the node pool, schema codec, and view layers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// Element or field index outside the current bounds.
    #[error("index out of bounds")]
    IndexOutOfBounds,

    /// A list grew past its schema-level limit.
    #[error("length over limit")]
    LengthOverLimit,

    /// Serialized input (or an output buffer) has the wrong size.
    #[error("invalid size")]
    InvalidSize,

    /// A gindex does not address a node of the current tree shape.
    #[error("invalid gindex")]
    InvalidGindex,

    /// Commit saw a dirty gindex with neither a cached node nor a cached
    /// view. Indicates an internal invariant break.
    #[error("child not found for dirty gindex")]
    ChildNotFound,

    /// Container commit expected a cached value node at a basic field.
    #[error("missing child value")]
    MissingChildValue,

    /// Container commit expected a cached child view at a composite field.
    #[error("missing child view")]
    MissingChildView,

    /// A subview from one store was assigned into a view of another.
    #[error("child view belongs to a different store")]
    DifferentStore,

    /// A packed-slot accessor was called on a non-basic type.
    #[error("unsupported composite type")]
    UnsupportedCompositeType,

    /// JSON snapshot failed to parse.
    #[error("invalid json")]
    InvalidJson,
}

/// Shorthand used across the workspace.
pub type TreeResult<T> = Result<T, TreeError>;
