// crates/ssztree-state/src/any_fork.rs

//! Fork-tagged wrappers over the per-fork state types and views.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ssztree_core::hash::Root;
use ssztree_core::{TreeError, TreeResult};
use ssztree_view::{SharedStore, TreeView};

use crate::containers::{
    BeaconStateAltair, BeaconStateAltairView, BeaconStatePhase0, BeaconStatePhase0View,
};
use ssztree_schema::SszType;

/// The forks this crate models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkName {
    /// Genesis fork.
    Phase0,
    /// Adds participation and inactivity tracking.
    Altair,
}

impl ForkName {
    /// Whether the fork carries `inactivity_scores`.
    #[inline]
    #[must_use]
    pub const fn has_inactivity_scores(self) -> bool {
        matches!(self, Self::Altair)
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phase0 => write!(f, "phase0"),
            Self::Altair => write!(f, "altair"),
        }
    }
}

impl FromStr for ForkName {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phase0" => Ok(Self::Phase0),
            "altair" => Ok(Self::Altair),
            _ => Err(TreeError::InvalidJson),
        }
    }
}

/// A state value of either fork, tagged for JSON/CBOR snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fork", rename_all = "lowercase")]
pub enum AnyState {
    /// Phase0 state value.
    Phase0(BeaconStatePhase0),
    /// Altair state value.
    Altair(BeaconStateAltair),
}

impl AnyState {
    /// The fork this value belongs to.
    #[must_use]
    pub const fn fork(&self) -> ForkName {
        match self {
            Self::Phase0(_) => ForkName::Phase0,
            Self::Altair(_) => ForkName::Altair,
        }
    }

    /// Number of registered validators.
    #[must_use]
    pub fn validator_count(&self) -> usize {
        match self {
            Self::Phase0(s) => s.validators.len(),
            Self::Altair(s) => s.validators.len(),
        }
    }

    /// Canonical hash-tree-root.
    #[must_use]
    pub fn hash_tree_root(&self) -> Root {
        match self {
            Self::Phase0(s) => s.hash_tree_root(),
            Self::Altair(s) => s.hash_tree_root(),
        }
    }

    /// Canonical SSZ encoding.
    pub fn to_ssz_bytes(&self) -> TreeResult<Vec<u8>> {
        match self {
            Self::Phase0(s) => SszType::serialize(s),
            Self::Altair(s) => SszType::serialize(s),
        }
    }

    /// Parse a state of the given fork from canonical SSZ bytes.
    pub fn from_ssz_bytes(fork: ForkName, bytes: &[u8]) -> TreeResult<Self> {
        Ok(match fork {
            ForkName::Phase0 => Self::Phase0(<BeaconStatePhase0 as SszType>::deserialize(bytes)?),
            ForkName::Altair => Self::Altair(<BeaconStateAltair as SszType>::deserialize(bytes)?),
        })
    }
}

/// A mutable state view of either fork.
#[derive(Clone, Debug)]
pub enum AnyStateView {
    /// Phase0 state view.
    Phase0(BeaconStatePhase0View),
    /// Altair state view.
    Altair(BeaconStateAltairView),
}

impl AnyStateView {
    /// Lower a state value into `store` and open a view over it.
    pub fn from_value(store: &SharedStore, value: &AnyState) -> TreeResult<Self> {
        Ok(match value {
            AnyState::Phase0(s) => Self::Phase0(BeaconStatePhase0View::from_value(store, s)?),
            AnyState::Altair(s) => Self::Altair(BeaconStateAltairView::from_value(store, s)?),
        })
    }

    /// The fork this view presents.
    #[must_use]
    pub const fn fork(&self) -> ForkName {
        match self {
            Self::Phase0(_) => ForkName::Phase0,
            Self::Altair(_) => ForkName::Altair,
        }
    }

    /// Fold pending changes into a new committed root.
    pub fn commit(&mut self) -> TreeResult<()> {
        match self {
            Self::Phase0(v) => v.commit(),
            Self::Altair(v) => v.commit(),
        }
    }

    /// Hash-tree-root after an implicit commit.
    pub fn hash_tree_root(&mut self) -> TreeResult<Root> {
        match self {
            Self::Phase0(v) => v.hash_tree_root(),
            Self::Altair(v) => v.hash_tree_root(),
        }
    }

    /// Canonical SSZ encoding of the current value.
    pub fn serialize(&mut self) -> TreeResult<Vec<u8>> {
        match self {
            Self::Phase0(v) => v.serialize(),
            Self::Altair(v) => v.serialize(),
        }
    }

    /// Read the whole state value back out.
    pub fn to_value(&mut self) -> TreeResult<AnyState> {
        Ok(match self {
            Self::Phase0(v) => AnyState::Phase0(v.to_value()?),
            Self::Altair(v) => AnyState::Altair(v.to_value()?),
        })
    }

    /// Tear the view down, recursively destroying owned child views.
    pub fn destroy(self) {
        match self {
            Self::Phase0(v) => v.destroy(),
            Self::Altair(v) => v.destroy(),
        }
    }
}
