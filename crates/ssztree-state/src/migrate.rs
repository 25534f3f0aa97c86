// crates/ssztree-state/src/migrate.rs

//! Diff-load state migration.
//!
//! Rebuilds a state view from serialized bytes while reusing the seed
//! view's `validators` (and, post-altair, `inactivity_scores`) subtrees
//! wherever the serialized content is unchanged:
//!
//! 1. lower the new state with those two list fields blanked, then graft
//!    the seed's subtree handles over them (the cheap skeleton);
//! 2. find modified element indices with a divide-and-conquer byte
//!    comparison over the serialized overlap — unchanged halves terminate
//!    in one equality check;
//! 3. rebuild only the modified validators, reusing the seed's pubkey /
//!    withdrawal-credentials chunks when those bytes are equal;
//! 4. append or truncate on count changes, then commit once.
//!
//! Unchanged validators keep node identity with the seed, so a
//! near-identical snapshot costs `O(changed · log n)` instead of a full
//! registry rebuild.

use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::{NodeId, NodePool};
use ssztree_schema::container::field_ranges;
use ssztree_schema::{BasicList, ByteVector, ContainerSchema, SszBasic, SszType};
use ssztree_view::{BasicListView, CompositeListView, FieldOf, SharedStore, TreeView};

use crate::any_fork::AnyStateView;
use crate::containers::{
    altair_fields, phase0_fields, BeaconStateAltair, BeaconStateAltairView, BeaconStatePhase0,
    BeaconStatePhase0View, Validator, ValidatorRegistry, VALIDATOR_PUBKEY_RANGE,
    VALIDATOR_REGISTRY_LIMIT, VALIDATOR_WIRE_SIZE, VALIDATOR_WITHDRAWAL_RANGE,
};

/// Result of a diff-load.
#[derive(Debug)]
pub struct MigrationOutcome {
    /// The migrated, committed state view.
    pub view: AnyStateView,
    /// Validator indices whose serialized record changed, ascending. Count
    /// changes (appends/truncations) are not listed.
    pub modified_validators: Vec<u64>,
    /// Inactivity-score indices that changed, ascending (always empty when
    /// either side predates altair).
    pub modified_scores: Vec<u64>,
}

/// Load serialized altair-state `bytes` into a new view, reusing the
/// seed's unchanged subtrees. The seed may be either fork; the
/// inactivity-scores subtree is only shared when the seed is post-altair.
pub fn load_state_altair(
    seed: &mut AnyStateView,
    bytes: &[u8],
) -> TreeResult<MigrationOutcome> {
    seed.commit()?;
    let (store, seed_validators, seed_scores) = seed_handles(seed)?;

    // Parse the whole state, then blank the seeded lists so the lowering
    // skips building their subtrees.
    let mut value = BeaconStateAltair::deserialize(bytes)?;
    let new_validators = std::mem::take(&mut value.validators);
    let new_scores = std::mem::take(&mut value.inactivity_scores);
    let reuse_scores = seed_scores.is_some();
    if !reuse_scores {
        // Pre-altair seed: no subtree to share, lower the parsed scores.
        value.inactivity_scores = new_scores.clone();
    }

    let mut view = BeaconStateAltairView::from_value(&store, &value)?;
    view.set_child_node::<altair_fields::Validators>(seed_validators);
    if let Some(node) = seed_scores {
        view.set_child_node::<altair_fields::InactivityScores>(node);
    }

    let ranges = field_ranges(BeaconStateAltair::FIELD_FIXED_SIZES, bytes)?;
    let validators_range =
        ranges[<altair_fields::Validators as FieldOf<BeaconStateAltair>>::INDEX].clone();
    let scores_range =
        ranges[<altair_fields::InactivityScores as FieldOf<BeaconStateAltair>>::INDEX].clone();

    let mut validators_view = view.child::<altair_fields::Validators>()?;
    let modified_validators = reconcile_validators(
        &store,
        &mut validators_view,
        &new_validators,
        &bytes[validators_range],
    )?;
    if new_validators.len() < validators_view.length()? as usize {
        let replacement =
            truncated_registry(&store, &mut validators_view, new_validators.len())?;
        view.set_child::<altair_fields::Validators>(replacement)?;
    }

    let modified_scores = if reuse_scores {
        let mut scores_view = view.child::<altair_fields::InactivityScores>()?;
        let modified = reconcile_scores(&mut scores_view, &bytes[scores_range])?;
        if let Some(replacement) = truncate_scores(&store, &mut scores_view, &new_scores)? {
            view.set_child::<altair_fields::InactivityScores>(replacement)?;
        }
        modified
    } else {
        Vec::new()
    };

    view.commit()?;
    Ok(MigrationOutcome {
        view: AnyStateView::Altair(view),
        modified_validators,
        modified_scores,
    })
}

/// Phase0 variant of [`load_state_altair`]: only the validator registry is
/// seed-reused.
pub fn load_state_phase0(
    seed: &mut AnyStateView,
    bytes: &[u8],
) -> TreeResult<MigrationOutcome> {
    seed.commit()?;
    let (store, seed_validators, _) = seed_handles(seed)?;

    let mut value = BeaconStatePhase0::deserialize(bytes)?;
    let new_validators = std::mem::take(&mut value.validators);

    let mut view = BeaconStatePhase0View::from_value(&store, &value)?;
    view.set_child_node::<phase0_fields::Validators>(seed_validators);

    let ranges = field_ranges(BeaconStatePhase0::FIELD_FIXED_SIZES, bytes)?;
    let validators_range =
        ranges[<phase0_fields::Validators as FieldOf<BeaconStatePhase0>>::INDEX].clone();

    let mut validators_view = view.child::<phase0_fields::Validators>()?;
    let modified_validators = reconcile_validators(
        &store,
        &mut validators_view,
        &new_validators,
        &bytes[validators_range],
    )?;

    if new_validators.len() < validators_view.length()? as usize {
        let replacement = truncated_registry(&store, &mut validators_view, new_validators.len())?;
        view.set_child::<phase0_fields::Validators>(replacement)?;
    }

    view.commit()?;
    Ok(MigrationOutcome {
        view: AnyStateView::Phase0(view),
        modified_validators,
        modified_scores: Vec::new(),
    })
}

/* -------------------- shared machinery -------------------- */

/// Committed seed handles: the store plus the validators (and, for altair
/// seeds, inactivity-scores) subtree nodes.
fn seed_handles(seed: &mut AnyStateView) -> TreeResult<(SharedStore, NodeId, Option<NodeId>)> {
    match seed {
        AnyStateView::Phase0(v) => {
            let node = v.child_node::<phase0_fields::Validators>()?;
            Ok((SharedStore::clone(v.store()), node, None))
        }
        AnyStateView::Altair(v) => {
            let validators = v.child_node::<altair_fields::Validators>()?;
            let scores = v.child_node::<altair_fields::InactivityScores>()?;
            Ok((SharedStore::clone(v.store()), validators, Some(scores)))
        }
    }
}

/// Diff the serialized overlap and rebuild modified validators in place;
/// appends new entries past the seed count. Truncation is handled by the
/// caller (it replaces the child view).
fn reconcile_validators(
    store: &SharedStore,
    validators_view: &mut CompositeListView<Validator, VALIDATOR_REGISTRY_LIMIT>,
    new_validators: &ValidatorRegistry,
    new_bytes: &[u8],
) -> TreeResult<Vec<u64>> {
    if new_bytes.len() % VALIDATOR_WIRE_SIZE != 0 {
        return Err(TreeError::InvalidSize);
    }
    let new_count = new_bytes.len() / VALIDATOR_WIRE_SIZE;
    if new_count != new_validators.len() {
        return Err(TreeError::InvalidSize);
    }
    let seed_count = validators_view.length()? as usize;
    let min_count = seed_count.min(new_count);

    let seed_bytes = validators_view.serialize()?;
    let modified = diff_serialized_indices(
        &seed_bytes[..min_count * VALIDATOR_WIRE_SIZE],
        &new_bytes[..min_count * VALIDATOR_WIRE_SIZE],
        VALIDATOR_WIRE_SIZE,
    );

    let pool = store.borrow().pool_rc();
    for &index in &modified {
        let i = index as usize;
        let seed_node = validators_view.element_node(i)?;
        let node = {
            let mut pool = pool.borrow_mut();
            load_validator_with_seed_reuse(
                &mut pool,
                seed_node,
                &seed_bytes[i * VALIDATOR_WIRE_SIZE..(i + 1) * VALIDATOR_WIRE_SIZE],
                &new_bytes[i * VALIDATOR_WIRE_SIZE..(i + 1) * VALIDATOR_WIRE_SIZE],
            )?
        };
        validators_view.set_element_node(i, node)?;
    }

    for validator in &new_validators.as_slice()[min_count..] {
        validators_view.push_value(validator)?;
    }
    Ok(modified)
}

fn truncated_registry(
    store: &SharedStore,
    validators_view: &mut CompositeListView<Validator, VALIDATOR_REGISTRY_LIMIT>,
    new_count: usize,
) -> TreeResult<CompositeListView<Validator, VALIDATOR_REGISTRY_LIMIT>> {
    if new_count == 0 {
        CompositeListView::from_value(store, &ValidatorRegistry::default())
    } else {
        validators_view.slice_to(new_count - 1)
    }
}

/// Diff and update the inactivity scores over the serialized overlap.
fn reconcile_scores(
    scores_view: &mut BasicListView<u64, VALIDATOR_REGISTRY_LIMIT>,
    new_bytes: &[u8],
) -> TreeResult<Vec<u64>> {
    const STRIDE: usize = <u64 as SszBasic>::SIZE;
    if new_bytes.len() % STRIDE != 0 {
        return Err(TreeError::InvalidSize);
    }
    let new_count = new_bytes.len() / STRIDE;
    let seed_count = scores_view.length()? as usize;
    let min_count = seed_count.min(new_count);

    let seed_bytes = scores_view.serialize()?;
    let modified = diff_serialized_indices(
        &seed_bytes[..min_count * STRIDE],
        &new_bytes[..min_count * STRIDE],
        STRIDE,
    );
    for &index in &modified {
        let i = index as usize;
        let mut le = [0u8; STRIDE];
        le.copy_from_slice(&new_bytes[i * STRIDE..(i + 1) * STRIDE]);
        scores_view.set(i, u64::from_le_bytes(le))?;
    }
    for i in min_count..new_count {
        let mut le = [0u8; STRIDE];
        le.copy_from_slice(&new_bytes[i * STRIDE..(i + 1) * STRIDE]);
        scores_view.push(u64::from_le_bytes(le))?;
    }
    Ok(modified)
}

/// Replacement child when the new score list is shorter than the seed's.
fn truncate_scores(
    store: &SharedStore,
    scores_view: &mut BasicListView<u64, VALIDATOR_REGISTRY_LIMIT>,
    new_scores: &BasicList<u64, VALIDATOR_REGISTRY_LIMIT>,
) -> TreeResult<Option<BasicListView<u64, VALIDATOR_REGISTRY_LIMIT>>> {
    if new_scores.len() < scores_view.length()? as usize {
        if new_scores.is_empty() {
            Ok(Some(BasicListView::from_value(store, &BasicList::default())?))
        } else {
            Ok(Some(scores_view.slice_to(new_scores.len() - 1)?))
        }
    } else {
        Ok(None)
    }
}

/// Rebuild one validator subtree, reusing the seed's pubkey and
/// withdrawal-credentials chunks when those byte ranges are equal. Falls
/// back to a full lowering when both differ.
fn load_validator_with_seed_reuse(
    pool: &mut NodePool,
    seed_node: NodeId,
    seed_bytes: &[u8],
    new_bytes: &[u8],
) -> TreeResult<NodeId> {
    debug_assert_eq!(seed_bytes.len(), VALIDATOR_WIRE_SIZE);
    debug_assert_eq!(new_bytes.len(), VALIDATOR_WIRE_SIZE);

    let pubkey_same =
        seed_bytes[VALIDATOR_PUBKEY_RANGE] == new_bytes[VALIDATOR_PUBKEY_RANGE];
    let credentials_same =
        seed_bytes[VALIDATOR_WITHDRAWAL_RANGE] == new_bytes[VALIDATOR_WITHDRAWAL_RANGE];
    if !pubkey_same && !credentials_same {
        let value = Validator::deserialize(new_bytes)?;
        return Validator::tree_from_value(pool, &value);
    }

    let depth = Validator::CHUNK_DEPTH;
    let mut nodes = Vec::with_capacity(8);

    nodes.push(if pubkey_same {
        pool.get_node_at_depth(seed_node, depth, 0)?
    } else {
        let pubkey = ByteVector::<48>::from_bytes(&new_bytes[VALIDATOR_PUBKEY_RANGE])?;
        ByteVector::<48>::tree_from_value(pool, &pubkey)?
    });
    nodes.push(if credentials_same {
        pool.get_node_at_depth(seed_node, depth, 1)?
    } else {
        let mut chunk = [0u8; 32];
        chunk.copy_from_slice(&new_bytes[VALIDATOR_WITHDRAWAL_RANGE]);
        pool.create_leaf(chunk)
    });

    // effective_balance, then slashed, then the four epochs.
    let mut le = [0u8; 8];
    le.copy_from_slice(&new_bytes[80..88]);
    nodes.push(pool.create_leaf_from_uint(u64::from_le_bytes(le)));
    nodes.push(pool.create_leaf_from_uint(u64::from(new_bytes[88])));
    for k in 0..4 {
        let at = 89 + 8 * k;
        le.copy_from_slice(&new_bytes[at..at + 8]);
        nodes.push(pool.create_leaf_from_uint(u64::from_le_bytes(le)));
    }

    pool.fill_with_contents(&nodes, depth)
}

/// Indices (by `stride`-sized element) where `a` and `b` differ, found by
/// midpoint recursion: byte-equal ranges terminate in one comparison.
#[must_use]
pub fn diff_serialized_indices(a: &[u8], b: &[u8], stride: usize) -> Vec<u64> {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len() % stride, 0);
    let mut out = Vec::new();
    diff_rec(a, b, stride, 0, a.len() / stride, &mut out);
    out
}

fn diff_rec(a: &[u8], b: &[u8], stride: usize, lo: usize, hi: usize, out: &mut Vec<u64>) {
    if lo >= hi || a[lo * stride..hi * stride] == b[lo * stride..hi * stride] {
        return;
    }
    if hi - lo == 1 {
        out.push(lo as u64);
        return;
    }
    let mid = lo + (hi - lo) / 2;
    diff_rec(a, b, stride, lo, mid, out);
    diff_rec(a, b, stride, mid, hi, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_finds_exact_indices() {
        let a = vec![0u8; 8 * 10];
        let mut b = a.clone();
        b[8 * 3] = 1; // element 3
        b[8 * 7 + 5] = 9; // element 7
        assert_eq!(diff_serialized_indices(&a, &b, 8), vec![3, 7]);
        assert_eq!(diff_serialized_indices(&a, &a, 8), Vec::<u64>::new());
    }

    #[test]
    fn diff_handles_odd_counts_and_edges() {
        let a = vec![7u8; 121 * 5];
        let mut b = a.clone();
        b[0] = 0; // element 0
        b[121 * 4 + 120] = 0; // last byte of last element
        assert_eq!(diff_serialized_indices(&a, &b, 121), vec![0, 4]);
    }
}
