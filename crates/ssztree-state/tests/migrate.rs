//! Diff-load migration behavior: modified-index reporting, seed subtree
//! sharing, pubkey chunk reuse, and count changes.

#![deny(rust_2018_idioms)]

use ssztree_core::gindex::from_depth;
use ssztree_pool::NodeId;
use ssztree_schema::SszType;
use ssztree_state::generator::generate_state;
use ssztree_state::{
    altair_fields, load_state_altair, AnyState, AnyStateView, BeaconStateAltair, ForkName,
    Validator, VALIDATOR_WIRE_SIZE,
};
use ssztree_view::{FieldOf, TreeView, ViewStore};

const VALIDATORS_INDEX: u64 =
    <altair_fields::Validators as FieldOf<BeaconStateAltair>>::INDEX as u64;
const REGISTRY_DEPTH: u32 = 40;

fn altair(state: AnyState) -> BeaconStateAltair {
    match state {
        AnyState::Altair(s) => s,
        AnyState::Phase0(_) => unreachable!("generator was asked for altair"),
    }
}

/// Validator element subtree node inside a committed state tree.
fn validator_node(
    pool: &ssztree_pool::NodePool,
    state_root: NodeId,
    index: u64,
) -> NodeId {
    let validators = pool
        .get_node(
            state_root,
            from_depth(BeaconStateAltair::CHUNK_DEPTH, VALIDATORS_INDEX),
        )
        .unwrap();
    pool.get_node(validators, from_depth(REGISTRY_DEPTH + 1, index))
        .unwrap()
}

#[test]
fn withdrawal_flip_reuses_everything_else() {
    let store = ViewStore::with_new_pool();
    let seed_state = altair(generate_state(ForkName::Altair, 64, 42));

    // Flip the withdrawal credentials of validator 3.
    let mut new_state = seed_state.clone();
    let mut flipped = new_state.validators.get(3).unwrap().clone();
    let mut credentials = [0u8; 32];
    credentials.copy_from_slice(flipped.withdrawal_credentials.as_slice());
    for b in &mut credentials {
        *b ^= 0xff;
    }
    flipped.withdrawal_credentials =
        ssztree_schema::ByteVector::from_bytes(&credentials).unwrap();
    new_state.validators.set(3, flipped).unwrap();

    let mut seed = AnyStateView::from_value(&store, &AnyState::Altair(seed_state.clone()))
        .unwrap();
    let seed_root_node = match &seed {
        AnyStateView::Altair(v) => v.root_node(),
        AnyStateView::Phase0(_) => unreachable!(),
    };

    let bytes = new_state.serialize().unwrap();
    let mut outcome = load_state_altair(&mut seed, &bytes).unwrap();

    assert_eq!(outcome.modified_validators, vec![3]);
    assert!(outcome.modified_scores.is_empty());
    assert_eq!(
        outcome.view.hash_tree_root().unwrap(),
        new_state.hash_tree_root()
    );

    let new_root_node = match &outcome.view {
        AnyStateView::Altair(v) => v.root_node(),
        AnyStateView::Phase0(_) => unreachable!(),
    };
    let pool_rc = store.borrow().pool_rc();
    let pool = pool_rc.borrow();

    // Every untouched validator shares node identity with the seed.
    for i in (0..64).filter(|&i| i != 3) {
        assert_eq!(
            validator_node(&pool, seed_root_node, i),
            validator_node(&pool, new_root_node, i),
            "validator {i} must be shared"
        );
    }

    // Validator 3 was rebuilt, but its pubkey chunk is the seed's node.
    let seed_v3 = validator_node(&pool, seed_root_node, 3);
    let new_v3 = validator_node(&pool, new_root_node, 3);
    assert_ne!(seed_v3, new_v3);
    assert_eq!(
        pool.get_node(seed_v3, from_depth(3, 0)).unwrap(),
        pool.get_node(new_v3, from_depth(3, 0)).unwrap(),
        "pubkey chunk must be reused"
    );
    assert_ne!(
        pool.get_node(seed_v3, from_depth(3, 1)).unwrap(),
        pool.get_node(new_v3, from_depth(3, 1)).unwrap(),
        "withdrawal-credentials chunk must differ"
    );
}

#[test]
fn identical_snapshot_reports_no_changes() {
    let store = ViewStore::with_new_pool();
    let state = altair(generate_state(ForkName::Altair, 32, 7));
    let mut seed = AnyStateView::from_value(&store, &AnyState::Altair(state.clone())).unwrap();

    let bytes = state.serialize().unwrap();
    let mut outcome = load_state_altair(&mut seed, &bytes).unwrap();
    assert!(outcome.modified_validators.is_empty());
    assert!(outcome.modified_scores.is_empty());
    assert_eq!(outcome.view.hash_tree_root().unwrap(), state.hash_tree_root());
}

#[test]
fn score_change_is_reported_and_applied() {
    let store = ViewStore::with_new_pool();
    let state = altair(generate_state(ForkName::Altair, 32, 11));
    let mut new_state = state.clone();
    let bumped = new_state.inactivity_scores.get(5).unwrap() + 17;
    // Rebuild the list with one element changed.
    let mut scores: Vec<u64> = new_state.inactivity_scores.as_slice().to_vec();
    scores[5] = bumped;
    new_state.inactivity_scores =
        ssztree_schema::BasicList::from_elements(scores).unwrap();

    let mut seed = AnyStateView::from_value(&store, &AnyState::Altair(state)).unwrap();
    let bytes = new_state.serialize().unwrap();
    let mut outcome = load_state_altair(&mut seed, &bytes).unwrap();

    assert!(outcome.modified_validators.is_empty());
    assert_eq!(outcome.modified_scores, vec![5]);
    assert_eq!(
        outcome.view.hash_tree_root().unwrap(),
        new_state.hash_tree_root()
    );
}

#[test]
fn appended_validators_are_pushed() {
    let store = ViewStore::with_new_pool();
    let state = altair(generate_state(ForkName::Altair, 16, 3));
    // The 24-validator state from the same seed starts with the same 16
    // validators, so only the appended tail differs.
    let grown = altair(generate_state(ForkName::Altair, 24, 3));
    assert_eq!(
        state.validators.get(0).unwrap(),
        grown.validators.get(0).unwrap()
    );

    let mut seed = AnyStateView::from_value(&store, &AnyState::Altair(state)).unwrap();
    let bytes = grown.serialize().unwrap();
    let mut outcome = load_state_altair(&mut seed, &bytes).unwrap();

    assert!(outcome.modified_validators.is_empty());
    assert_eq!(
        outcome.view.hash_tree_root().unwrap(),
        grown.hash_tree_root()
    );
}

#[test]
fn truncated_validators_share_kept_prefix() {
    let store = ViewStore::with_new_pool();
    let state = altair(generate_state(ForkName::Altair, 24, 3));
    let shrunk = altair(generate_state(ForkName::Altair, 16, 3));

    let mut seed = AnyStateView::from_value(&store, &AnyState::Altair(state)).unwrap();
    let seed_root_node = match &seed {
        AnyStateView::Altair(v) => v.root_node(),
        AnyStateView::Phase0(_) => unreachable!(),
    };
    let bytes = shrunk.serialize().unwrap();
    let mut outcome = load_state_altair(&mut seed, &bytes).unwrap();

    assert!(outcome.modified_validators.is_empty());
    assert_eq!(
        outcome.view.hash_tree_root().unwrap(),
        shrunk.hash_tree_root()
    );

    let new_root_node = match &outcome.view {
        AnyStateView::Altair(v) => v.root_node(),
        AnyStateView::Phase0(_) => unreachable!(),
    };
    let pool_rc = store.borrow().pool_rc();
    let pool = pool_rc.borrow();
    for i in 0..16 {
        assert_eq!(
            validator_node(&pool, seed_root_node, i),
            validator_node(&pool, new_root_node, i),
            "kept validator {i} must be shared"
        );
    }
}

#[test]
fn pubkey_and_credentials_change_falls_back_to_full_rebuild() {
    let store = ViewStore::with_new_pool();
    let state = altair(generate_state(ForkName::Altair, 8, 19));
    let mut new_state = state.clone();
    let replacement = Validator {
        pubkey: ssztree_schema::ByteVector::from_bytes(&[0xab; 48]).unwrap(),
        withdrawal_credentials: ssztree_schema::ByteVector::from_bytes(&[0xcd; 32]).unwrap(),
        ..new_state.validators.get(2).unwrap().clone()
    };
    new_state.validators.set(2, replacement).unwrap();

    let mut seed = AnyStateView::from_value(&store, &AnyState::Altair(state)).unwrap();
    let bytes = new_state.serialize().unwrap();
    let mut outcome = load_state_altair(&mut seed, &bytes).unwrap();

    assert_eq!(outcome.modified_validators, vec![2]);
    assert_eq!(
        outcome.view.hash_tree_root().unwrap(),
        new_state.hash_tree_root()
    );
}

#[test]
fn validator_wire_size_assumption_holds() {
    // The 121-byte stride the differ relies on.
    let v = Validator::default();
    assert_eq!(v.serialize().unwrap().len(), VALIDATOR_WIRE_SIZE);
}
