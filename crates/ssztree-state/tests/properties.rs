//! Property: for any set of validator mutations, diff-load reports exactly
//! the mutated indices and reproduces the from-value root.

#![deny(rust_2018_idioms)]

use proptest::prelude::*;
use ssztree_schema::SszType;
use ssztree_state::generator::generate_state;
use ssztree_state::{load_state_altair, AnyState, AnyStateView, BeaconStateAltair, ForkName};
use ssztree_view::ViewStore;

fn altair(state: AnyState) -> BeaconStateAltair {
    match state {
        AnyState::Altair(s) => s,
        AnyState::Phase0(_) => unreachable!("generator was asked for altair"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24, // migrations are not free; keep CI predictable
        .. ProptestConfig::default()
    })]

    #[test]
    fn diff_load_reports_exactly_the_mutated_indices(
        n in 4usize..24,
        raw_flips in proptest::collection::btree_set(0usize..24, 0..4),
        seed in any::<u64>(),
    ) {
        let flips: Vec<usize> = raw_flips.into_iter().filter(|&i| i < n).collect();

        let seed_state = altair(generate_state(ForkName::Altair, n, seed));
        let mut new_state = seed_state.clone();
        for &i in &flips {
            let mut v = new_state.validators.get(i).unwrap().clone();
            v.effective_balance += 1;
            new_state.validators.set(i, v).unwrap();
        }

        let store = ViewStore::with_new_pool();
        let mut seed_view =
            AnyStateView::from_value(&store, &AnyState::Altair(seed_state)).unwrap();
        let bytes = new_state.serialize().unwrap();
        let mut outcome = load_state_altair(&mut seed_view, &bytes).unwrap();

        let expect: Vec<u64> = flips.iter().map(|&i| i as u64).collect();
        prop_assert_eq!(outcome.modified_validators, expect);
        prop_assert_eq!(
            outcome.view.hash_tree_root().unwrap(),
            new_state.hash_tree_root()
        );
    }
}
