//! End-to-end view behavior: wire vectors, mutation roundtrips, commit
//! semantics, clone isolation, and slice sharing.

#![deny(rust_2018_idioms)]

use ssztree_schema::{BasicList, BasicVector, SszType};
use ssztree_view::{TreeView, ViewStore};

ssztree_view::ssz_container! {
    module two_uints_fields;
    /// Two-uint test container.
    pub struct TwoUints {
        pub a: u64 => A,
        pub b: u64 => B,
    }
}

ssztree_view::ssz_container! {
    module list_and_uint_fields;
    /// A variable list next to a fixed uint.
    pub struct ListAndUint {
        pub a: BasicList<u64, 128> => A,
        pub b: u64 => B,
    }
}

#[test]
fn container_serializes_fields_at_offsets() {
    let value = TwoUints { a: 123, b: 456 };
    let bytes = value.serialize().unwrap();
    assert_eq!(
        bytes,
        vec![0x7b, 0, 0, 0, 0, 0, 0, 0, 0xc8, 0x01, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(TwoUints::deserialize(&bytes).unwrap(), value);
}

#[test]
fn container_basic_field_set_reaches_the_root() {
    let store = ViewStore::with_new_pool();
    let mut view =
        ssztree_view::ContainerView::<TwoUints>::from_value(&store, &TwoUints { a: 123, b: 456 })
            .unwrap();

    assert_eq!(view.get::<two_uints_fields::A>().unwrap(), 123);
    view.set::<two_uints_fields::A>(1230).unwrap();
    assert_eq!(view.get::<two_uints_fields::A>().unwrap(), 1230);

    let root = view.hash_tree_root().unwrap();
    assert_eq!(root, TwoUints { a: 1230, b: 456 }.hash_tree_root());
    assert_eq!(view.to_value().unwrap(), TwoUints { a: 1230, b: 456 });
    view.destroy();
}

#[test]
fn vector_u8_mutation_roundtrip() {
    let store = ViewStore::with_new_pool();
    let start = BasicVector::<u8, 4>::from_elements(vec![11, 22, 33, 44]).unwrap();
    let mut view = ssztree_view::BasicVectorView::<u8, 4>::from_value(&store, &start).unwrap();

    view.set(1, 77).unwrap();
    view.set(2, 88).unwrap();
    view.commit().unwrap();

    let expect = BasicVector::<u8, 4>::from_elements(vec![11, 77, 88, 44]).unwrap();
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    assert_eq!(view.to_value().unwrap(), expect);
    assert_eq!(view.get_all().unwrap(), vec![11, 77, 88, 44]);
    view.destroy();
}

#[test]
fn container_with_empty_list_wire_and_root() {
    let value = ListAndUint { a: BasicList::default(), b: 0 };
    let bytes = value.serialize().unwrap();
    assert_eq!(bytes, vec![0x0c, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        hex::encode(value.hash_tree_root()),
        "dc3619cbbc5ef0e0a3b38e3ca5d31c2b16868eacb6e4bcf8b4510963354315f5"
    );

    // Through a view, after an implicit commit.
    let store = ViewStore::with_new_pool();
    let mut view =
        ssztree_view::ContainerView::<ListAndUint>::from_value(&store, &value).unwrap();
    assert_eq!(view.serialize().unwrap(), bytes);
    assert_eq!(view.hash_tree_root().unwrap(), value.hash_tree_root());
    view.destroy();
}

#[test]
fn nested_list_mutation_through_child_view() {
    let store = ViewStore::with_new_pool();
    let start = ListAndUint {
        a: BasicList::from_elements(vec![1, 2, 3]).unwrap(),
        b: 9,
    };
    let mut view = ssztree_view::ContainerView::<ListAndUint>::from_value(&store, &start).unwrap();

    {
        let mut list = view.child::<list_and_uint_fields::A>().unwrap();
        list.set(0, 100).unwrap();
        list.push(4).unwrap();
    }
    // A second `child` call resolves to the same underlying view.
    {
        let mut list = view.child::<list_and_uint_fields::A>().unwrap();
        assert_eq!(list.get(0).unwrap(), 100);
        assert_eq!(list.length().unwrap(), 4);
    }

    let expect = ListAndUint {
        a: BasicList::from_elements(vec![100, 2, 3, 4]).unwrap(),
        b: 9,
    };
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    view.destroy();
}

#[test]
fn commit_is_idempotent() {
    let store = ViewStore::with_new_pool();
    let start = BasicList::<u64, 128>::from_elements(vec![5, 6, 7]).unwrap();
    let mut view =
        ssztree_view::BasicListView::<u64, 128>::from_value(&store, &start).unwrap();

    view.set(1, 66).unwrap();
    view.commit().unwrap();
    let first = view.root_node();
    let first_hash = view.hash_tree_root().unwrap();
    view.commit().unwrap();
    assert_eq!(view.root_node(), first);
    assert_eq!(view.hash_tree_root().unwrap(), first_hash);
    view.destroy();
}

#[test]
fn clone_without_transfer_leaves_source_untouched() {
    let store = ViewStore::with_new_pool();
    let start = BasicList::<u64, 128>::from_elements(vec![1, 2, 3, 4]).unwrap();
    let mut view =
        ssztree_view::BasicListView::<u64, 128>::from_value(&store, &start).unwrap();
    let source_root = view.hash_tree_root().unwrap();

    let mut clone = view.clone_view(false).unwrap();
    assert_eq!(clone.hash_tree_root().unwrap(), source_root);

    clone.set(0, 99).unwrap();
    clone.commit().unwrap();
    assert_ne!(clone.hash_tree_root().unwrap(), source_root);
    assert_eq!(view.hash_tree_root().unwrap(), source_root);
    assert_eq!(view.get(0).unwrap(), 1);

    clone.destroy();
    view.destroy();
}

#[test]
fn list_push_and_limit() {
    let store = ViewStore::with_new_pool();
    let mut view = ssztree_view::BasicListView::<u8, 4>::from_value(
        &store,
        &BasicList::default(),
    )
    .unwrap();

    for v in [1u8, 2, 3, 4] {
        view.push(v).unwrap();
    }
    assert_eq!(view.length().unwrap(), 4);
    assert_eq!(
        view.push(5).unwrap_err(),
        ssztree_core::TreeError::LengthOverLimit
    );

    let expect = BasicList::<u8, 4>::from_elements(vec![1, 2, 3, 4]).unwrap();
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    view.destroy();
}

#[test]
fn empty_list_root_through_view() {
    let store = ViewStore::with_new_pool();
    let mut view = ssztree_view::BasicListView::<u8, 128>::from_value(
        &store,
        &BasicList::default(),
    )
    .unwrap();
    assert_eq!(
        hex::encode(view.hash_tree_root().unwrap()),
        "28ba1834a3a7b657460ce79fa3a1d909ab8828fd557659d4d0554a9bdbc0ec30"
    );
    view.destroy();
}

#[test]
fn slice_to_shares_kept_chunks() {
    let store = ViewStore::with_new_pool();
    let values: Vec<u64> = (0..40).collect();
    let start = BasicList::<u64, 256>::from_elements(values.clone()).unwrap();
    let mut view =
        ssztree_view::BasicListView::<u64, 256>::from_value(&store, &start).unwrap();

    // Keep [0, 7]: two full chunks of four u64, no tail zeroing needed.
    let mut sliced = view.slice_to(7).unwrap();
    assert_eq!(sliced.length().unwrap(), 8);
    let expect = BasicList::<u64, 256>::from_elements(values[..8].to_vec()).unwrap();
    assert_eq!(sliced.hash_tree_root().unwrap(), expect.hash_tree_root());

    // The kept chunk leaves are the source's nodes, by identity.
    let pool = store.borrow().pool_rc();
    let src_root = view.root_node();
    let dst_root = sliced.root_node();
    {
        let pool = pool.borrow();
        let depth = 7; // 256 u64 / 4 per chunk = 64 chunks + 1 for the length mix-in
        for i in 0..2u64 {
            let a = pool
                .get_node(src_root, ssztree_core::gindex::from_depth(depth, i))
                .unwrap();
            let b = pool
                .get_node(dst_root, ssztree_core::gindex::from_depth(depth, i))
                .unwrap();
            assert_eq!(a, b, "kept chunk {i} must share node identity");
        }
    }

    // Unaligned cut inside a chunk zeroes the tail items.
    let mut sliced = view.slice_to(9).unwrap();
    let expect = BasicList::<u64, 256>::from_elements(values[..10].to_vec()).unwrap();
    assert_eq!(sliced.hash_tree_root().unwrap(), expect.hash_tree_root());

    // slice_to(length - 1) reproduces the source root.
    let mut whole = view.slice_to(39).unwrap();
    assert_eq!(
        whole.hash_tree_root().unwrap(),
        view.hash_tree_root().unwrap()
    );

    view.destroy();
}

#[test]
fn slice_from_aligned_and_unaligned() {
    let store = ViewStore::with_new_pool();
    let values: Vec<u64> = (100..140).collect();
    let start = BasicList::<u64, 256>::from_elements(values.clone()).unwrap();
    let mut view =
        ssztree_view::BasicListView::<u64, 256>::from_value(&store, &start).unwrap();

    // slice_from(0) reproduces the source root.
    let mut whole = view.slice_from(0).unwrap();
    assert_eq!(
        whole.hash_tree_root().unwrap(),
        view.hash_tree_root().unwrap()
    );

    // Chunk-aligned start (4 u64 per chunk).
    let mut tail = view.slice_from(8).unwrap();
    let expect = BasicList::<u64, 256>::from_elements(values[8..].to_vec()).unwrap();
    assert_eq!(tail.hash_tree_root().unwrap(), expect.hash_tree_root());

    // Unaligned start shifts bytes through fresh leaves.
    let mut tail = view.slice_from(10).unwrap();
    let expect = BasicList::<u64, 256>::from_elements(values[10..].to_vec()).unwrap();
    assert_eq!(tail.hash_tree_root().unwrap(), expect.hash_tree_root());
    assert_eq!(tail.get_all().unwrap(), values[10..].to_vec());

    view.destroy();
}

#[test]
fn refcounts_close_when_views_are_destroyed() {
    let store = ViewStore::with_new_pool();
    let pool = store.borrow().pool_rc();

    let start = ListAndUint {
        a: BasicList::from_elements(vec![1, 2, 3]).unwrap(),
        b: 9,
    };
    let mut view = ssztree_view::ContainerView::<ListAndUint>::from_value(&store, &start).unwrap();
    {
        let mut list = view.child::<list_and_uint_fields::A>().unwrap();
        list.push(4).unwrap();
    }
    view.commit().unwrap();
    assert!(pool.borrow().live_count() > 0);

    view.destroy();
    assert_eq!(pool.borrow().live_count(), 0);
}

mod order_invariance {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64, // good CI/runtime balance
            .. ProptestConfig::default()
        })]

        // Property: any permutation of distinct-index writes commits to the
        // same root.
        #[test]
        fn permuted_writes_reach_the_same_root(
            values in proptest::collection::vec(any::<u64>(), 16),
            seed in any::<u64>(),
        ) {
            let base = BasicVector::<u64, 16>::from_elements(vec![0; 16]).unwrap();

            // Reference order: ascending index.
            let store = ViewStore::with_new_pool();
            let mut a = ssztree_view::BasicVectorView::<u64, 16>::from_value(&store, &base).unwrap();
            for (i, v) in values.iter().enumerate() {
                a.set(i, *v).unwrap();
            }
            let root_asc = a.hash_tree_root().unwrap();
            a.destroy();

            // Shuffled order via a little LCG.
            let mut order: Vec<usize> = (0..16).collect();
            let mut state = seed | 1;
            for i in (1..order.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                order.swap(i, (state % (i as u64 + 1)) as usize);
            }
            let store = ViewStore::with_new_pool();
            let mut b = ssztree_view::BasicVectorView::<u64, 16>::from_value(&store, &base).unwrap();
            for &i in &order {
                b.set(i, values[i]).unwrap();
            }
            let root_perm = b.hash_tree_root().unwrap();
            b.destroy();

            prop_assert_eq!(root_asc, root_perm);

            // And both agree with the value-level root.
            let expect = BasicVector::<u64, 16>::from_elements(values).unwrap();
            prop_assert_eq!(root_asc, expect.hash_tree_root());
        }

        // Property: view roundtrip equals value roundtrip for lists.
        #[test]
        fn list_view_roundtrip(values in proptest::collection::vec(any::<u64>(), 0..48)) {
            let list = BasicList::<u64, 64>::from_elements(values).unwrap();
            let store = ViewStore::with_new_pool();
            let mut view =
                ssztree_view::BasicListView::<u64, 64>::from_value(&store, &list).unwrap();
            prop_assert_eq!(view.hash_tree_root().unwrap(), list.hash_tree_root());
            prop_assert_eq!(view.to_value().unwrap(), list);
            view.destroy();
        }
    }
}
