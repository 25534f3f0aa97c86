//! Composite-element views: nested containers, ownership transfer, and
//! cross-store rejection.

#![deny(rust_2018_idioms)]

use ssztree_core::TreeError;
use ssztree_schema::{ByteVector, CompositeList, CompositeVector, SszType};
use ssztree_view::{
    CompositeListView, CompositeVectorView, ContainerView, TreeView, ViewStore,
};

ssztree_view::ssz_container! {
    module point_fields;
    /// Small two-field container used as a composite element.
    pub struct Point {
        pub x: u64 => X,
        pub y: u64 => Y,
    }
}

ssztree_view::ssz_container! {
    module holder_fields;
    /// Container holding a composite child.
    pub struct Holder {
        pub tag: u64 => Tag,
        pub point: Point => PointField,
    }
}

fn pt(x: u64, y: u64) -> Point {
    Point { x, y }
}

#[test]
fn nested_container_mutation_reaches_parent_root() {
    let store = ViewStore::with_new_pool();
    let start = Holder { tag: 1, point: pt(10, 20) };
    let mut view = ContainerView::<Holder>::from_value(&store, &start).unwrap();

    {
        let mut point = view.child::<holder_fields::PointField>().unwrap();
        point.set::<point_fields::Y>(99).unwrap();
    }

    let expect = Holder { tag: 1, point: pt(10, 99) };
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    assert_eq!(view.to_value().unwrap(), expect);
    view.destroy();
}

#[test]
fn set_child_transfers_ownership() {
    let store = ViewStore::with_new_pool();
    let mut view =
        ContainerView::<Holder>::from_value(&store, &Holder { tag: 7, point: pt(1, 2) })
            .unwrap();

    let replacement = ContainerView::<Point>::from_value(&store, &pt(5, 6)).unwrap();
    view.set_child::<holder_fields::PointField>(replacement).unwrap();

    let expect = Holder { tag: 7, point: pt(5, 6) };
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    view.destroy();

    let pool = store.borrow().pool_rc();
    assert_eq!(pool.borrow().live_count(), 0);
}

#[test]
fn cross_store_assignment_is_rejected() {
    let store_a = ViewStore::with_new_pool();
    let store_b = ViewStore::with_new_pool();
    let mut view =
        ContainerView::<Holder>::from_value(&store_a, &Holder { tag: 7, point: pt(1, 2) })
            .unwrap();
    let foreign = ContainerView::<Point>::from_value(&store_b, &pt(5, 6)).unwrap();

    assert_eq!(
        view.set_child::<holder_fields::PointField>(foreign)
            .unwrap_err(),
        TreeError::DifferentStore
    );
}

#[test]
fn composite_vector_element_views() {
    let store = ViewStore::with_new_pool();
    let roots: Vec<ByteVector<32>> = (0..4u8)
        .map(|i| ByteVector::from_bytes(&[i; 32]).unwrap())
        .collect();
    let start = CompositeVector::<ByteVector<32>, 4>::from_elements(roots.clone()).unwrap();
    let mut view =
        CompositeVectorView::<ByteVector<32>, 4>::from_value(&store, &start).unwrap();

    let replacement = ByteVector::<32>::from_bytes(&[0xee; 32]).unwrap();
    view.set_value(2, &replacement).unwrap();

    let mut expect_elements = roots;
    expect_elements[2] = replacement;
    let expect = CompositeVector::<ByteVector<32>, 4>::from_elements(expect_elements).unwrap();
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    assert_eq!(view.get(5).unwrap_err(), TreeError::IndexOutOfBounds);
    view.destroy();
}

#[test]
fn composite_list_push_and_slice() {
    let store = ViewStore::with_new_pool();
    let start = CompositeList::<Point, 64>::from_elements(vec![pt(1, 1), pt(2, 2)]).unwrap();
    let mut view = CompositeListView::<Point, 64>::from_value(&store, &start).unwrap();

    view.push_value(&pt(3, 3)).unwrap();
    {
        let mut second = view.get(1).unwrap();
        second.set::<point_fields::X>(20).unwrap();
    }

    let expect =
        CompositeList::<Point, 64>::from_elements(vec![pt(1, 1), pt(20, 2), pt(3, 3)]).unwrap();
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());

    // slice_to keeps a prefix and its element subtrees.
    let mut sliced = view.slice_to(1).unwrap();
    let expect_sliced =
        CompositeList::<Point, 64>::from_elements(vec![pt(1, 1), pt(20, 2)]).unwrap();
    assert_eq!(sliced.hash_tree_root().unwrap(), expect_sliced.hash_tree_root());

    // slice_from drops a prefix.
    let mut tail = view.slice_from(1).unwrap();
    let expect_tail =
        CompositeList::<Point, 64>::from_elements(vec![pt(20, 2), pt(3, 3)]).unwrap();
    assert_eq!(tail.hash_tree_root().unwrap(), expect_tail.hash_tree_root());

    view.destroy();
}

#[test]
fn clone_with_cache_transfer_moves_child_views() {
    let store = ViewStore::with_new_pool();
    let mut view =
        ContainerView::<Holder>::from_value(&store, &Holder { tag: 1, point: pt(3, 4) })
            .unwrap();

    // Materialize a child view, mutate, and commit so the cache is clean.
    {
        let mut point = view.child::<holder_fields::PointField>().unwrap();
        point.set::<point_fields::X>(30).unwrap();
    }
    view.commit().unwrap();
    let root = view.hash_tree_root().unwrap();

    let mut clone = view.clone_view(true).unwrap();
    assert_eq!(clone.hash_tree_root().unwrap(), root);

    // The transferred child now belongs to the clone; mutating it moves
    // the clone's root, not the source's.
    {
        let mut point = clone.child::<holder_fields::PointField>().unwrap();
        point.set::<point_fields::Y>(99).unwrap();
    }
    assert_ne!(clone.hash_tree_root().unwrap(), root);
    assert_eq!(view.hash_tree_root().unwrap(), root);

    clone.destroy();
    view.destroy();
}
