//! Bitvector / bitlist view behavior.

#![deny(rust_2018_idioms)]

use ssztree_core::TreeError;
use ssztree_schema::{Bitlist, Bitvector, SszType};
use ssztree_view::{BitlistView, BitvectorView, TreeView, ViewStore};

#[test]
fn bitvector_single_bit_writes() {
    let store = ViewStore::with_new_pool();
    let start = Bitvector::<300>::new();
    let mut view = BitvectorView::<300>::from_value(&store, &start).unwrap();

    // Bits in both chunks (256 bits per chunk).
    view.set(0, true).unwrap();
    view.set(255, true).unwrap();
    view.set(290, true).unwrap();

    let mut expect = Bitvector::<300>::new();
    expect.set(0, true).unwrap();
    expect.set(255, true).unwrap();
    expect.set(290, true).unwrap();

    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    assert_eq!(view.to_bools().unwrap(), expect.to_bools());
    assert_eq!(view.get(290).unwrap(), true);
    assert_eq!(view.get(291).unwrap(), false);
    assert_eq!(view.set(300, true).unwrap_err(), TreeError::IndexOutOfBounds);
    view.destroy();
}

#[test]
fn bitlist_push_tracks_bit_length() {
    let store = ViewStore::with_new_pool();
    let mut view = BitlistView::<10>::from_value(&store, &Bitlist::new()).unwrap();

    for i in 0..10 {
        view.push(i % 3 == 0).unwrap();
    }
    assert_eq!(view.length().unwrap(), 10);
    assert_eq!(view.push(true).unwrap_err(), TreeError::LengthOverLimit);

    let expect =
        Bitlist::<10>::from_bools(&(0..10).map(|i| i % 3 == 0).collect::<Vec<_>>()).unwrap();
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    assert_eq!(view.to_bools().unwrap(), expect.to_bools());
    assert_eq!(view.to_value().unwrap(), expect);
    view.destroy();
}

#[test]
fn bitlist_set_respects_length() {
    let store = ViewStore::with_new_pool();
    let start = Bitlist::<16>::from_bools(&[false; 5]).unwrap();
    let mut view = BitlistView::<16>::from_value(&store, &start).unwrap();

    view.set(4, true).unwrap();
    assert_eq!(view.set(5, true).unwrap_err(), TreeError::IndexOutOfBounds);

    let mut expect = start;
    expect.set(4, true).unwrap();
    assert_eq!(view.hash_tree_root().unwrap(), expect.hash_tree_root());
    view.destroy();
}
