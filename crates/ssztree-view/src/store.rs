// crates/ssztree-view/src/store.rs

//! The view store: per-view state and the commit machinery.
//!
//! The store centralizes all mutable view state so typed views can stay
//! trivially cloneable `(store, id)` handles and the store can recursively
//! destroy subtrees of child views on set/clear. All recursion (commit,
//! destroy, cache transfer) happens inside `&mut self` methods, so the
//! surrounding `RefCell` is never re-entered.
//!
//! Per-view state:
//! - `root` — the committed root (one held pool reference),
//! - `children_nodes` — memoized child reads and pending set-chunk results,
//! - `children_views` — materialized mutable child views,
//! - `changed` — ascending dirty gindices (a `BTreeSet` keeps the order the
//!   batched pool update requires),
//! - `list_length` / `prefetched` — list length and bulk-read memoization.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use ssztree_core::gindex::{from_depth, Gindex};
use ssztree_core::hash::Root;
use ssztree_core::{TreeError, TreeResult};
use ssztree_pool::{NodeId, NodePool};
use ssztree_schema::list::{length_from_chunk, LENGTH_GINDEX};

/// Opaque handle to a view owned by a [`ViewStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(u32);

/// A store handle as typed views carry it.
pub type SharedStore = Rc<RefCell<ViewStore>>;

#[derive(Debug)]
struct ViewState {
    alive: bool,
    root: NodeId,
    children_nodes: BTreeMap<Gindex, NodeId>,
    children_views: BTreeMap<Gindex, ViewId>,
    changed: BTreeSet<Gindex>,
    list_length: Option<u64>,
    prefetched: u64,
}

/// Owns the view table and dispenses [`ViewId`]s over a shared node pool.
#[derive(Debug)]
pub struct ViewStore {
    pool: Rc<RefCell<NodePool>>,
    views: Vec<ViewState>,
    free: Vec<u32>,
}

impl ViewStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: Rc<RefCell<NodePool>>) -> SharedStore {
        Rc::new(RefCell::new(Self { pool, views: Vec::new(), free: Vec::new() }))
    }

    /// Convenience: a store over a fresh private pool.
    #[must_use]
    pub fn with_new_pool() -> SharedStore {
        Self::new(Rc::new(RefCell::new(NodePool::new())))
    }

    /// The shared pool handle.
    #[must_use]
    pub fn pool_rc(&self) -> Rc<RefCell<NodePool>> {
        Rc::clone(&self.pool)
    }

    #[inline]
    fn state(&self, id: ViewId) -> &ViewState {
        let st = &self.views[id.0 as usize];
        debug_assert!(st.alive, "access to destroyed view {id:?}");
        st
    }

    #[inline]
    fn state_mut(&mut self, id: ViewId) -> &mut ViewState {
        let st = &mut self.views[id.0 as usize];
        debug_assert!(st.alive, "access to destroyed view {id:?}");
        st
    }

    /* -------------------- lifecycle -------------------- */

    /// Allocate (or recycle) a view over `root`, taking a pool reference on
    /// it. Recycled slots start with empty caches.
    pub fn create_view(&mut self, root: NodeId) -> ViewId {
        self.pool.borrow_mut().ref_node(root);
        let state = ViewState {
            alive: true,
            root,
            children_nodes: BTreeMap::new(),
            children_views: BTreeMap::new(),
            changed: BTreeSet::new(),
            list_length: None,
            prefetched: 0,
        };
        if let Some(idx) = self.free.pop() {
            self.views[idx as usize] = state;
            ViewId(idx)
        } else {
            let idx = self.views.len() as u32;
            self.views.push(state);
            ViewId(idx)
        }
    }

    /// Destroy `id` and every child view reachable through its
    /// `children_views`, releasing locally produced floating nodes and the
    /// root reference.
    pub fn destroy_view_recursive(&mut self, id: ViewId) {
        let children: Vec<ViewId> = {
            let st = self.state_mut(id);
            st.children_views.values().copied().collect()
        };
        for child in children {
            self.destroy_view_recursive(child);
        }
        let st = &mut self.views[id.0 as usize];
        st.alive = false;
        st.children_views.clear();
        let nodes: Vec<NodeId> = st.children_nodes.values().copied().collect();
        st.children_nodes.clear();
        let root = st.root;
        {
            let mut pool = self.pool.borrow_mut();
            for n in nodes {
                pool.release_floating(n);
            }
            pool.unref(root);
        }
        self.free.push(id.0);
    }

    /// Whether `id` currently names a live view.
    #[must_use]
    pub fn is_alive(&self, id: ViewId) -> bool {
        self.views
            .get(id.0 as usize)
            .is_some_and(|st| st.alive)
    }

    /* -------------------- child access -------------------- */

    /// Committed root node of the view.
    #[must_use]
    pub fn root_node(&self, id: ViewId) -> NodeId {
        self.state(id).root
    }

    /// Root hash of the view's committed tree.
    #[must_use]
    pub fn root_hash(&mut self, id: ViewId) -> Root {
        let root = self.state(id).root;
        self.pool.borrow_mut().get_root(root)
    }

    /// Memoized `pool.get_node(root, gindex)`. A cached child view at the
    /// gindex answers with its own current root.
    pub fn get_child_node(&mut self, id: ViewId, gindex: Gindex) -> TreeResult<NodeId> {
        if let Some(&child) = self.state(id).children_views.get(&gindex) {
            return Ok(self.state(child).root);
        }
        if let Some(&node) = self.state(id).children_nodes.get(&gindex) {
            return Ok(node);
        }
        let root = self.state(id).root;
        let node = self.pool.borrow().get_node(root, gindex)?;
        self.state_mut(id).children_nodes.insert(gindex, node);
        Ok(node)
    }

    /// Stage `node` as the child at `gindex`: destroys any cached child
    /// view there, releases a previously staged floating node, and marks
    /// the gindex dirty.
    pub fn set_child_node(&mut self, id: ViewId, gindex: Gindex, node: NodeId) {
        if let Some(child) = self.state_mut(id).children_views.remove(&gindex) {
            self.destroy_view_recursive(child);
        }
        let prev = self.state_mut(id).children_nodes.insert(gindex, node);
        if let Some(prev) = prev {
            if prev != node {
                self.pool.borrow_mut().release_floating(prev);
            }
        }
        self.state_mut(id).changed.insert(gindex);
    }

    /// Install `child` as the owned subview at `gindex`, destroying any
    /// previous mapping and invalidating the cached node.
    pub fn set_child_view(&mut self, id: ViewId, gindex: Gindex, child: ViewId) {
        if let Some(prev) = self.state_mut(id).children_nodes.remove(&gindex) {
            self.pool.borrow_mut().release_floating(prev);
        }
        let prev = self.state_mut(id).children_views.insert(gindex, child);
        if let Some(prev) = prev {
            if prev != child {
                self.destroy_view_recursive(prev);
            }
        }
        self.state_mut(id).changed.insert(gindex);
    }

    /// Cached child view at `gindex`, if one was materialized.
    #[must_use]
    pub fn child_view_at(&self, id: ViewId, gindex: Gindex) -> Option<ViewId> {
        self.state(id).children_views.get(&gindex).copied()
    }

    /// Return the cached child view at `gindex`, materializing one over the
    /// current child node if needed. The gindex is marked dirty: the parent
    /// will re-take the child's root on the next commit.
    pub fn get_or_create_child_view(&mut self, id: ViewId, gindex: Gindex) -> TreeResult<ViewId> {
        if let Some(&child) = self.state(id).children_views.get(&gindex) {
            self.state_mut(id).changed.insert(gindex);
            return Ok(child);
        }
        // A staged node at the gindex transfers into the child view.
        let node = match self.state_mut(id).children_nodes.remove(&gindex) {
            Some(n) => n,
            None => {
                let root = self.state(id).root;
                self.pool.borrow().get_node(root, gindex)?
            }
        };
        let child = self.create_view(node);
        let st = self.state_mut(id);
        st.children_views.insert(gindex, child);
        st.changed.insert(gindex);
        Ok(child)
    }

    /// Explicit dirty mark.
    pub fn mark_changed(&mut self, id: ViewId, gindex: Gindex) {
        self.state_mut(id).changed.insert(gindex);
    }

    /// Whether the view has uncommitted changes.
    #[must_use]
    pub fn is_dirty(&self, id: ViewId) -> bool {
        !self.state(id).changed.is_empty()
    }

    /* -------------------- list support -------------------- */

    /// List length read from the gindex-3 leaf, memoized.
    pub fn list_length(&mut self, id: ViewId) -> TreeResult<u64> {
        if let Some(len) = self.state(id).list_length {
            return Ok(len);
        }
        let node = self.get_child_node(id, LENGTH_GINDEX)?;
        let chunk = self.pool.borrow_mut().get_root(node);
        let len = length_from_chunk(&chunk);
        self.state_mut(id).list_length = Some(len);
        Ok(len)
    }

    /// Stage a new length leaf and update the cache.
    pub fn set_list_length(&mut self, id: ViewId, length: u64) {
        let leaf = self.pool.borrow_mut().create_leaf_from_uint(length);
        self.set_child_node(id, LENGTH_GINDEX, leaf);
        self.state_mut(id).list_length = Some(length);
    }

    /* -------------------- bulk reads -------------------- */

    /// Nodes `[0, count)` at `element_depth` below the view root, read
    /// through the cache so staged (dirty) chunks win over the committed
    /// tree. The first bulk read prefetches the committed range in one
    /// traversal and memoizes it.
    pub fn chunk_nodes(
        &mut self,
        id: ViewId,
        element_depth: u32,
        count: usize,
    ) -> TreeResult<Vec<NodeId>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if (self.state(id).prefetched as usize) < count {
            let root = self.state(id).root;
            let mut nodes = vec![NodeId::zero(0); count];
            self.pool
                .borrow()
                .get_nodes_at_depth(root, element_depth, 0, &mut nodes)?;
            let st = self.state_mut(id);
            for (i, n) in nodes.iter().enumerate() {
                st.children_nodes
                    .entry(from_depth(element_depth, i as u64))
                    .or_insert(*n);
            }
            st.prefetched = count as u64;
        }
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let gindex = from_depth(element_depth, i as u64);
            let cached = self.state(id).children_nodes.get(&gindex).copied();
            match cached {
                Some(n) => out.push(n),
                None => out.push(self.get_child_node(id, gindex)?),
            }
        }
        Ok(out)
    }

    /* -------------------- commit -------------------- */

    /// Fold the dirty set into a new root: recursively commit cached child
    /// views, take their roots (or the staged nodes), and apply one batched
    /// ascending-gindex pool update. No-op when nothing is dirty.
    pub fn commit(&mut self, id: ViewId) -> TreeResult<()> {
        let gindices: Vec<Gindex> = self.state(id).changed.iter().copied().collect();
        if gindices.is_empty() {
            return Ok(());
        }
        let mut nodes = Vec::with_capacity(gindices.len());
        for &gindex in &gindices {
            if let Some(child) = self.state(id).children_views.get(&gindex).copied() {
                self.commit(child)?;
                nodes.push(self.state(child).root);
            } else if let Some(&node) = self.state(id).children_nodes.get(&gindex) {
                nodes.push(node);
            } else {
                return Err(TreeError::ChildNotFound);
            }
        }
        let old_root = self.state(id).root;
        let new_root = {
            let mut pool = self.pool.borrow_mut();
            let new_root = pool.set_nodes_grouped(old_root, &gindices, &nodes)?;
            pool.ref_node(new_root);
            pool.unref(old_root);
            new_root
        };
        let st = self.state_mut(id);
        st.root = new_root;
        st.changed.clear();
        Ok(())
    }

    /// Release cached floating temporaries, clear the dirty set, and drop
    /// the length/prefetch memos. `children_views` mappings survive;
    /// callers decide their fate.
    pub fn clear_cache(&mut self, id: ViewId) {
        let nodes: Vec<NodeId> = {
            let st = self.state_mut(id);
            let nodes = st.children_nodes.values().copied().collect();
            st.children_nodes.clear();
            st.changed.clear();
            st.list_length = None;
            st.prefetched = 0;
            nodes
        };
        let mut pool = self.pool.borrow_mut();
        for n in nodes {
            pool.release_floating(n);
        }
    }

    /* -------------------- clone -------------------- */

    /// Clone `id` at its committed root. With `transfer_cache`, every cache
    /// entry whose gindex is clean moves into the clone and the source
    /// keeps only its dirty ones; previously obtained child views then
    /// belong to the clone. The view must be committed first.
    pub fn clone_view(&mut self, id: ViewId, transfer_cache: bool) -> TreeResult<ViewId> {
        debug_assert!(
            !self.is_dirty(id),
            "clone_view requires a committed source view"
        );
        let root = self.state(id).root;
        let new_id = self.create_view(root);
        if transfer_cache {
            let (nodes, views, length, prefetched) = {
                let st = self.state_mut(id);
                let changed = st.changed.clone();
                let all_nodes = std::mem::take(&mut st.children_nodes);
                let all_views = std::mem::take(&mut st.children_views);
                let mut moved_nodes = BTreeMap::new();
                for (g, n) in all_nodes {
                    if changed.contains(&g) {
                        st.children_nodes.insert(g, n);
                    } else {
                        moved_nodes.insert(g, n);
                    }
                }
                let mut moved_views = BTreeMap::new();
                for (g, v) in all_views {
                    if changed.contains(&g) {
                        st.children_views.insert(g, v);
                    } else {
                        moved_views.insert(g, v);
                    }
                }
                let length = st.list_length.take();
                let prefetched = std::mem::take(&mut st.prefetched);
                (moved_nodes, moved_views, length, prefetched)
            };
            let st = self.state_mut(new_id);
            st.children_nodes = nodes;
            st.children_views = views;
            st.list_length = length;
            st.prefetched = prefetched;
        }
        Ok(new_id)
    }
}
