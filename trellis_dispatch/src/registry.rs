// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler registry: per-node, per-type, per-phase ordered handler lists.
//!
//! All handler state lives in an engine-owned side table keyed by node;
//! host objects are never touched. Ids are assigned once per callback
//! identity (the `Rc` allocation) and reused across registrations, so the
//! same callback registered at several nodes resolves to one id.
//!
//! The registry also tracks, per root, the set of nodes that actually hold
//! entries, so teardown is proportional to registered nodes rather than the
//! size of the host tree.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::num::NonZeroU64;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::engine::{Handler, HandlerFn};
use crate::host::HostAdapter;
use crate::types::HandlerId;

/// One registered handler: its stable id plus the shared callback.
pub(crate) struct HandlerEntry<H: HostAdapter> {
    pub(crate) id: HandlerId,
    pub(crate) callback: Handler<H>,
}

impl<H: HostAdapter> Clone for HandlerEntry<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
        }
    }
}

/// Capture and bubble lists for one `(node, type)` pair, FIFO order.
struct PhaseLists<H: HostAdapter> {
    capture: Vec<HandlerEntry<H>>,
    bubble: Vec<HandlerEntry<H>>,
}

impl<H: HostAdapter> PhaseLists<H> {
    fn new() -> Self {
        Self {
            capture: Vec::new(),
            bubble: Vec::new(),
        }
    }

    fn list(&self, capture: bool) -> &Vec<HandlerEntry<H>> {
        if capture { &self.capture } else { &self.bubble }
    }

    fn list_mut(&mut self, capture: bool) -> &mut Vec<HandlerEntry<H>> {
        if capture { &mut self.capture } else { &mut self.bubble }
    }
}

struct IdSlot<H: HostAdapter> {
    id: HandlerId,
    callback: Weak<HandlerFn<H>>,
}

pub(crate) struct Registry<H: HostAdapter> {
    /// Side table: node → type → phase lists.
    nodes: HashMap<H::Node, HashMap<String, PhaseLists<H>>>,
    /// Live raw subscriptions, at most one per `(node, raw type)`.
    subs: HashMap<(H::Node, String), H::Subscription>,
    /// Callback identity → assigned id, keyed by allocation address.
    ids: HashMap<usize, IdSlot<H>>,
    next_id: u64,
    /// Root → nodes holding entries or subscriptions under that root.
    by_root: HashMap<H::Node, HashSet<H::Node>>,
}

impl<H: HostAdapter> Registry<H> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            subs: HashMap::new(),
            ids: HashMap::new(),
            next_id: 1,
            by_root: HashMap::new(),
        }
    }

    fn callback_key(callback: &Handler<H>) -> usize {
        Rc::as_ptr(callback) as *const () as usize
    }

    /// Resolve or assign the id for a callback identity.
    ///
    /// A cache slot whose callback has since been dropped may see its
    /// address reused by a new allocation; the weak pointer check treats
    /// such a slot as absent and reassigns.
    pub(crate) fn id_for(&mut self, callback: &Handler<H>) -> HandlerId {
        let key = Self::callback_key(callback);
        if let Some(slot) = self.ids.get(&key)
            && slot
                .callback
                .upgrade()
                .is_some_and(|live| Rc::ptr_eq(&live, callback))
        {
            return slot.id;
        }
        let id = NonZeroU64::new(self.next_id).expect("ids start at 1");
        self.next_id += 1;
        self.ids.insert(
            key,
            IdSlot {
                id,
                callback: Rc::downgrade(callback),
            },
        );
        id
    }

    /// The cached id for a callback, if it was ever registered.
    pub(crate) fn cached_id(&self, callback: &Handler<H>) -> Option<HandlerId> {
        let slot = self.ids.get(&Self::callback_key(callback))?;
        slot.callback
            .upgrade()
            .is_some_and(|live| Rc::ptr_eq(&live, callback))
            .then_some(slot.id)
    }

    /// Append an entry unless the same id is already present for this
    /// `(node, type, phase)`; duplicate registration is silently absorbed.
    pub(crate) fn insert(
        &mut self,
        node: H::Node,
        event_type: &str,
        capture: bool,
        entry: HandlerEntry<H>,
    ) {
        let list = self
            .nodes
            .entry(node)
            .or_default()
            .entry(String::from(event_type))
            .or_insert_with(PhaseLists::new)
            .list_mut(capture);
        if list.iter().any(|e| e.id == entry.id) {
            return;
        }
        list.push(entry);
    }

    /// Remove every entry matching `id` (defensively more than one).
    /// Removing a missing entry is a no-op.
    pub(crate) fn remove(&mut self, node: H::Node, event_type: &str, capture: bool, id: HandlerId) {
        if let Some(types) = self.nodes.get_mut(&node)
            && let Some(lists) = types.get_mut(event_type)
        {
            lists.list_mut(capture).retain(|e| e.id != id);
        }
    }

    /// Snapshot of a node's handler list, taken at the start of that node's
    /// handler loop. Mutations made by handlers are visible only to nodes
    /// not yet visited.
    pub(crate) fn snapshot(
        &self,
        node: H::Node,
        event_type: &str,
        capture: bool,
    ) -> SmallVec<[HandlerEntry<H>; 4]> {
        self.nodes
            .get(&node)
            .and_then(|types| types.get(event_type))
            .map(|lists| lists.list(capture).iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Establish the raw host subscription for `(node, raw_type)` exactly
    /// once.
    pub(crate) fn ensure_subscribed(&mut self, host: &mut H, node: H::Node, raw_type: &str) {
        self.subs
            .entry((node, String::from(raw_type)))
            .or_insert_with(|| host.subscribe(node, raw_type));
    }

    /// Record that `node` holds engine state under `root`.
    pub(crate) fn note_root(&mut self, root: H::Node, node: H::Node) {
        self.by_root.entry(root).or_default().insert(node);
    }

    /// Drop every entry, subscription, and cached id reachable from `root`.
    /// Idempotent; a root with no registered handlers is a no-op.
    pub(crate) fn teardown_root(&mut self, root: H::Node) {
        if let Some(nodes) = self.by_root.remove(&root) {
            for node in &nodes {
                self.nodes.remove(node);
            }
            self.subs.retain(|(node, _), _| !nodes.contains(node));
        }
        // Cached ids whose callbacks are gone can no longer match anything.
        self.ids.retain(|_, slot| slot.callback.strong_count() > 0);
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.subs.len()
    }
}
