// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test support: a tiny in-memory tree host.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::host::HostAdapter;

/// Host over a static parent table, nodes named by `u32`. Records every
/// subscription it is asked to establish.
pub(crate) struct TreeHost {
    parents: HashMap<u32, u32>,
    nodes: HashSet<u32>,
    subs: Vec<(u32, String)>,
    ready: bool,
}

impl TreeHost {
    /// Build from `(child, parent)` edges; both ends become known nodes.
    pub(crate) fn new(edges: Vec<(u32, u32)>) -> Self {
        let mut parents = HashMap::new();
        let mut nodes = HashSet::new();
        for (child, parent) in edges {
            parents.insert(child, parent);
            nodes.insert(child);
            nodes.insert(parent);
        }
        Self {
            parents,
            nodes,
            subs: Vec::new(),
            ready: false,
        }
    }

    pub(crate) fn parent(&self, node: u32) -> Option<u32> {
        self.parents.get(&node).copied()
    }

    pub(crate) fn subscriptions(&self) -> Vec<(u32, String)> {
        self.subs.clone()
    }

    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}

impl HostAdapter for TreeHost {
    type Node = u32;
    type Subscription = ();

    fn contains(&self, node: u32) -> bool {
        self.nodes.contains(&node)
    }

    fn parent_of(&self, node: u32) -> Option<u32> {
        self.parent(node)
    }

    fn subscribe(&mut self, node: u32, raw_type: &str) -> Self::Subscription {
        self.subs.push((node, String::from(raw_type)));
    }

    fn ready_state_complete(&self) -> bool {
        self.ready
    }
}
