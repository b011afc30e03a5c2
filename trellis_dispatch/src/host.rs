// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host adapter contract: tree navigation, raw subscriptions, raw events.
//!
//! The engine does not own the node tree and never mutates host-owned
//! objects. Everything it needs from the environment is expressed here:
//!
//! - parent lookup over an acyclic, parent-linked node tree;
//! - a lazy per-`(node, raw type)` subscription primitive;
//! - a readiness query used for content-ready synthesis;
//! - a normalized [`RawEvent`] record for each physical event.
//!
//! ## Delivery contract
//!
//! The engine drives the full capture → target → bubble traversal itself, so
//! the host must deliver each physical raw event to
//! [`Engine::dispatch`](crate::engine::Engine::dispatch) **exactly once**,
//! regardless of how many subscriptions exist for its type. Subscriptions
//! only tell the host which `(node, raw type)` pairs the engine cares about;
//! they are established at most once per pair and released on teardown by
//! dropping the [`HostAdapter::Subscription`] token.

use alloc::string::String;

/// Capabilities the engine consumes from its embedding environment.
pub trait HostAdapter {
    /// Opaque node handle in the host tree.
    type Node: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Token representing an active raw subscription. Dropping it releases
    /// the subscription. Use `()` when the host needs no bookkeeping.
    type Subscription;

    /// Whether `node` belongs to a tree this host owns. Registration and
    /// dispatch fail with `InvalidArgument` for foreign nodes.
    fn contains(&self, node: Self::Node) -> bool;

    /// Parent of `node`, or `None` if `node` is a root.
    fn parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    /// Ask the host to start delivering `raw_type` events involving `node`.
    ///
    /// Called lazily, at most once per `(node, raw_type)` pair, no matter
    /// how many logical handlers are later added for that type.
    fn subscribe(&mut self, node: Self::Node, raw_type: &str) -> Self::Subscription;

    /// Whether the host reports its content as fully parsed. Consulted when
    /// a `readyStateChanged` raw signal arrives.
    fn ready_state_complete(&self) -> bool {
        false
    }
}

/// A normalized raw event record, produced by the host adapter.
///
/// The engine wraps this in its own
/// [`EventRecord`](crate::record::EventRecord); stop and cancel state never
/// lives on the host-supplied value.
#[derive(Clone, Debug)]
pub struct RawEvent<N> {
    /// Event type name; must satisfy the identifier grammar.
    pub event_type: String,
    /// The node that is the direct subject of the event.
    pub target: N,
    /// Secondary node for transition events (where the pointer came from or
    /// went to).
    pub related_target: Option<N>,
    /// Whether the event traverses the bubble phase.
    pub bubbles: bool,
    /// Whether handlers may suppress the default action.
    pub cancelable: bool,
    /// Default action already suppressed natively by the host.
    pub native_default_prevented: bool,
}

impl<N> RawEvent<N> {
    /// Create a bubbling, cancelable raw event.
    pub fn new(event_type: &str, target: N) -> Self {
        Self {
            event_type: String::from(event_type),
            target,
            related_target: None,
            bubbles: true,
            cancelable: true,
            native_default_prevented: false,
        }
    }

    /// Attach the transition-related node.
    pub fn with_related(mut self, related: N) -> Self {
        self.related_target = Some(related);
        self
    }

    /// Mark the event as non-bubbling.
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    /// Mark the event as non-cancelable.
    pub fn non_cancelable(mut self) -> Self {
        self.cancelable = false;
        self
    }
}
