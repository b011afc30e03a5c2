// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root teardown: bulk release of everything registered under one root.
//!
//! Teardown walks the registry's per-root node set rather than the host
//! tree, so its cost is proportional to the number of nodes that actually
//! hold handlers or subscriptions. The host is not consulted at all; a
//! root whose nodes have already been destroyed on the host side tears
//! down just the same.

use crate::engine::Engine;
use crate::host::HostAdapter;

impl<H: HostAdapter> Engine<H> {
    /// Release every handler, raw subscription, and root context under
    /// `root`.
    ///
    /// Idempotent: tearing down an unknown root, or the same root twice, is
    /// a no-op. Dispatching an `unload` event targeting a root performs
    /// this automatically after the event's traversal completes.
    ///
    /// Host subscriptions are released by dropping their
    /// [`Subscription`](HostAdapter::Subscription) values; hosts with
    /// explicit unsubscription hook it into that drop.
    pub fn teardown(&mut self, root: H::Node) {
        self.teardown_inner(root);
    }
}
