// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation engine: registration surface and the phase traversal loop.
//!
//! ## Overview
//!
//! [`Engine`] orchestrates one full capture → target → bubble traversal per
//! raw event, entirely on the host's call path:
//!
//! 1. Resolve the root context for the target and push a fresh
//!    [`EventRecord`](crate::record::EventRecord) on its event stack.
//! 2. If the raw type is a transition or readiness signal, compute the
//!    boundary queue / readiness check while the record is fresh.
//! 3. Run capture handlers top-down, the target node's capture and bubble
//!    lists, then bubble handlers bottom-up, consulting the record's stop
//!    flags between every batch.
//! 4. Fold each handler's [`Signal`] into the aggregated [`Outcome`] under
//!    the event type's [`ReturnPolicy`].
//! 5. Dispatch derived enter/leave and content-ready events, each with its
//!    own record, strictly after the raw traversal.
//! 6. Pop the stack entry; the drop guard makes this hold even when a
//!    handler panics.
//!
//! ## Reentrancy
//!
//! Handlers receive `&mut Engine` and may synchronously register,
//! unregister, dispatch, or tear down before returning. A nested dispatch
//! completes in full before the outer traversal resumes; its record's flags
//! are invisible to the outer record. Handlers registered mid-dispatch are
//! picked up by nodes not yet visited, never retroactively by a list
//! already being iterated (each node's list is snapshotted when that node's
//! loop starts).

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::host::{HostAdapter, RawEvent};
use crate::record::EventRecord;
use crate::registry::{HandlerEntry, Registry};
use crate::stack::RootContext;
use crate::synthetic;
use crate::types::{
    HandlerId, InvalidArgument, Outcome, Phase, ReturnPolicy, Signal, is_valid_type_name,
    well_known,
};

/// Handler callback object: invoked with the engine (for nested dispatch
/// and registration) and the current dispatch step.
pub type HandlerFn<H> = dyn Fn(&mut Engine<H>, &Step<<H as HostAdapter>::Node>) -> Signal;

/// Shared handle to a handler callback. Clones share one callback identity
/// and therefore one [`HandlerId`].
pub type Handler<H> = alloc::rc::Rc<HandlerFn<H>>;

/// Wrap a closure as a [`Handler`].
pub fn handler<H, F>(f: F) -> Handler<H>
where
    H: HostAdapter,
    F: Fn(&mut Engine<H>, &Step<H::Node>) -> Signal + 'static,
{
    Rc::new(f)
}

/// One handler invocation: the node whose list is running, the traversal
/// phase, and the shared event record.
#[derive(Debug)]
pub struct Step<N> {
    /// Propagation phase for this step.
    pub phase: Phase,
    /// Node whose handler list is being run (the "current target").
    pub node: N,
    record: Rc<EventRecord<N>>,
}

impl<N: Copy> Step<N> {
    /// The in-flight event record; use it to read event fields and to stop
    /// propagation or prevent the default action.
    pub fn event(&self) -> &EventRecord<N> {
        &self.record
    }
}

/// Identifies a handler for removal: by id or by callback.
pub enum HandlerRef<'a, H: HostAdapter> {
    /// The id returned from registration.
    Id(HandlerId),
    /// The callback handle itself; resolved through the id cache.
    Callback(&'a Handler<H>),
}

impl<H: HostAdapter> fmt::Debug for HandlerRef<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Folds handler signals into one outcome under a [`ReturnPolicy`].
struct Aggregate {
    policy: ReturnPolicy,
    prevented: bool,
    prompt: Option<String>,
}

impl Aggregate {
    fn new(policy: ReturnPolicy) -> Self {
        Self {
            policy,
            prevented: false,
            prompt: None,
        }
    }

    fn fold<N: Copy>(&mut self, signal: Signal, record: &EventRecord<N>) {
        match self.policy {
            ReturnPolicy::AnyCancels => {
                if matches!(signal, Signal::PreventDefault) && record.cancelable() {
                    self.prevented = true;
                }
            }
            // Pointer-over class: no cancelable gate (legacy inverted
            // polarity; the aggregate starts falsy).
            ReturnPolicy::EnterLike => {
                if matches!(signal, Signal::PreventDefault) {
                    self.prevented = true;
                }
            }
            // Only the first non-empty prompt is retained.
            ReturnPolicy::FirstPromptWins => {
                if let Signal::Prompt(text) = signal
                    && !text.is_empty()
                    && self.prompt.is_none()
                {
                    self.prompt = Some(text);
                }
            }
        }
    }

    fn finish<N: Copy>(self, record: &EventRecord<N>) -> Outcome {
        match self.policy {
            ReturnPolicy::FirstPromptWins => Outcome {
                default_prevented: false,
                prompt: self.prompt,
            },
            _ => {
                let prevented = self.prevented || record.default_prevented();
                if prevented {
                    record.prevent_default();
                }
                Outcome {
                    default_prevented: prevented,
                    prompt: None,
                }
            }
        }
    }
}

/// The event-dispatch engine for one host adapter.
///
/// Dispatch is single-threaded, synchronous, and reentrant; see the module
/// docs for the traversal algorithm and the crate docs for a full example.
pub struct Engine<H: HostAdapter> {
    host: H,
    registry: Registry<H>,
    roots: HashMap<H::Node, RootContext<H::Node>>,
}

impl<H: HostAdapter> fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("roots", &self.roots.len())
            .field("subscriptions", &self.registry.subscription_count())
            .finish_non_exhaustive()
    }
}

impl<H: HostAdapter> Engine<H> {
    /// Create an engine over the given host adapter.
    pub fn new(host: H) -> Self {
        Self {
            host,
            registry: Registry::new(),
            roots: HashMap::new(),
        }
    }

    /// Shared access to the host adapter.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host adapter.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Register `callback` for `event_type` at `node`.
    ///
    /// Returns the callback's stable id. Re-registering the same callback
    /// at the same `(node, type, phase)` is silently absorbed and returns
    /// the existing id. Derived types (`enter`, `leave`, `contentReady`)
    /// register exactly like primitive ones; the engine establishes the raw
    /// source subscriptions behind the scenes, at most once per
    /// `(node, raw type)`.
    ///
    /// Fails with [`InvalidArgument`] for a node the host does not own or a
    /// type violating the identifier grammar.
    pub fn register(
        &mut self,
        node: H::Node,
        event_type: &str,
        callback: &Handler<H>,
        use_capture: bool,
    ) -> Result<HandlerId, InvalidArgument> {
        if !is_valid_type_name(event_type) {
            return Err(InvalidArgument::Type);
        }
        if !self.host.contains(node) {
            return Err(InvalidArgument::Node);
        }
        let root = self.resolve_root(node);
        self.root_context(root);

        match event_type {
            well_known::ENTER => {
                self.subscribe_raw(node, well_known::POINTER_OVER);
                self.subscribe_raw(root, well_known::POINTER_OVER);
                self.registry.note_root(root, root);
            }
            well_known::LEAVE => {
                self.subscribe_raw(node, well_known::POINTER_OUT);
                self.subscribe_raw(root, well_known::POINTER_OUT);
                self.registry.note_root(root, root);
            }
            well_known::CONTENT_READY => {
                self.subscribe_raw(root, well_known::CONTENT_PARSED);
                self.subscribe_raw(root, well_known::READY_STATE_CHANGED);
                self.subscribe_raw(root, well_known::LOAD);
                self.registry.note_root(root, root);
            }
            _ => self.subscribe_raw(node, event_type),
        }

        let id = self.registry.id_for(callback);
        self.registry.insert(
            node,
            event_type,
            use_capture,
            HandlerEntry {
                id,
                callback: Rc::clone(callback),
            },
        );
        self.registry.note_root(root, node);
        Ok(id)
    }

    /// Remove a handler registration.
    ///
    /// Removing an id that was never registered, or one already removed, is
    /// a no-op. Fails with [`InvalidArgument`] for a malformed node or
    /// type, or a callback the engine has never assigned an id to.
    pub fn unregister(
        &mut self,
        node: H::Node,
        event_type: &str,
        handler: HandlerRef<'_, H>,
        use_capture: bool,
    ) -> Result<(), InvalidArgument> {
        if !is_valid_type_name(event_type) {
            return Err(InvalidArgument::Type);
        }
        if !self.host.contains(node) {
            return Err(InvalidArgument::Node);
        }
        let id = match handler {
            HandlerRef::Id(id) => id,
            HandlerRef::Callback(callback) => self
                .registry
                .cached_id(callback)
                .ok_or(InvalidArgument::Handler)?,
        };
        self.registry.remove(node, event_type, use_capture, id);
        Ok(())
    }

    /// Dispatch a host-delivered raw event through its full traversal,
    /// including any derived synthetic events.
    ///
    /// Handlers may reenter the engine; each nested dispatch completes
    /// before this one resumes. An `unload` event targeting a root tears
    /// that root down after its traversal.
    pub fn dispatch(&mut self, raw: RawEvent<H::Node>) -> Result<Outcome, InvalidArgument> {
        if !is_valid_type_name(&raw.event_type) {
            return Err(InvalidArgument::Type);
        }
        if !self.host.contains(raw.target) {
            return Err(InvalidArgument::Node);
        }
        let root = self.resolve_root(raw.target);
        let record = Rc::new(EventRecord::from_raw(&raw));
        let outcome = self.dispatch_record(root, &record);
        if raw.event_type == well_known::UNLOAD && raw.target == root {
            self.teardown(root);
        }
        Ok(outcome)
    }

    /// Number of records currently in flight at `root` (1 during a
    /// top-level dispatch, higher inside nested dispatches).
    pub fn dispatch_depth(&self, root: H::Node) -> usize {
        self.roots.get(&root).map_or(0, |ctx| ctx.stack.depth())
    }

    /// The record whose traversal is currently innermost at `root`, if any.
    /// Inside a handler this is the record of the event being handled.
    pub fn current_event(&self, root: H::Node) -> Option<Rc<EventRecord<H::Node>>> {
        self.roots.get(&root).and_then(|ctx| ctx.stack.top())
    }

    /// Whether content-ready has already fired for `root`.
    pub fn content_ready_fired(&self, root: H::Node) -> bool {
        self.roots.get(&root).is_some_and(|ctx| ctx.content_ready_fired)
    }

    pub(crate) fn teardown_inner(&mut self, root: H::Node) {
        self.registry.teardown_root(root);
        self.roots.remove(&root);
    }

    fn subscribe_raw(&mut self, node: H::Node, raw_type: &str) {
        self.registry.ensure_subscribed(&mut self.host, node, raw_type);
    }

    fn resolve_root(&self, node: H::Node) -> H::Node {
        let mut cur = node;
        while let Some(parent) = self.host.parent_of(cur) {
            cur = parent;
        }
        cur
    }

    fn root_context(&mut self, root: H::Node) -> &mut RootContext<H::Node> {
        self.roots.entry(root).or_insert_with(RootContext::new)
    }

    /// Run one record through all phases and its synthetic follow-ups.
    fn dispatch_record(&mut self, root: H::Node, record: &Rc<EventRecord<H::Node>>) -> Outcome {
        let stack = self.root_context(root).stack.clone();
        let _guard = stack.push(Rc::clone(record));

        let event_type = String::from(record.event_type());
        let target = record.target();

        // Fresh-record synthesis inputs, computed before any handler runs.
        let mut boundary: SmallVec<[H::Node; 8]> = SmallVec::new();
        let mut fire_ready = false;
        if !record.is_synthetic() {
            if event_type == well_known::POINTER_OVER || event_type == well_known::POINTER_OUT {
                let host = &self.host;
                boundary = synthetic::boundary_queue(
                    |n| host.parent_of(n),
                    root,
                    target,
                    record.related_target(),
                );
            }
            if synthetic::is_readiness_trigger(
                &event_type,
                target == root,
                self.host.ready_state_complete(),
            ) {
                let ctx = self.root_context(root);
                if !ctx.content_ready_fired {
                    ctx.content_ready_fired = true;
                    fire_ready = true;
                }
            }
        }

        let host = &self.host;
        let path = synthetic::ancestor_path(|n| host.parent_of(n), target);
        let above_target = path.len() - 1;
        let mut agg = Aggregate::new(ReturnPolicy::for_type(&event_type));

        // Capture: root down to, excluding, the target.
        record.set_phase(Phase::Capture);
        for &node in &path[..above_target] {
            if !record.may_run() {
                break;
            }
            self.run_handlers(node, &event_type, true, Phase::Capture, record, &mut agg);
        }

        // Target: the target node's capture list, then its bubble list. A
        // stop raised here still lets the remaining target lists run.
        record.set_phase(Phase::Target);
        if record.may_run() {
            self.run_handlers(target, &event_type, true, Phase::Target, record, &mut agg);
        }
        if record.may_run() {
            self.run_handlers(target, &event_type, false, Phase::Target, record, &mut agg);
        }

        // Bubble: the target's ancestors, bottom-up.
        if record.bubbles() {
            record.set_phase(Phase::Bubble);
            for &node in path[..above_target].iter().rev() {
                if !record.may_run() {
                    break;
                }
                self.run_handlers(node, &event_type, false, Phase::Bubble, record, &mut agg);
            }
        }

        // Derived events, each with a fresh record, strictly after the raw
        // traversal.
        if !record.is_synthetic() {
            if event_type == well_known::POINTER_OVER {
                // Enter: outermost first.
                while let Some(node) = boundary.pop() {
                    let derived = Rc::new(EventRecord::synthetic(
                        well_known::ENTER,
                        node,
                        record.related_target(),
                        false,
                    ));
                    let _ = self.dispatch_record(root, &derived);
                }
            } else if event_type == well_known::POINTER_OUT {
                // Leave: innermost first.
                for &node in &boundary {
                    let derived = Rc::new(EventRecord::synthetic(
                        well_known::LEAVE,
                        node,
                        record.related_target(),
                        false,
                    ));
                    let _ = self.dispatch_record(root, &derived);
                }
            }
            if fire_ready {
                let derived = Rc::new(EventRecord::synthetic(
                    well_known::CONTENT_READY,
                    root,
                    None,
                    true,
                ));
                let _ = self.dispatch_record(root, &derived);
            }
        }

        agg.finish(record)
    }

    /// Run one node's handler list for one phase, FIFO, honoring immediate
    /// stops between invocations. The list is snapshotted up front.
    fn run_handlers(
        &mut self,
        node: H::Node,
        event_type: &str,
        capture_list: bool,
        phase: Phase,
        record: &Rc<EventRecord<H::Node>>,
        agg: &mut Aggregate,
    ) {
        let snapshot = self.registry.snapshot(node, event_type, capture_list);
        for entry in snapshot {
            let step = Step {
                phase,
                node,
                record: Rc::clone(record),
            };
            let signal = (entry.callback)(self, &step);
            agg.fold(signal, record);
            if record.stopped_immediately() {
                break;
            }
        }
    }
}
