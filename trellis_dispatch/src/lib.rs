// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trellis_dispatch --heading-base-level=0

//! Trellis Dispatch: a deterministic, `no_std` event propagation engine.
//!
//! ## Overview
//!
//! This crate dispatches events over a node tree in the classic
//! capture → target → bubble order. It does not observe the tree itself.
//! Instead, implement [`HostAdapter`](crate::host::HostAdapter) for your
//! tree — parent lookup, membership, and raw event subscription — and
//! deliver each physical event to [`Engine::dispatch`](crate::engine::Engine::dispatch)
//! exactly once. The engine owns everything else: handler tables, event
//! records, stop flags, and per-root dispatch stacks. Host objects are
//! never mutated.
//!
//! ## Registration
//!
//! Register a [`Handler`](crate::engine::Handler) per `(node, type, phase)`
//! with [`Engine::register`](crate::engine::Engine::register). Each callback
//! identity gets one stable [`HandlerId`](crate::types::HandlerId), assigned
//! on first registration and reused thereafter; registering the same
//! callback twice at the same slot is absorbed. Handlers at one slot run in
//! registration order.
//!
//! ## Propagation
//!
//! A dispatch walks the target's ancestor chain: capture handlers from the
//! root down, the target's own capture then bubble lists, and bubble
//! handlers back up (for bubbling events). Handlers stop traversal through
//! the event record on their [`Step`](crate::engine::Step); a stop raised
//! exactly at the target still lets the target's remaining lists run.
//! Handler return values aggregate per event type: most types let any
//! handler cancel the default, `beforeUnload` keeps only the first
//! non-empty prompt, and the pointer-over family uses inverted polarity
//! with no cancelable gate.
//!
//! ## Synthetic events
//!
//! From raw pointer-over/out transitions the engine derives non-bubbling
//! `enter` and `leave` events for every boundary actually crossed, outer
//! containers entered first and left last. From parse/readiness/load
//! signals it derives one `contentReady` per root. Derived events dispatch
//! with fresh records after the raw traversal completes.
//!
//! ## Reentrancy and teardown
//!
//! Dispatch is synchronous and reentrant: handlers may register, dispatch,
//! or tear down before returning, and each root tracks its in-flight
//! records on a stack ([`Engine::dispatch_depth`](crate::engine::Engine::dispatch_depth)).
//! [`Engine::teardown`](crate::engine::Engine::teardown) releases a whole
//! root in time proportional to its registered nodes; an `unload` event at
//! a root does this automatically.
//!
//! ```
//! use trellis_dispatch::engine::{Engine, Handler, handler};
//! use trellis_dispatch::host::{HostAdapter, RawEvent};
//! use trellis_dispatch::types::{Phase, Signal};
//! # use std::cell::RefCell;
//! # use std::rc::Rc;
//!
//! struct Host;
//!
//! impl HostAdapter for Host {
//!     type Node = u32;
//!     type Subscription = ();
//!
//!     fn contains(&self, node: u32) -> bool {
//!         (1..=3).contains(&node)
//!     }
//!
//!     fn parent_of(&self, node: u32) -> Option<u32> {
//!         match node {
//!             3 => Some(2),
//!             2 => Some(1),
//!             _ => None,
//!         }
//!     }
//!
//!     fn subscribe(&mut self, _node: u32, _raw_type: &str) -> Self::Subscription {}
//! }
//!
//! let mut engine = Engine::new(Host);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! let h: Handler<Host> = handler(move |_, step| {
//!     log.borrow_mut().push((step.phase, step.node));
//!     Signal::Continue
//! });
//! engine.register(1, "press", &h, true).unwrap();
//! engine.register(3, "press", &h, false).unwrap();
//! engine.dispatch(RawEvent::new("press", 3)).unwrap();
//! assert_eq!(*seen.borrow(), vec![(Phase::Capture, 1), (Phase::Target, 3)]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod engine;
pub mod host;
pub mod record;
pub mod types;

mod registry;
mod stack;
mod synthetic;
mod teardown;

#[cfg(test)]
pub(crate) mod testing;
