// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic enter/leave derivation from raw pointer transitions.
//!
//! This example shows:
//! - registering for the derived `enter` and `leave` types,
//! - how one raw `pointerOver` crossing several nested containers fans out
//!   into per-boundary events, outermost entered first,
//! - the once-per-root `contentReady` derivation.
//!
//! Run:
//! - `cargo run -p trellis_demos --example hover_boundaries`

use std::collections::HashMap;

use trellis_dispatch::engine::{Engine, handler};
use trellis_dispatch::host::{HostAdapter, RawEvent};
use trellis_dispatch::types::Signal;

/// window(1) → card(2) → row(3) → icon(4), plus a sibling row(5).
struct Scene {
    parents: HashMap<u32, u32>,
    parsed: bool,
}

impl Scene {
    fn new() -> Self {
        Self {
            parents: HashMap::from([(2, 1), (3, 2), (4, 3), (5, 2)]),
            parsed: false,
        }
    }
}

impl HostAdapter for Scene {
    type Node = u32;
    type Subscription = ();

    fn contains(&self, node: u32) -> bool {
        (1..=5).contains(&node)
    }

    fn parent_of(&self, node: u32) -> Option<u32> {
        self.parents.get(&node).copied()
    }

    fn subscribe(&mut self, _node: u32, _raw_type: &str) -> Self::Subscription {}

    fn ready_state_complete(&self) -> bool {
        self.parsed
    }
}

fn name(node: u32) -> &'static str {
    match node {
        1 => "window",
        2 => "card",
        3 => "row",
        4 => "icon",
        _ => "other row",
    }
}

fn main() {
    let mut engine = Engine::new(Scene::new());

    for node in 1..=5 {
        let enter = handler(move |_: &mut Engine<Scene>, step: &_| {
            println!("enter {}", name(step.event().target()));
            Signal::Continue
        });
        let leave = handler(move |_: &mut Engine<Scene>, step: &_| {
            println!("leave {}", name(step.event().target()));
            Signal::Continue
        });
        engine.register(node, "enter", &enter, false).unwrap();
        engine.register(node, "leave", &leave, false).unwrap();
    }

    // The pointer arrives from outside the window, directly over the icon:
    // window, card, row, and icon are all entered, outermost first.
    println!("-- pointer moves from outside onto the icon");
    engine
        .dispatch(RawEvent::new("pointerOver", 4).non_bubbling())
        .unwrap();

    // Moving to the sibling row leaves icon and row, then enters the
    // sibling; the shared card and window are never left.
    println!("-- pointer moves from the icon to the other row");
    engine
        .dispatch(RawEvent::new("pointerOut", 4).with_related(5).non_bubbling())
        .unwrap();
    engine
        .dispatch(RawEvent::new("pointerOver", 5).with_related(4).non_bubbling())
        .unwrap();

    // contentReady derives once from the first readiness trigger.
    let ready = handler(|_: &mut Engine<Scene>, _: &_| {
        println!("content ready");
        Signal::Continue
    });
    engine.register(1, "contentReady", &ready, false).unwrap();
    engine.host_mut().parsed = true;
    engine.dispatch(RawEvent::new("readyStateChanged", 1)).unwrap();
    // Absorbed: the flag is per root and permanent.
    engine.dispatch(RawEvent::new("load", 1).non_bubbling()).unwrap();
}
