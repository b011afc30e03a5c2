// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capture → target → bubble over a small tree, plus return aggregation.
//!
//! This example shows:
//! - implementing `HostAdapter` for a plain parent table,
//! - registering capture and bubble handlers,
//! - stopping propagation at the target,
//! - the first-prompt-wins aggregation for `beforeUnload`.
//!
//! Run:
//! - `cargo run -p trellis_demos --example dispatch_basics`

use std::collections::HashMap;

use trellis_dispatch::engine::{Engine, handler};
use trellis_dispatch::host::{HostAdapter, RawEvent};
use trellis_dispatch::types::Signal;

/// A fixed tree: window(1) → panel(2) → button(3).
struct Scene {
    parents: HashMap<u32, u32>,
}

impl Scene {
    fn new() -> Self {
        Self {
            parents: HashMap::from([(2, 1), (3, 2)]),
        }
    }
}

impl HostAdapter for Scene {
    type Node = u32;
    type Subscription = ();

    fn contains(&self, node: u32) -> bool {
        (1..=3).contains(&node)
    }

    fn parent_of(&self, node: u32) -> Option<u32> {
        self.parents.get(&node).copied()
    }

    fn subscribe(&mut self, node: u32, raw_type: &str) -> Self::Subscription {
        println!("host: subscribe node {node} to raw {raw_type:?}");
    }
}

fn main() {
    let mut engine = Engine::new(Scene::new());

    // A capture handler at the window sees every press on the way down.
    let window_capture = handler(|_: &mut Engine<Scene>, step: &_| {
        println!("window capture: phase {:?}, node {}", step.phase, step.node);
        Signal::Continue
    });
    engine.register(1, "press", &window_capture, true).unwrap();

    // The button handles the press and keeps it from bubbling further.
    let button = handler(|_: &mut Engine<Scene>, step: &_| {
        println!("button: pressed at node {}", step.node);
        step.event().stop_propagation();
        Signal::PreventDefault
    });
    engine.register(3, "press", &button, false).unwrap();

    // This bubble handler at the panel never runs for the press above.
    let panel = handler(|_: &mut Engine<Scene>, step: &_| {
        println!("panel bubble: node {}", step.node);
        Signal::Continue
    });
    engine.register(2, "press", &panel, false).unwrap();

    let outcome = engine.dispatch(RawEvent::new("press", 3)).unwrap();
    println!("press outcome: default_prevented = {}", outcome.default_prevented);

    // beforeUnload: only the first non-empty prompt survives.
    let quiet = handler(|_: &mut Engine<Scene>, _: &_| Signal::Prompt(String::new()));
    let ask = handler(|_: &mut Engine<Scene>, _: &_| {
        Signal::Prompt(String::from("Discard unsaved changes?"))
    });
    let ignored = handler(|_: &mut Engine<Scene>, _: &_| Signal::Prompt(String::from("Really?")));
    engine.register(1, "beforeUnload", &quiet, false).unwrap();
    engine.register(1, "beforeUnload", &ask, false).unwrap();
    engine.register(1, "beforeUnload", &ignored, false).unwrap();

    let outcome = engine
        .dispatch(RawEvent::new("beforeUnload", 1).non_bubbling())
        .unwrap();
    println!("beforeUnload prompt: {:?}", outcome.prompt);
}
