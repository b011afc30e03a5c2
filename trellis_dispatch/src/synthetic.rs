// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic event derivation: enter/leave queues and content-ready.
//!
//! ## Enter/leave
//!
//! A raw pointer-over or pointer-out event describes one physical
//! transition that may cross several nesting boundaries at once. The
//! boundary queue lists every node actually entered or left, innermost
//! first, bounded by the nearest common ancestor of `target` and
//! `relatedTarget`:
//!
//! - leave-family events consume the queue from the innermost end outward
//!   (target first);
//! - enter-family events consume it from the outermost end inward
//!   (nearest-to-root first).
//!
//! Outer containers are thereby notified before (enter) or after (leave)
//! inner ones, consistent with nesting.
//!
//! ## Content-ready
//!
//! Fires at most once per root, on the first of: a native content-parsed
//! signal, a readiness-state change whose query reports completion, or a
//! full-load signal targeting the root itself. The engine keeps the
//! once-only flag on the root context.

use smallvec::SmallVec;

use crate::types::well_known;

/// Ancestor chain of `node`, root first, computed with the host's parent
/// lookup.
pub(crate) fn ancestor_path<N: Copy>(
    parent_of: impl Fn(N) -> Option<N>,
    node: N,
) -> SmallVec<[N; 8]> {
    let mut path: SmallVec<[N; 8]> = SmallVec::new();
    let mut cur = node;
    // Collect to root; the host guarantees acyclic ancestry.
    loop {
        path.push(cur);
        match parent_of(cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Nodes crossed by one raw transition, innermost first.
///
/// Returns an empty queue when the transition crosses no boundary: target
/// and related are the same node, the target is the root itself, or the
/// target is an ancestor of (or equal to) the related node so the pointer
/// never left it.
pub(crate) fn boundary_queue<N: Copy + Eq>(
    parent_of: impl Fn(N) -> Option<N>,
    root: N,
    target: N,
    related: Option<N>,
) -> SmallVec<[N; 8]> {
    if target == root {
        // Transitions among the root's own edges are not boundary
        // crossings for its descendants.
        return SmallVec::new();
    }
    if related == Some(target) {
        return SmallVec::new();
    }

    let target_path = ancestor_path(&parent_of, target);
    let divergence = match related {
        // Entered or left the outermost boundary: every ancestor up to and
        // including the root is crossed.
        None => 0,
        Some(rel) => {
            let related_path = ancestor_path(&parent_of, rel);
            let mut lca = 0;
            while lca < target_path.len()
                && lca < related_path.len()
                && target_path[lca] == related_path[lca]
            {
                lca += 1;
            }
            lca
        }
    };

    // Innermost first: target up to (excluding) the common ancestor. When
    // the target lies on the related node's own chain the slice is empty
    // (pure descent, no crossing).
    let mut queue: SmallVec<[N; 8]> = target_path[divergence..].iter().copied().collect();
    queue.reverse();
    queue
}

/// Whether a raw signal is a readiness trigger for its root.
pub(crate) fn is_readiness_trigger(
    event_type: &str,
    target_is_root: bool,
    ready_state_complete: bool,
) -> bool {
    match event_type {
        well_known::CONTENT_PARSED => true,
        well_known::READY_STATE_CHANGED => ready_state_complete,
        well_known::LOAD => target_is_root,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TreeHost;
    use alloc::vec;
    use alloc::vec::Vec;

    fn chain_host() -> TreeHost {
        // 1 → 2 → 3 → 4 (root → A → B → C)
        TreeHost::new(vec![(2, 1), (3, 2), (4, 3)])
    }

    fn queue(host: &TreeHost, target: u32, related: Option<u32>) -> Vec<u32> {
        boundary_queue(|n| host.parent(n), 1, target, related).to_vec()
    }

    #[test]
    fn entering_outermost_boundary_queues_whole_chain() {
        let host = chain_host();
        // Innermost first: C, B, A, root.
        assert_eq!(queue(&host, 4, None), vec![4, 3, 2, 1]);
    }

    #[test]
    fn divergence_between_siblings_stops_at_common_ancestor() {
        // 1 → 2 → {3, 4}: over target B=3, related D=4.
        let host = TreeHost::new(vec![(2, 1), (3, 2), (4, 2)]);
        assert_eq!(queue(&host, 3, Some(4)), vec![3]);
    }

    #[test]
    fn descent_into_child_crosses_only_the_child() {
        let host = chain_host();
        // Moving from B into C crosses only C's boundary.
        assert_eq!(queue(&host, 4, Some(3)), vec![4]);
    }

    #[test]
    fn ascent_out_of_target_is_no_crossing() {
        let host = chain_host();
        // The related node is inside the target: the target was never left.
        assert_eq!(queue(&host, 3, Some(4)), Vec::<u32>::new());
        assert_eq!(queue(&host, 3, Some(3)), Vec::<u32>::new());
    }

    #[test]
    fn root_target_derives_nothing() {
        let host = chain_host();
        assert_eq!(queue(&host, 1, None), Vec::<u32>::new());
        assert_eq!(queue(&host, 1, Some(4)), Vec::<u32>::new());
    }

    #[test]
    fn disjoint_trees_cross_the_full_chain() {
        let host = TreeHost::new(vec![(2, 1), (3, 2), (20, 10)]);
        assert_eq!(queue(&host, 3, Some(20)), vec![3, 2, 1]);
    }

    #[test]
    fn readiness_triggers() {
        assert!(is_readiness_trigger("contentParsed", false, false));
        assert!(is_readiness_trigger("readyStateChanged", false, true));
        assert!(!is_readiness_trigger("readyStateChanged", true, false));
        assert!(is_readiness_trigger("load", true, false));
        assert!(!is_readiness_trigger("load", false, true));
        assert!(!is_readiness_trigger("press", true, true));
    }
}

#[cfg(test)]
mod engine_tests {
    use crate::engine::{Engine, Handler, Step, handler};
    use crate::host::RawEvent;
    use crate::testing::TreeHost;
    use crate::types::Signal;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<(&'static str, u32)>>>;

    fn record_targets(log: &Log, label: &'static str) -> Handler<TreeHost> {
        let log = Rc::clone(log);
        handler(move |_, step: &Step<u32>| {
            log.borrow_mut().push((label, step.event().target()));
            Signal::Continue
        })
    }

    fn chain_engine() -> Engine<TreeHost> {
        // 1 → 2 → 3 → 4
        Engine::new(TreeHost::new(vec![(2, 1), (3, 2), (4, 3)]))
    }

    #[test]
    fn enter_fires_outermost_first() {
        let mut engine = chain_engine();
        let log = Log::default();
        for node in [1, 2, 3, 4] {
            engine.register(node, "enter", &record_targets(&log, "enter"), false).unwrap();
        }
        engine
            .dispatch(RawEvent::new("pointerOver", 4).non_bubbling())
            .unwrap();
        assert_eq!(
            *log.borrow(),
            vec![("enter", 1), ("enter", 2), ("enter", 3), ("enter", 4)]
        );
    }

    #[test]
    fn leave_fires_innermost_first() {
        let mut engine = chain_engine();
        let log = Log::default();
        for node in [1, 2, 3, 4] {
            engine.register(node, "leave", &record_targets(&log, "leave"), false).unwrap();
        }
        engine
            .dispatch(RawEvent::new("pointerOut", 4).non_bubbling())
            .unwrap();
        assert_eq!(
            *log.borrow(),
            vec![("leave", 4), ("leave", 3), ("leave", 2), ("leave", 1)]
        );
    }

    #[test]
    fn sibling_transition_derives_only_the_crossed_boundary() {
        // 1 → 2 → {3, 4}
        let mut engine = Engine::new(TreeHost::new(vec![(2, 1), (3, 2), (4, 2)]));
        let log = Log::default();
        for node in [1, 2, 3, 4] {
            engine.register(node, "enter", &record_targets(&log, "enter"), false).unwrap();
        }
        engine
            .dispatch(RawEvent::new("pointerOver", 3).with_related(4).non_bubbling())
            .unwrap();
        assert_eq!(*log.borrow(), vec![("enter", 3)]);
    }

    #[test]
    fn derived_records_carry_the_raw_related_target_and_never_bubble() {
        let mut engine = chain_engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let h = handler(move |_: &mut Engine<TreeHost>, step: &Step<u32>| {
            let event = step.event();
            log.borrow_mut().push((
                event.target(),
                event.related_target(),
                event.bubbles(),
                event.is_synthetic(),
            ));
            Signal::Continue
        });
        engine.register(4, "enter", &h, false).unwrap();
        engine
            .dispatch(RawEvent::new("pointerOver", 4).with_related(3).non_bubbling())
            .unwrap();
        assert_eq!(*seen.borrow(), vec![(4, Some(3), false, true)]);
    }

    #[test]
    fn raw_handlers_run_before_derived_events() {
        let mut engine = chain_engine();
        let log = Log::default();
        engine
            .register(4, "pointerOver", &record_targets(&log, "over"), false)
            .unwrap();
        engine.register(4, "enter", &record_targets(&log, "enter"), false).unwrap();
        engine
            .dispatch(RawEvent::new("pointerOver", 4).with_related(3).non_bubbling())
            .unwrap();
        assert_eq!(*log.borrow(), vec![("over", 4), ("enter", 4)]);
    }

    #[test]
    fn stopping_the_raw_event_does_not_suppress_derivation() {
        let mut engine = chain_engine();
        let log = Log::default();
        let stopper = handler(|_: &mut Engine<TreeHost>, step: &Step<u32>| {
            step.event().stop_immediate_propagation();
            Signal::Continue
        });
        engine.register(4, "pointerOut", &stopper, false).unwrap();
        engine.register(4, "leave", &record_targets(&log, "leave"), false).unwrap();
        engine
            .dispatch(RawEvent::new("pointerOut", 4).with_related(3).non_bubbling())
            .unwrap();
        assert_eq!(*log.borrow(), vec![("leave", 4)]);
    }

    #[test]
    fn enter_registration_subscribes_node_and_root_sources() {
        let mut engine = chain_engine();
        let h = record_targets(&Log::default(), "x");
        engine.register(3, "enter", &h, false).unwrap();
        let subs = engine.host().subscriptions();
        assert_eq!(
            subs,
            vec![
                (3, String::from("pointerOver")),
                (1, String::from("pointerOver")),
            ]
        );
    }

    #[test]
    fn content_ready_fires_once_per_root() {
        let mut engine = chain_engine();
        let log = Log::default();
        engine
            .register(1, "contentReady", &record_targets(&log, "ready"), false)
            .unwrap();
        let subs = engine.host().subscriptions();
        assert_eq!(
            subs,
            vec![
                (1, String::from("contentParsed")),
                (1, String::from("readyStateChanged")),
                (1, String::from("load")),
            ]
        );

        // Not complete yet: no derivation.
        engine.dispatch(RawEvent::new("readyStateChanged", 1)).unwrap();
        assert!(log.borrow().is_empty());

        engine.host_mut().set_ready(true);
        engine.dispatch(RawEvent::new("readyStateChanged", 1)).unwrap();
        assert_eq!(*log.borrow(), vec![("ready", 1)]);
        assert!(engine.content_ready_fired(1));

        // Later triggers are absorbed by the once-only flag.
        engine.dispatch(RawEvent::new("load", 1).non_bubbling()).unwrap();
        engine.dispatch(RawEvent::new("contentParsed", 1)).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn content_ready_bubbles_from_the_root_through_nothing_above() {
        let mut engine = chain_engine();
        let log = Log::default();
        // Capture handlers below the root never see a root-targeted event;
        // the root's own lists do.
        engine
            .register(1, "contentReady", &record_targets(&log, "root"), false)
            .unwrap();
        engine.dispatch(RawEvent::new("contentParsed", 1)).unwrap();
        assert_eq!(*log.borrow(), vec![("root", 1)]);
    }

    #[test]
    fn independent_roots_keep_independent_ready_flags() {
        let mut engine = Engine::new(TreeHost::new(vec![(2, 1), (20, 10)]));
        let log = Log::default();
        engine
            .register(1, "contentReady", &record_targets(&log, "first"), false)
            .unwrap();
        engine
            .register(10, "contentReady", &record_targets(&log, "second"), false)
            .unwrap();
        engine.dispatch(RawEvent::new("contentParsed", 1)).unwrap();
        assert!(engine.content_ready_fired(1));
        assert!(!engine.content_ready_fired(10));
        engine.dispatch(RawEvent::new("contentParsed", 10)).unwrap();
        assert_eq!(*log.borrow(), vec![("first", 1), ("second", 10)]);
    }
}
