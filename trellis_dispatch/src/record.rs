// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine-owned event records and their stop/cancel state machine.
//!
//! One [`EventRecord`] exists per logical event: a top-level raw event gets
//! one when its dispatch begins, and every synthetic event derived from it
//! gets a fresh record of its own, never a mutation of the source record.
//!
//! The stop flags form a monotonic state machine scoped to one record's
//! lifetime (stack push to pop):
//!
//! ```text
//! active → propagation-stopped → stopped-at-target? → immediate-stop?
//! ```
//!
//! Flags are one-way: once set they are never cleared. The engine consults
//! them between handler invocations and between nodes; they gate only steps
//! that have not executed yet, never retroactively.
//!
//! Handlers receive a shared reference to the record through
//! [`Step`](crate::engine::Step) and interact with it via
//! [`stop_propagation`](EventRecord::stop_propagation),
//! [`stop_immediate_propagation`](EventRecord::stop_immediate_propagation),
//! and [`prevent_default`](EventRecord::prevent_default). Dispatch is
//! single-threaded and synchronous, so the interior mutability here is plain
//! [`Cell`] state.

use alloc::string::String;
use core::cell::Cell;

use crate::host::RawEvent;
use crate::types::Phase;

bitflags::bitflags! {
    /// Monotonic propagation-stop flags for one in-flight record.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct StopFlags: u8 {
        /// No further nodes are traversed.
        const STOPPED   = 0b0000_0001;
        /// The stop happened while the record was in the target phase.
        const AT_TARGET = 0b0000_0010;
        /// Remaining handlers at the current node are skipped as well.
        const IMMEDIATE = 0b0000_0100;
    }
}

/// An in-flight event, owned by the engine.
///
/// Wraps the host's raw fields and carries all mutable dispatch state:
/// current phase, stop flags, and default-prevention. Host-supplied objects
/// are never written to.
#[derive(Debug)]
pub struct EventRecord<N> {
    event_type: String,
    target: N,
    related_target: Option<N>,
    bubbles: bool,
    cancelable: bool,
    synthetic: bool,
    phase: Cell<Phase>,
    flags: Cell<StopFlags>,
    default_prevented: Cell<bool>,
}

impl<N: Copy> EventRecord<N> {
    /// Wrap a host-delivered raw event. The native default-prevented flag
    /// seeds the record's own flag.
    pub(crate) fn from_raw(raw: &RawEvent<N>) -> Self {
        Self {
            event_type: raw.event_type.clone(),
            target: raw.target,
            related_target: raw.related_target,
            bubbles: raw.bubbles,
            cancelable: raw.cancelable,
            synthetic: false,
            phase: Cell::new(Phase::Capture),
            flags: Cell::new(StopFlags::empty()),
            default_prevented: Cell::new(raw.native_default_prevented),
        }
    }

    /// Fresh record for a derived event. Synthetic events are never
    /// cancelable.
    pub(crate) fn synthetic(
        event_type: &str,
        target: N,
        related_target: Option<N>,
        bubbles: bool,
    ) -> Self {
        Self {
            event_type: String::from(event_type),
            target,
            related_target,
            bubbles,
            cancelable: false,
            synthetic: true,
            phase: Cell::new(Phase::Capture),
            flags: Cell::new(StopFlags::empty()),
            default_prevented: Cell::new(false),
        }
    }

    /// Event type name.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node that is the direct subject of the event.
    pub fn target(&self) -> N {
        self.target
    }

    /// Secondary node for transition events.
    pub fn related_target(&self) -> Option<N> {
        self.related_target
    }

    /// Whether the event traverses the bubble phase.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether handlers may suppress the default action.
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Whether this record was derived by the engine rather than delivered
    /// by the host.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// The phase the record is currently traversing.
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.set(phase);
    }

    /// Whether the default action has been suppressed so far.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Suppress the event's default action. No-op for non-cancelable
    /// events.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    /// Stop traversal to further nodes. Handlers already queued for the
    /// current node still run.
    pub fn stop_propagation(&self) {
        let mut flags = self.flags.get();
        if self.phase.get() == Phase::Target && !flags.contains(StopFlags::STOPPED) {
            flags |= StopFlags::AT_TARGET;
        }
        flags |= StopFlags::STOPPED;
        self.flags.set(flags);
    }

    /// Stop traversal and skip the remaining handlers at the current node.
    /// Implies [`stop_propagation`](Self::stop_propagation).
    pub fn stop_immediate_propagation(&self) {
        self.stop_propagation();
        self.flags.set(self.flags.get() | StopFlags::IMMEDIATE);
    }

    /// Whether propagation to further nodes has been stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.flags.get().contains(StopFlags::STOPPED)
    }

    /// Whether the stop happened during the target phase.
    pub fn stopped_at_target(&self) -> bool {
        self.flags.get().contains(StopFlags::AT_TARGET)
    }

    /// Whether the remaining handlers at the stopping node were skipped.
    pub fn stopped_immediately(&self) -> bool {
        self.flags.get().contains(StopFlags::IMMEDIATE)
    }

    /// Whether the next handler batch may run, honoring the target-phase
    /// nuance: a stop raised exactly at the target suppresses further phase
    /// transitions but lets the target node's own remaining lists run.
    pub(crate) fn may_run(&self) -> bool {
        let flags = self.flags.get();
        !flags.contains(StopFlags::STOPPED)
            || (self.phase.get() == Phase::Target
                && flags.contains(StopFlags::AT_TARGET)
                && !flags.contains(StopFlags::IMMEDIATE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press_record() -> EventRecord<u32> {
        EventRecord::from_raw(&RawEvent::new("press", 7_u32))
    }

    #[test]
    fn stop_flags_are_monotonic() {
        let rec = press_record();
        assert!(!rec.propagation_stopped());
        rec.stop_propagation();
        assert!(rec.propagation_stopped());
        // A later immediate stop adds to, never resets, the earlier stop.
        rec.stop_immediate_propagation();
        assert!(rec.propagation_stopped());
        assert!(rec.stopped_immediately());
    }

    #[test]
    fn stop_at_target_is_recorded_only_for_first_stop_in_target_phase() {
        let rec = press_record();
        rec.set_phase(Phase::Target);
        rec.stop_propagation();
        assert!(rec.stopped_at_target());

        let rec = press_record();
        rec.set_phase(Phase::Capture);
        rec.stop_propagation();
        assert!(!rec.stopped_at_target());
        // Already stopped before target: the nuance does not apply.
        rec.set_phase(Phase::Target);
        rec.stop_propagation();
        assert!(!rec.stopped_at_target());
    }

    #[test]
    fn target_phase_stop_still_permits_target_lists() {
        let rec = press_record();
        rec.set_phase(Phase::Target);
        rec.stop_propagation();
        assert!(rec.may_run());
        rec.set_phase(Phase::Bubble);
        assert!(!rec.may_run());
    }

    #[test]
    fn immediate_stop_blocks_even_at_target() {
        let rec = press_record();
        rec.set_phase(Phase::Target);
        rec.stop_immediate_propagation();
        assert!(!rec.may_run());
    }

    #[test]
    fn prevent_default_honors_cancelable() {
        let rec = press_record();
        rec.prevent_default();
        assert!(rec.default_prevented());

        let raw = RawEvent::new("press", 7_u32).non_cancelable();
        let rec = EventRecord::from_raw(&raw);
        rec.prevent_default();
        assert!(!rec.default_prevented());
    }

    #[test]
    fn native_flag_seeds_the_record() {
        let mut raw = RawEvent::new("press", 7_u32);
        raw.native_default_prevented = true;
        let rec = EventRecord::from_raw(&raw);
        assert!(rec.default_prevented());
    }

    #[test]
    fn synthetic_records_are_never_cancelable() {
        let rec: EventRecord<u32> = EventRecord::synthetic("enter", 3, Some(9), false);
        assert!(rec.is_synthetic());
        assert!(!rec.cancelable());
        rec.prevent_default();
        assert!(!rec.default_prevented());
    }
}
