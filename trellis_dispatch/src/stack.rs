// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-root dispatch state: the reentrant event stack and readiness flag.
//!
//! A handler may synchronously trigger another dispatch before returning.
//! The nested event's record is pushed on top of the outer one and fully
//! popped before the outer traversal resumes, mirroring the synchronous call
//! stack. Pushes hand back a guard that pops on drop, so the stack stays
//! balanced on every exit path, including a panicking handler.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::record::EventRecord;

/// One context per independent tree root, created lazily on first
/// registration or dispatch for a node under that root.
pub(crate) struct RootContext<N> {
    pub(crate) stack: EventStack<N>,
    /// Permanently set once content-ready has fired for this root.
    pub(crate) content_ready_fired: bool,
}

impl<N> RootContext<N> {
    pub(crate) fn new() -> Self {
        Self {
            stack: EventStack::new(),
            content_ready_fired: false,
        }
    }
}

/// Stack of in-flight event records for one root, most recent on top.
///
/// Handles are cheap clones sharing the same storage, so a guard stays
/// valid even if the owning root context is torn down mid-dispatch.
pub(crate) struct EventStack<N> {
    records: Rc<RefCell<Vec<Rc<EventRecord<N>>>>>,
}

impl<N> Clone for EventStack<N> {
    fn clone(&self) -> Self {
        Self {
            records: Rc::clone(&self.records),
        }
    }
}

impl<N> EventStack<N> {
    pub(crate) fn new() -> Self {
        Self {
            records: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Push a record, returning a guard that pops it again on drop.
    pub(crate) fn push(&self, record: Rc<EventRecord<N>>) -> StackGuard<N> {
        self.records.borrow_mut().push(record);
        StackGuard {
            records: Rc::clone(&self.records),
        }
    }

    /// Number of records currently in flight.
    pub(crate) fn depth(&self) -> usize {
        self.records.borrow().len()
    }

    /// The record whose traversal is currently innermost.
    pub(crate) fn top(&self) -> Option<Rc<EventRecord<N>>> {
        self.records.borrow().last().cloned()
    }
}

/// Scoped-release handle for one stack entry.
///
/// Nesting is strict LIFO via the call stack, so popping from the top on
/// drop always removes the entry this guard pushed.
pub(crate) struct StackGuard<N> {
    records: Rc<RefCell<Vec<Rc<EventRecord<N>>>>>,
}

impl<N> Drop for StackGuard<N> {
    fn drop(&mut self) {
        self.records.borrow_mut().pop();
    }
}
