// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the dispatch engine: phases, signals, policies, and errors.
//!
//! ## Overview
//!
//! These types describe the propagation protocol and its inputs/outputs.
//! They are referenced by the [`engine`](crate::engine) and used by host
//! adapters and handler code alike.

use alloc::string::String;
use core::num::NonZeroU64;

/// Phases of event propagation.
///
/// Appears on each [`Step`](crate::engine::Step) handed to a handler, and on
/// the in-flight [`EventRecord`](crate::record::EventRecord).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Root-to-target traversal, excluding the target.
    Capture,
    /// Handler execution at the event target itself.
    Target,
    /// Target-to-root traversal, excluding the target.
    Bubble,
}

/// Identifier assigned to a handler callback.
///
/// Ids are assigned once per callback identity, start at 1, and are stable
/// across repeated registrations of the same callback. A zero id is
/// unrepresentable by construction.
pub type HandlerId = NonZeroU64;

/// A handler's verdict about the event's default action.
///
/// Returned from every handler invocation and folded into the dispatch
/// outcome according to the event type's [`ReturnPolicy`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Signal {
    /// No opinion; the default action proceeds unless another handler
    /// objects.
    #[default]
    Continue,
    /// Request suppression of the event's default action.
    PreventDefault,
    /// A prompt string for before-unload style events. Empty strings are
    /// treated as no signal.
    Prompt(String),
}

/// How handler return signals are folded into one result for an event type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReturnPolicy {
    /// Default action is suppressed if **any** handler asks for it and the
    /// event is cancelable.
    AnyCancels,
    /// Pointer-over class: any handler asking for suppression wins, without
    /// the cancelable gate. The aggregate starts falsy (legacy inverted
    /// polarity).
    EnterLike,
    /// Before-unload class: only the **first** non-empty prompt across all
    /// handlers is retained; later signals are ignored.
    FirstPromptWins,
}

impl ReturnPolicy {
    /// Select the aggregation policy for an event type.
    pub fn for_type(event_type: &str) -> Self {
        if event_type == well_known::BEFORE_UNLOAD {
            Self::FirstPromptWins
        } else if event_type == well_known::POINTER_OVER {
            Self::EnterLike
        } else {
            Self::AnyCancels
        }
    }
}

/// Aggregated result of one top-level dispatch.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Outcome {
    /// The default action for the event should be suppressed.
    pub default_prevented: bool,
    /// First non-empty prompt collected under
    /// [`ReturnPolicy::FirstPromptWins`].
    pub prompt: Option<String>,
}

/// Argument validation failure raised by `register`, `unregister`, and
/// `dispatch`.
///
/// These are the only errors the engine raises; everything else (duplicate
/// registration, unregistering a missing entry, repeated readiness signals)
/// is silently absorbed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InvalidArgument {
    /// The node is not part of the host tree.
    Node,
    /// The event type violates the identifier grammar.
    Type,
    /// The handler reference cannot be resolved to an id.
    Handler,
}

impl core::fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Node => f.write_str("invalid argument: node is not owned by the host tree"),
            Self::Type => f.write_str("invalid argument: malformed event type identifier"),
            Self::Handler => f.write_str("invalid argument: unresolvable handler reference"),
        }
    }
}

impl core::error::Error for InvalidArgument {}

/// Check an event type name against the identifier grammar: ASCII letters
/// and digits, starting with a letter.
///
/// Event types are case-sensitive and never carry an `on` prefix (use
/// `"press"`, not `"onpress"`).
pub fn is_valid_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Event type names the engine gives special treatment.
///
/// Derived types ([`ENTER`](well_known::ENTER), [`LEAVE`](well_known::LEAVE),
/// [`CONTENT_READY`](well_known::CONTENT_READY)) are registered exactly like
/// primitive types; the engine wires up the raw source subscriptions behind
/// the scenes.
pub mod well_known {
    /// Synthetic boundary-entry event, derived from [`POINTER_OVER`].
    pub const ENTER: &str = "enter";
    /// Synthetic boundary-exit event, derived from [`POINTER_OUT`].
    pub const LEAVE: &str = "leave";
    /// Synthetic readiness event; fires at most once per root.
    pub const CONTENT_READY: &str = "contentReady";

    /// Raw transition signal carrying the entered target and the node the
    /// pointer came from.
    pub const POINTER_OVER: &str = "pointerOver";
    /// Raw transition signal carrying the exited target and the node the
    /// pointer moved to.
    pub const POINTER_OUT: &str = "pointerOut";

    /// Native readiness signal: the host finished parsing its content.
    pub const CONTENT_PARSED: &str = "contentParsed";
    /// Raw readiness-state change; checked against the host's readiness
    /// query.
    pub const READY_STATE_CHANGED: &str = "readyStateChanged";
    /// Full-load signal; counts as readiness when it targets the root.
    pub const LOAD: &str = "load";

    /// Before-unload class event with first-prompt-wins aggregation.
    pub const BEFORE_UNLOAD: &str = "beforeUnload";
    /// Unload signal; dispatching it at a root tears that root down.
    pub const UNLOAD: &str = "unload";
}
