//! Mock behaviors
//!
//! A behavior decides what a mocked method does when an invocation matches
//! its expectation: return a value, deliver an error, panic, or run a
//! callback. Behaviors come in two flavors, one-time (consumed on first
//! match) and always (reusable), mirroring the `once_*` / plain split on the
//! behavior builder.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::invocation::Invocation;
use super::matcher::InvocationMatcher;

/// What a matched mocked method call does
#[derive(Clone)]
pub enum MockBehavior {
    /// Produce this value as the return value
    Returns(Value),
    /// Deliver this value as the `Err` arm of a `Result` return type
    Raises(Value),
    /// Panic with this message (the analog of throwing through a
    /// non-`Result` method)
    Panics(String),
    /// Run a callback over the invocation and return its result
    Performs(Arc<dyn Fn(&Invocation) -> Value + Send + Sync>),
}

impl fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Returns(value) => f.debug_tuple("Returns").field(value).finish(),
            Self::Raises(value) => f.debug_tuple("Raises").field(value).finish(),
            Self::Panics(message) => f.debug_tuple("Panics").field(message).finish(),
            Self::Performs(_) => f.write_str("Performs(<callback>)"),
        }
    }
}

/// A behavior bound to an invocation expectation
#[derive(Debug, Clone)]
pub struct BehaviorDefinition {
    matcher: InvocationMatcher,
    behavior: MockBehavior,
    one_time: bool,
    used: bool,
}

impl BehaviorDefinition {
    pub fn new(matcher: InvocationMatcher, behavior: MockBehavior, one_time: bool) -> Self {
        Self {
            matcher,
            behavior,
            one_time,
            used: false,
        }
    }

    pub fn matcher(&self) -> &InvocationMatcher {
        &self.matcher
    }

    pub fn behavior(&self) -> &MockBehavior {
        &self.behavior
    }

    pub fn is_one_time(&self) -> bool {
        self.one_time
    }

    /// True if this definition can still serve an invocation
    pub fn is_available(&self) -> bool {
        !(self.one_time && self.used)
    }

    /// Check this definition against an invocation without consuming it
    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.matcher.matches(invocation)
    }

    /// Consume a one-time definition
    pub fn mark_used(&mut self) {
        self.used = true;
    }
}

/// The result of dispatching an invocation against the behavior table
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// A behavior produced a return value
    Value(Value),
    /// A behavior produced an error value for a `Result` return type
    Error(Value),
    /// No behavior matched; the caller produces the default return value
    Default,
}
