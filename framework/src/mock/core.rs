//! The mock dispatch core
//!
//! A [`MockCore`] backs every generated mock: it knows the mocked trait's
//! method table, owns the behavior definitions, shares the test's
//! [`Scenario`](super::Scenario), and dispatches each incoming invocation.
//! The fluent [`BehaviorBuilder`] (`mock.when("find").returns(..)`) and
//! [`VerifyBuilder`] (`mock.verify("find").invoked()`) both live here;
//! generated mocks simply delegate to them.
//!
//! Dispatch records the invocation first, then picks the first matching
//! unconsumed one-time behavior, then the first matching always behavior;
//! when nothing matches the generated method produces the default return
//! value for its type.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AttestError;

use super::behavior::{BehaviorDefinition, DispatchOutcome, MockBehavior};
use super::invocation::{ArgValue, CallSite, Invocation, MethodDescriptor, MethodSignature};
use super::matcher::{any, ArgumentMatcher, InvocationMatcher};
use super::scenario::Scenario;

/// Shared state of one mock object
///
/// Cloning a `MockCore` (or a generated mock) yields a handle to the same
/// behavior table and scenario, so a mock can be handed to the tested code
/// and still be verified afterwards.
#[derive(Clone)]
pub struct MockCore {
    name: Arc<String>,
    trait_name: &'static str,
    methods: &'static [MethodDescriptor],
    behaviors: Arc<Mutex<Vec<BehaviorDefinition>>>,
    scenario: Arc<Mutex<Scenario>>,
}

impl MockCore {
    pub fn new(
        name: String,
        trait_name: &'static str,
        methods: &'static [MethodDescriptor],
        scenario: Arc<Mutex<Scenario>>,
    ) -> Self {
        Self {
            name: Arc::new(name),
            trait_name,
            methods,
            behaviors: Arc::new(Mutex::new(Vec::new())),
            scenario,
        }
    }

    /// The mock's name (the receiver identity in recorded invocations)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mocked trait's name
    pub fn trait_name(&self) -> &'static str {
        self.trait_name
    }

    /// The scenario this mock records into
    pub fn scenario(&self) -> Arc<Mutex<Scenario>> {
        Arc::clone(&self.scenario)
    }

    fn descriptor(&self, method: &str) -> Result<&'static MethodDescriptor, AttestError> {
        self.methods
            .iter()
            .find(|descriptor| descriptor.name == method)
            .ok_or_else(|| {
                let declared: Vec<&str> =
                    self.methods.iter().map(|descriptor| descriptor.name).collect();
                AttestError::unknown_method(self.name.as_str(), method, &declared)
            })
    }

    fn signature_of(&self, descriptor: &MethodDescriptor) -> MethodSignature {
        MethodSignature {
            trait_name: self.trait_name,
            method: descriptor.name,
            param_types: descriptor.param_types,
        }
    }

    /// Build the invocation record for a call on `method`.
    ///
    /// Used by generated mock methods; the method is guaranteed to exist
    /// because the same macro emitted both the method table and the call.
    pub fn invocation(
        &self,
        method: &str,
        arguments: Vec<ArgValue>,
        invoked_at: CallSite,
    ) -> Invocation {
        let descriptor = match self.descriptor(method) {
            Ok(descriptor) => descriptor,
            Err(err) => panic!("{}", err),
        };
        Invocation::new(
            self.name.as_str(),
            self.signature_of(descriptor),
            arguments,
            invoked_at,
        )
    }

    /// Record an invocation and resolve the behavior to execute.
    ///
    /// The invocation is registered in the scenario regardless of whether a
    /// behavior matches, so verification always sees the complete call log.
    pub fn dispatch(&self, invocation: Invocation) -> DispatchOutcome {
        self.scenario
            .lock()
            .expect("scenario lock poisoned")
            .register_invocation(invocation.clone());

        let behavior = {
            let mut behaviors = self.behaviors.lock().expect("behavior lock poisoned");
            let one_time = behaviors.iter_mut().find(|definition| {
                definition.is_one_time()
                    && definition.is_available()
                    && definition.matches(&invocation)
            });
            match one_time {
                Some(definition) => {
                    definition.mark_used();
                    Some(definition.behavior().clone())
                }
                None => behaviors
                    .iter()
                    .find(|definition| {
                        !definition.is_one_time() && definition.matches(&invocation)
                    })
                    .map(|definition| definition.behavior().clone()),
            }
        };

        match behavior {
            Some(MockBehavior::Returns(value)) => DispatchOutcome::Value(value),
            Some(MockBehavior::Raises(error)) => DispatchOutcome::Error(error),
            Some(MockBehavior::Panics(message)) => panic!("{}", message),
            Some(MockBehavior::Performs(callback)) => {
                DispatchOutcome::Value(callback(&invocation))
            }
            None => DispatchOutcome::Default,
        }
    }

    /// Start defining behavior for a method.
    ///
    /// Panics eagerly when the method does not exist: that is a test-setup
    /// error, not a verification failure.
    #[track_caller]
    pub fn when(&self, method: &str) -> BehaviorBuilder<'_> {
        let descriptor = match self.descriptor(method) {
            Ok(descriptor) => descriptor,
            Err(err) => panic!("{}", err),
        };
        BehaviorBuilder {
            core: self,
            descriptor,
            matchers: None,
            one_time: false,
        }
    }

    /// Start verifying invocations of a method
    #[track_caller]
    pub fn verify(&self, method: &str) -> VerifyBuilder<'_> {
        let descriptor = match self.descriptor(method) {
            Ok(descriptor) => descriptor,
            Err(err) => panic!("{}", err),
        };
        VerifyBuilder {
            core: self,
            descriptor,
            matchers: None,
        }
    }

    /// All recorded invocations of a method on this mock
    pub fn invocations(&self, method: &str) -> Vec<Invocation> {
        self.scenario
            .lock()
            .expect("scenario lock poisoned")
            .observed_invocations()
            .into_iter()
            .filter(|invocation| {
                invocation.mock_name() == self.name.as_str()
                    && invocation.signature().method == method
            })
            .cloned()
            .collect()
    }

    /// Remove all behavior defined for this mock. Observed invocations are
    /// kept.
    pub fn reset_behavior(&self) {
        self.behaviors
            .lock()
            .expect("behavior lock poisoned")
            .clear();
    }

    fn add_behavior(&self, definition: BehaviorDefinition) {
        self.behaviors
            .lock()
            .expect("behavior lock poisoned")
            .push(definition);
    }

    /// Convert a behavior value into the method's return type.
    ///
    /// Used by generated mock methods.
    pub fn return_value<R: DeserializeOwned>(&self, method: &str, value: Value) -> R {
        serde_json::from_value(value).unwrap_or_else(|err| {
            panic!(
                "{}",
                AttestError::ReturnValue {
                    mock: self.name.to_string(),
                    method: method.to_string(),
                    reason: err.to_string(),
                }
            )
        })
    }

    /// Convert a raised error value into a `Result` return type.
    ///
    /// Used by generated mock methods.
    pub fn error_value<R: DeserializeOwned>(&self, method: &str, error: Value) -> R {
        serde_json::from_value(json!({ "Err": error })).unwrap_or_else(|err| {
            panic!(
                "{}",
                AttestError::ReturnValue {
                    mock: self.name.to_string(),
                    method: method.to_string(),
                    reason: format!(
                        "raises() requires a Result return type ({})",
                        err
                    ),
                }
            )
        })
    }

    /// Produce the default return value for an unmatched invocation: null,
    /// false, zero, or an empty string/collection, whichever fits the
    /// return type first. A type with no such default (e.g. `Result`)
    /// panics with a diagnostic asking for an explicit behavior.
    ///
    /// Used by generated mock methods.
    pub fn default_return<R: DeserializeOwned>(&self, method: &str) -> R {
        let candidates = [
            Value::Null,
            Value::Bool(false),
            json!(0),
            json!(""),
            json!([]),
            json!({}),
        ];
        for candidate in candidates {
            if let Ok(value) = serde_json::from_value(candidate) {
                return value;
            }
        }
        panic!(
            "{}",
            AttestError::ReturnValue {
                mock: self.name.to_string(),
                method: method.to_string(),
                reason: format!(
                    "no behavior matched and the return type has no default; \
                     define one with when(\"{}\")",
                    method
                ),
            }
        )
    }
}

impl std::fmt::Debug for MockCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCore")
            .field("name", &self.name)
            .field("trait_name", &self.trait_name)
            .finish()
    }
}

/// Fluent behavior definition, started with `mock.when(method)`
///
/// Terminal calls register the behavior:
///
/// ```rust,ignore
/// repository.when("by_id").with([eq(7u64)]).returns(Some(order));
/// repository.when("by_id").once().returns(None::<Order>);
/// repository.when("save").raises(RepositoryError::Conflict);
/// ```
#[must_use = "a behavior is only registered by a terminal call such as returns()"]
pub struct BehaviorBuilder<'a> {
    core: &'a MockCore,
    descriptor: &'static MethodDescriptor,
    matchers: Option<Vec<ArgumentMatcher>>,
    one_time: bool,
}

impl BehaviorBuilder<'_> {
    /// Restrict the behavior to invocations whose arguments satisfy the
    /// given matchers (one per parameter)
    pub fn with(mut self, matchers: impl IntoIterator<Item = ArgumentMatcher>) -> Self {
        self.matchers = Some(matchers.into_iter().collect());
        self
    }

    /// Make this a one-time behavior, consumed by its first match
    pub fn once(mut self) -> Self {
        self.one_time = true;
        self
    }

    /// Return the given value on every match
    #[track_caller]
    pub fn returns<T: Serialize>(self, value: T) {
        let value = to_behavior_value(self.core, self.descriptor.name, &value);
        self.register(MockBehavior::Returns(value));
    }

    /// Deliver the given error through the method's `Result` return type on
    /// every match
    #[track_caller]
    pub fn raises<E: Serialize>(self, error: E) {
        let error = to_behavior_value(self.core, self.descriptor.name, &error);
        self.register(MockBehavior::Raises(error));
    }

    /// Panic with the given message on every match
    #[track_caller]
    pub fn panics(self, message: impl Into<String>) {
        self.register(MockBehavior::Panics(message.into()));
    }

    /// Run the given callback on every match and return its result
    #[track_caller]
    pub fn performs<F, T>(self, behavior: F)
    where
        F: Fn(&Invocation) -> T + Send + Sync + 'static,
        T: Serialize,
    {
        let callback = Arc::new(move |invocation: &Invocation| {
            serde_json::to_value(behavior(invocation)).unwrap_or_else(|err| {
                panic!("performs() callback produced an unserializable value: {}", err)
            })
        });
        self.register(MockBehavior::Performs(callback));
    }

    #[track_caller]
    fn register(self, behavior: MockBehavior) {
        let matcher = build_matcher(self.core, self.descriptor, self.matchers);
        self.core
            .add_behavior(BehaviorDefinition::new(matcher, behavior, self.one_time));
    }
}

/// Fluent verification, started with `mock.verify(method)`
///
/// Terminal calls run the verification and panic with the scenario report on
/// failure:
///
/// ```rust,ignore
/// repository.verify("by_id").with([eq(7u64)]).invoked();
/// notifier.verify("order_confirmed").not_invoked();
/// ```
#[must_use = "a verification only runs on a terminal call such as invoked()"]
pub struct VerifyBuilder<'a> {
    core: &'a MockCore,
    descriptor: &'static MethodDescriptor,
    matchers: Option<Vec<ArgumentMatcher>>,
}

impl VerifyBuilder<'_> {
    /// Restrict the verification to invocations whose arguments satisfy the
    /// given matchers (one per parameter)
    pub fn with(mut self, matchers: impl IntoIterator<Item = ArgumentMatcher>) -> Self {
        self.matchers = Some(matchers.into_iter().collect());
        self
    }

    /// Assert that a matching invocation was observed; consumes it
    #[track_caller]
    pub fn invoked(self) {
        let matcher = build_matcher(self.core, self.descriptor, self.matchers);
        let result = self
            .core
            .scenario
            .lock()
            .expect("scenario lock poisoned")
            .verify_invoked(&matcher);
        if let Err(err) = result {
            panic!("{}", err);
        }
    }

    /// Assert that a matching invocation was observed in the same order as
    /// the in-sequence verifications; consumes it
    #[track_caller]
    pub fn invoked_in_sequence(self) {
        let matcher = build_matcher(self.core, self.descriptor, self.matchers);
        let result = self
            .core
            .scenario
            .lock()
            .expect("scenario lock poisoned")
            .verify_invoked_in_sequence(&matcher);
        if let Err(err) = result {
            panic!("{}", err);
        }
    }

    /// Assert that no matching invocation was observed, consumed or not
    #[track_caller]
    pub fn not_invoked(self) {
        let matcher = build_matcher(self.core, self.descriptor, self.matchers);
        let result = self
            .core
            .scenario
            .lock()
            .expect("scenario lock poisoned")
            .verify_not_invoked(&matcher);
        if let Err(err) = result {
            panic!("{}", err);
        }
    }
}

#[track_caller]
fn build_matcher(
    core: &MockCore,
    descriptor: &'static MethodDescriptor,
    matchers: Option<Vec<ArgumentMatcher>>,
) -> InvocationMatcher {
    let arity = descriptor.param_types.len();
    let matchers = match matchers {
        Some(matchers) => {
            if matchers.len() != arity {
                panic!(
                    "{}",
                    AttestError::MatcherCount {
                        method: descriptor.name.to_string(),
                        arity,
                        matchers: matchers.len(),
                    }
                );
            }
            matchers
        }
        None => vec![any(); arity],
    };
    InvocationMatcher::new(
        core.name().to_string(),
        MethodSignature {
            trait_name: core.trait_name(),
            method: descriptor.name,
            param_types: descriptor.param_types,
        },
        matchers,
    )
}

fn to_behavior_value<T: Serialize>(core: &MockCore, method: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        panic!(
            "{}",
            AttestError::ReturnValue {
                mock: core.name().to_string(),
                method: method.to_string(),
                reason: format!("behavior value could not be serialized ({})", err),
            }
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::context::TestContext;
    use crate::mock::matcher::eq;

    const METHODS: &[MethodDescriptor] = &[
        MethodDescriptor {
            name: "by_id",
            param_types: &["u64"],
        },
        MethodDescriptor {
            name: "count",
            param_types: &[],
        },
    ];

    fn mock(context: &TestContext) -> MockCore {
        MockCore::new(
            "repository_mock".to_string(),
            "Repository",
            METHODS,
            context.scenario(),
        )
    }

    fn call(core: &MockCore, argument: u64) -> DispatchOutcome {
        let invocation = core.invocation(
            "by_id",
            vec![ArgValue::of(&argument)],
            CallSite::new("t", 1),
        );
        core.dispatch(invocation)
    }

    #[test]
    fn always_behaviors_serve_every_match() {
        let context = TestContext::new();
        let core = mock(&context);
        core.when("by_id").with([eq(7u64)]).returns("found");

        for _ in 0..2 {
            match call(&core, 7) {
                DispatchOutcome::Value(value) => assert_eq!(value, json!("found")),
                other => panic!("expected a value outcome, got {:?}", other),
            }
        }
    }

    #[test]
    fn one_time_behaviors_are_consumed_in_definition_order() {
        let context = TestContext::new();
        let core = mock(&context);
        core.when("by_id").once().returns("first");
        core.when("by_id").once().returns("second");
        core.when("by_id").returns("fallback");

        let values: Vec<DispatchOutcome> =
            (0..3).map(|_| call(&core, 1)).collect();
        match (&values[0], &values[1], &values[2]) {
            (
                DispatchOutcome::Value(first),
                DispatchOutcome::Value(second),
                DispatchOutcome::Value(third),
            ) => {
                assert_eq!(first, &json!("first"));
                assert_eq!(second, &json!("second"));
                assert_eq!(third, &json!("fallback"));
            }
            other => panic!("expected three value outcomes, got {:?}", other),
        }
    }

    #[test]
    fn unmatched_invocations_dispatch_to_default() {
        let context = TestContext::new();
        let core = mock(&context);
        core.when("by_id").with([eq(7u64)]).returns("found");

        assert!(matches!(call(&core, 8), DispatchOutcome::Default));
    }

    #[test]
    fn every_invocation_is_recorded() {
        let context = TestContext::new();
        let core = mock(&context);
        call(&core, 1);
        call(&core, 2);
        assert_eq!(core.invocations("by_id").len(), 2);
    }

    #[test]
    #[should_panic(expected = "has no method named")]
    fn unknown_methods_fail_eagerly() {
        let context = TestContext::new();
        let core = mock(&context);
        core.when("missing").returns(1);
    }

    #[test]
    #[should_panic(expected = "matcher(s) were given")]
    fn matcher_arity_is_checked_at_definition_time() {
        let context = TestContext::new();
        let core = mock(&context);
        core.when("by_id").with([eq(1u64), eq(2u64)]).returns(1);
    }

    #[test]
    fn default_return_covers_common_types() {
        let context = TestContext::new();
        let core = mock(&context);
        let unit: () = core.default_return("by_id");
        let option: Option<String> = core.default_return("by_id");
        let flag: bool = core.default_return("by_id");
        let number: u32 = core.default_return("by_id");
        let list: Vec<String> = core.default_return("by_id");
        assert_eq!(unit, ());
        assert_eq!(option, None);
        assert!(!flag);
        assert_eq!(number, 0);
        assert!(list.is_empty());
    }

    #[test]
    #[should_panic(expected = "no behavior matched")]
    fn default_return_panics_for_result_types() {
        let context = TestContext::new();
        let core = mock(&context);
        let _: Result<u32, String> = core.default_return("by_id");
    }

    #[test]
    fn raises_builds_the_err_arm() {
        let context = TestContext::new();
        let core = mock(&context);
        let result: Result<u32, String> =
            core.error_value("by_id", json!("boom"));
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn reset_behavior_keeps_observed_invocations() {
        let context = TestContext::new();
        let core = mock(&context);
        core.when("by_id").returns(1);
        call(&core, 1);
        core.reset_behavior();
        assert!(matches!(call(&core, 1), DispatchOutcome::Default));
        assert_eq!(core.invocations("by_id").len(), 2);
    }
}
