//! Argument and invocation matchers
//!
//! An [`ArgumentMatcher`] is a predicate over one recorded argument; an
//! [`InvocationMatcher`] combines a method signature with one matcher per
//! parameter and recognizes matching [`Invocation`]s. Matching failures are
//! plain `false` results, never errors; the scenario verifications turn
//! them into assertion failures.

use std::fmt;

use serde::Serialize;

use crate::compare::{
    format_value, CompareMode, ReflectComparator, ReflectValue, LENIENT,
};
use crate::config::AttestConfig;

use super::invocation::{ArgValue, Invocation, MethodSignature};

/// A predicate over a single actual argument value
///
/// Construct through the free functions in this module: [`any`], [`eq`],
/// [`len_eq`], [`ref_eq`], [`same`], [`is_null`], [`not_null`] and [`val`].
/// Matchers are stateless except for the captured expected value; `eq`,
/// `len_eq` and `val` snapshot the expected value at construction time.
#[derive(Debug, Clone)]
pub enum ArgumentMatcher {
    /// Matches every argument
    Any,
    /// Matches a null (`None`) argument
    IsNull,
    /// Matches any non-null argument
    NotNull,
    /// Matches an argument passed by reference to the same address
    Same {
        expected_ptr: usize,
        description: String,
    },
    /// Matches by strict value equality
    Eq { expected: ReflectValue },
    /// Matches by structural comparison with explicit modes
    RefEq {
        expected: ReflectValue,
        modes: Vec<CompareMode>,
    },
    /// Matches by lenient structural comparison (lenient order + ignore
    /// defaults)
    LenEq { expected: ReflectValue },
    /// The matcher used for bare values: lenient, except that a root-level
    /// default value (null / 0 / false) is compared strictly
    Value { expected: ReflectValue },
}

/// Matches every argument
pub fn any() -> ArgumentMatcher {
    ArgumentMatcher::Any
}

/// Matches a null (`None`) argument
pub fn is_null() -> ArgumentMatcher {
    ArgumentMatcher::IsNull
}

/// Matches any non-null argument
pub fn not_null() -> ArgumentMatcher {
    ArgumentMatcher::NotNull
}

/// Matches an argument passed by reference to the same address.
///
/// Only reference parameters record an address, so `same()` never matches an
/// argument that was passed by value.
pub fn same<T>(expected: &T) -> ArgumentMatcher
where
    T: Serialize + ?Sized,
{
    ArgumentMatcher::Same {
        expected_ptr: expected as *const T as *const () as usize,
        description: format_value(&reflect(expected)),
    }
}

/// Matches by strict value equality
pub fn eq<T: Serialize>(expected: T) -> ArgumentMatcher {
    ArgumentMatcher::Eq {
        expected: reflect(&expected),
    }
}

/// Matches by strict structural comparison
pub fn ref_eq<T: Serialize>(expected: T) -> ArgumentMatcher {
    ref_eq_with(expected, &[])
}

/// Matches by structural comparison with explicit modes
pub fn ref_eq_with<T: Serialize>(expected: T, modes: &[CompareMode]) -> ArgumentMatcher {
    ArgumentMatcher::RefEq {
        expected: reflect(&expected),
        modes: modes.to_vec(),
    }
}

/// Matches by lenient structural comparison: element order is ignored and
/// expected-side defaults are skipped
pub fn len_eq<T: Serialize>(expected: T) -> ArgumentMatcher {
    ArgumentMatcher::LenEq {
        expected: reflect(&expected),
    }
}

/// The matcher used for bare argument values.
///
/// Compares leniently, except that a root-level default value (null / 0 /
/// false) is compared strictly; `val(0)` only matches an actual `0`.
pub fn val<T: Serialize>(expected: T) -> ArgumentMatcher {
    ArgumentMatcher::Value {
        expected: reflect(&expected),
    }
}

fn reflect<T>(value: &T) -> ReflectValue
where
    T: Serialize + ?Sized,
{
    match ReflectValue::from_serialize(value, AttestConfig::current().max_depth) {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    }
}

impl ArgumentMatcher {
    /// Apply this matcher to one recorded argument
    pub fn matches(&self, actual: &ArgValue) -> bool {
        match self {
            Self::Any => true,
            Self::IsNull => actual.value().is_null(),
            Self::NotNull => !actual.value().is_null(),
            Self::Same { expected_ptr, .. } => actual.source_ptr() == Some(*expected_ptr),
            Self::Eq { expected } => expected == actual.value(),
            Self::RefEq { expected, modes } => {
                ReflectComparator::new(modes).is_equal(expected, actual.value())
            }
            Self::LenEq { expected } => {
                ReflectComparator::new(LENIENT).is_equal(expected, actual.value())
            }
            Self::Value { expected } => {
                if expected.is_default() {
                    expected == actual.value()
                } else {
                    ReflectComparator::new(LENIENT).is_equal(expected, actual.value())
                }
            }
        }
    }
}

impl fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any()"),
            Self::IsNull => write!(f, "is_null()"),
            Self::NotNull => write!(f, "not_null()"),
            Self::Same { description, .. } => write!(f, "same({})", description),
            Self::Eq { expected } => write!(f, "eq({})", format_value(expected)),
            Self::RefEq { expected, .. } => write!(f, "ref_eq({})", format_value(expected)),
            Self::LenEq { expected } => write!(f, "len_eq({})", format_value(expected)),
            Self::Value { expected } => write!(f, "{}", format_value(expected)),
        }
    }
}

/// A declarative expectation: receiver, method signature and one matcher per
/// parameter
///
/// Invariant: a non-zero matcher count must equal the method's parameter
/// count. A mismatched count makes [`matches`](Self::matches) reject every
/// invocation, by construction of the argument-count check.
#[derive(Debug, Clone)]
pub struct InvocationMatcher {
    mock_name: String,
    signature: MethodSignature,
    matchers: Vec<ArgumentMatcher>,
}

impl InvocationMatcher {
    pub fn new(
        mock_name: impl Into<String>,
        signature: MethodSignature,
        matchers: Vec<ArgumentMatcher>,
    ) -> Self {
        Self {
            mock_name: mock_name.into(),
            signature,
            matchers,
        }
    }

    /// The expected receiver (mock) name
    pub fn mock_name(&self) -> &str {
        &self.mock_name
    }

    /// The expected method signature
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// The per-parameter matchers
    pub fn matchers(&self) -> &[ArgumentMatcher] {
        &self.matchers
    }

    /// Check whether an invocation satisfies this expectation:
    /// receiver, signature and argument count must agree, then every
    /// positional matcher must accept its argument (short-circuit AND).
    pub fn matches(&self, invocation: &Invocation) -> bool {
        if invocation.mock_name() != self.mock_name {
            return false;
        }
        if invocation.signature() != &self.signature {
            return false;
        }
        if invocation.arguments().len() != self.matchers.len() {
            return false;
        }
        self.matchers
            .iter()
            .zip(invocation.arguments())
            .all(|(matcher, argument)| matcher.matches(argument))
    }

    /// Render the expectation as a call expression, for failure messages
    pub fn describe(&self) -> String {
        let matchers: Vec<String> = self.matchers.iter().map(|m| m.to_string()).collect();
        format!(
            "{}.{}({})",
            self.mock_name,
            self.signature.method,
            matchers.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::invocation::CallSite;
    use serde::Serialize;

    const FIND: MethodSignature = MethodSignature {
        trait_name: "Repository",
        method: "find",
        param_types: &["u64"],
    };

    const STORE: MethodSignature = MethodSignature {
        trait_name: "Repository",
        method: "store",
        param_types: &["&Item"],
    };

    fn invocation(signature: MethodSignature, arguments: Vec<ArgValue>) -> Invocation {
        Invocation::new("repository_mock", signature, arguments, CallSite::new("t", 1))
    }

    #[derive(Serialize, Clone)]
    struct Item {
        labels: Vec<String>,
    }

    fn item(labels: &[&str]) -> Item {
        Item {
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn eq_matches_equal_values_only() {
        let matcher = InvocationMatcher::new("repository_mock", FIND, vec![eq(7u64)]);
        assert!(matcher.matches(&invocation(FIND, vec![ArgValue::of(&7u64)])));
        assert!(!matcher.matches(&invocation(FIND, vec![ArgValue::of(&8u64)])));
    }

    #[test]
    fn eq_matches_null_against_null() {
        let none: Option<String> = None;
        let matcher = InvocationMatcher::new("repository_mock", FIND, vec![eq(none.clone())]);
        assert!(matcher.matches(&invocation(FIND, vec![ArgValue::of(&none)])));
        assert!(!matcher.matches(&invocation(
            FIND,
            vec![ArgValue::of(&Some("x".to_string()))]
        )));
    }

    #[test]
    fn different_method_never_matches() {
        let matcher = InvocationMatcher::new("repository_mock", FIND, vec![any()]);
        assert!(!matcher.matches(&invocation(STORE, vec![ArgValue::of(&7u64)])));
    }

    #[test]
    fn different_mock_never_matches() {
        let matcher = InvocationMatcher::new("other_mock", FIND, vec![any()]);
        assert!(!matcher.matches(&invocation(FIND, vec![ArgValue::of(&7u64)])));
    }

    #[test]
    fn argument_count_mismatch_never_matches() {
        let matcher = InvocationMatcher::new("repository_mock", FIND, vec![]);
        assert!(!matcher.matches(&invocation(FIND, vec![ArgValue::of(&7u64)])));
    }

    #[test]
    fn len_eq_tolerates_element_order() {
        let matcher = InvocationMatcher::new(
            "repository_mock",
            STORE,
            vec![len_eq(item(&["1", "2"]))],
        );
        assert!(matcher.matches(&invocation(
            STORE,
            vec![ArgValue::of(&item(&["2", "1"]))]
        )));
    }

    #[test]
    fn eq_rejects_a_different_list() {
        let matcher = InvocationMatcher::new(
            "repository_mock",
            STORE,
            vec![eq(item(&["1", "2"]))],
        );
        assert!(!matcher.matches(&invocation(
            STORE,
            vec![ArgValue::of(&item(&["3", "4"]))]
        )));
    }

    #[test]
    fn len_eq_snapshots_the_expected_value() {
        let mut expected = item(&[]);
        let matcher = InvocationMatcher::new(
            "repository_mock",
            STORE,
            vec![len_eq(expected.clone())],
        );
        // mutating the original after declaration must not affect matching
        expected.labels.push("later".to_string());
        assert!(matcher.matches(&invocation(STORE, vec![ArgValue::of(&item(&[]))])));
        assert!(!matcher.matches(&invocation(STORE, vec![ArgValue::of(&expected)])));
    }

    #[test]
    fn bare_default_values_match_strictly() {
        let matcher = InvocationMatcher::new("repository_mock", FIND, vec![val(0u64)]);
        assert!(matcher.matches(&invocation(FIND, vec![ArgValue::of(&0u64)])));
        assert!(!matcher.matches(&invocation(FIND, vec![ArgValue::of(&1u64)])));
    }

    #[test]
    fn null_matchers_check_presence() {
        let some = Some("x".to_string());
        let none: Option<String> = None;
        let null_matcher = InvocationMatcher::new("repository_mock", FIND, vec![is_null()]);
        let not_null_matcher =
            InvocationMatcher::new("repository_mock", FIND, vec![not_null()]);
        assert!(null_matcher.matches(&invocation(FIND, vec![ArgValue::of(&none)])));
        assert!(!null_matcher.matches(&invocation(FIND, vec![ArgValue::of(&some)])));
        assert!(not_null_matcher.matches(&invocation(FIND, vec![ArgValue::of(&some)])));
    }

    #[test]
    fn same_requires_the_identical_reference() {
        let first = item(&["a"]);
        let second = item(&["a"]);
        let matcher =
            InvocationMatcher::new("repository_mock", STORE, vec![same(&first)]);
        assert!(matcher.matches(&invocation(STORE, vec![ArgValue::of_ref(&first)])));
        // structurally equal but a different object
        assert!(!matcher.matches(&invocation(STORE, vec![ArgValue::of_ref(&second)])));
        // passed by value: no identity to compare
        assert!(!matcher.matches(&invocation(STORE, vec![ArgValue::of(&first)])));
    }
}
