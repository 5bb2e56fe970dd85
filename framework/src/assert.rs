//! Reflection assert facade
//!
//! Fluent entry points over the comparison engine. The `assert_*` functions
//! panic with a formatted difference report (the test-framework assertion
//! failure); the `*_eq` functions return booleans for use inside matchers
//! and guards.
//!
//! There are two families: the `reflect` versions take the comparator modes
//! explicitly (no modes means strict comparison), the `lenient` versions
//! apply the configured lenient mode set (lenient order + ignore defaults by
//! default).
//!
//! # Example
//!
//! ```rust,ignore
//! use attest::{assert_lenient_eq, assert_reflect_eq};
//! use attest::compare::CompareMode;
//!
//! assert_lenient_eq(&expected_order, &actual_order);
//! assert_reflect_eq(&expected_order, &actual_order, &[CompareMode::LenientOrder]);
//! ```

use serde::Serialize;

use crate::compare::{
    default_report, reflect_compare, CompareMode, Difference, ReflectValue,
};
use crate::config::AttestConfig;
use crate::error::AttestError;

/// Compare two values with explicit modes; `true` when no difference is found.
///
/// Reflection failures (unserializable values, exceeded depth bound) panic:
/// they indicate a misconfigured comparison, not a data mismatch.
pub fn reflect_eq<L, R>(expected: &L, actual: &R, modes: &[CompareMode]) -> bool
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    compare_or_panic(expected, actual, modes).is_none()
}

/// Compare two values with the configured lenient modes; `true` when equal
pub fn lenient_eq<L, R>(expected: &L, actual: &R) -> bool
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    let modes = AttestConfig::current().lenient_modes;
    reflect_eq(expected, actual, &modes)
}

/// Assert that two values are equal under the given comparator modes.
///
/// No modes means strict comparison. Panics with a difference report when
/// the values differ.
#[track_caller]
pub fn assert_reflect_eq<L, R>(expected: &L, actual: &R, modes: &[CompareMode])
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    if let Some(difference) = compare_or_panic(expected, actual, modes) {
        panic!(
            "\nassert_reflect_eq failed\n\n{}",
            default_report(&difference)
        );
    }
}

/// Assert that two values are equal under the configured lenient modes
/// (lenient order + ignore defaults by default).
///
/// Panics with a difference report when the values differ.
#[track_caller]
pub fn assert_lenient_eq<L, R>(expected: &L, actual: &R)
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    let modes = AttestConfig::current().lenient_modes;
    if let Some(difference) = compare_or_panic(expected, actual, &modes) {
        panic!(
            "\nassert_lenient_eq failed\n\n{}",
            default_report(&difference)
        );
    }
}

/// Assert that a property of the actual value is leniently equal to the
/// expected value.
///
/// The property path uses member and index notation, e.g.
/// `"customer.addresses[0].street"`. Maps are navigated by string key.
///
/// # Example
///
/// ```rust,ignore
/// assert_property_lenient_eq("lines[0].sku", &"A-1", &order);
/// ```
#[track_caller]
pub fn assert_property_lenient_eq<L, R>(property: &str, expected: &L, actual: &R)
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    let max_depth = AttestConfig::current().max_depth;
    let actual_value = match ReflectValue::from_serialize(actual, max_depth) {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    };
    let property_value = match get_property(&actual_value, property) {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    };
    let expected_value = match ReflectValue::from_serialize(expected, max_depth) {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    };

    let modes = AttestConfig::current().lenient_modes;
    let comparator = crate::compare::ReflectComparator::with_max_depth(&modes, max_depth);
    if let Some(difference) = comparator.get_difference(&expected_value, &property_value) {
        panic!(
            "\nassert_property_lenient_eq failed for property '{}'\n\n{}",
            property,
            default_report(&difference)
        );
    }
}

fn compare_or_panic<L, R>(
    expected: &L,
    actual: &R,
    modes: &[CompareMode],
) -> Option<Difference>
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    match reflect_compare(expected, actual, modes) {
        Ok(difference) => difference,
        Err(err) => panic!("{}", err),
    }
}

/// Navigate a reflected value by a property path
fn get_property(value: &ReflectValue, path: &str) -> Result<ReflectValue, AttestError> {
    let mut current = value.clone();
    for segment in parse_path(path)? {
        current = match (&segment, &current) {
            (PathSegment::Member(name), ReflectValue::Struct { fields, .. }) => fields
                .iter()
                .find(|(field, _)| *field == name.as_str())
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    AttestError::property_path(path, format!("no field named '{}'", name))
                })?,
            (PathSegment::Member(name), ReflectValue::Map(entries)) => entries
                .iter()
                .find(|(key, _)| matches!(key, ReflectValue::String(k) if k == name))
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    AttestError::property_path(path, format!("no entry with key '{}'", name))
                })?,
            (PathSegment::Index(index), ReflectValue::Seq(elements)) => elements
                .get(*index)
                .cloned()
                .ok_or_else(|| {
                    AttestError::property_path(path, format!("index {} out of bounds", index))
                })?,
            (segment, _) => {
                return Err(AttestError::property_path(
                    path,
                    format!("cannot navigate '{:?}' into {}", segment, current),
                ));
            }
        };
    }
    Ok(current)
}

#[derive(Debug)]
enum PathSegment {
    Member(String),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<PathSegment>, AttestError> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (member, rest) = match part.find('[') {
            Some(bracket) => (&part[..bracket], &part[bracket..]),
            None => (part, ""),
        };
        if !member.is_empty() {
            segments.push(PathSegment::Member(member.to_string()));
        }
        let mut rest = rest;
        while let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped.find(']').ok_or_else(|| {
                AttestError::property_path(path, "unterminated index bracket")
            })?;
            let index = stripped[..close].parse::<usize>().map_err(|_| {
                AttestError::property_path(
                    path,
                    format!("index '{}' is not a number", &stripped[..close]),
                )
            })?;
            segments.push(PathSegment::Index(index));
            rest = &stripped[close + 1..];
        }
    }
    if segments.is_empty() {
        return Err(AttestError::property_path(path, "empty property path"));
    }
    Ok(segments)
}

/// Assert lenient equality; forwards to [`assert_lenient_eq`]
#[macro_export]
macro_rules! assert_lenient_eq {
    ($expected:expr, $actual:expr $(,)?) => {
        $crate::assert::assert_lenient_eq(&$expected, &$actual)
    };
}

/// Assert reflection equality with explicit modes; forwards to
/// [`assert_reflect_eq`]
#[macro_export]
macro_rules! assert_reflect_eq {
    ($expected:expr, $actual:expr $(,)?) => {
        $crate::assert::assert_reflect_eq(&$expected, &$actual, $crate::compare::STRICT)
    };
    ($expected:expr, $actual:expr, $($mode:expr),+ $(,)?) => {
        $crate::assert::assert_reflect_eq(&$expected, &$actual, &[$($mode),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Clone)]
    struct Wrapper {
        values: Vec<String>,
    }

    fn wrapper(values: &[&str]) -> Wrapper {
        Wrapper {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn deep_copy_is_reflect_equal() {
        let left = wrapper(&["1", "2"]);
        let right = left.clone();
        assert_reflect_eq(&left, &right, crate::compare::STRICT);
    }

    #[test]
    fn lenient_tolerates_order() {
        assert!(lenient_eq(&wrapper(&["1", "2"]), &wrapper(&["2", "1"])));
        assert!(!reflect_eq(
            &wrapper(&["1", "2"]),
            &wrapper(&["2", "1"]),
            crate::compare::STRICT
        ));
    }

    #[test]
    #[should_panic(expected = "assert_lenient_eq failed")]
    fn lenient_assert_panics_on_real_difference() {
        assert_lenient_eq(&wrapper(&["1", "2"]), &wrapper(&["1", "3"]));
    }

    #[test]
    fn property_paths_navigate_structs_and_sequences() {
        let value = wrapper(&["a", "b"]);
        assert_property_lenient_eq("values[1]", &"b", &value);
    }

    #[test]
    #[should_panic(expected = "Invalid property path")]
    fn bad_property_path_is_a_runtime_error() {
        assert_property_lenient_eq("missing.field", &1, &wrapper(&["a"]));
    }

    #[test]
    fn macros_forward_to_the_functions() {
        let left = wrapper(&["1", "2"]);
        crate::assert_lenient_eq!(left, wrapper(&["2", "1"]));
        crate::assert_reflect_eq!(vec![1, 2], vec![1, 2]);
    }
}
