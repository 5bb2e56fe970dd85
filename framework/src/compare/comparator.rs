//! The recursive reflection comparator
//!
//! Compares two [`ReflectValue`] trees and produces a [`Difference`] tree, or
//! `None` when the sides are equal under the configured leniency modes.

use chrono::DateTime;

use super::difference::{
    CollectionDifference, Difference, MapDifference, ObjectDifference,
    UnorderedCollectionDifference,
};
use super::modes::CompareMode;
use super::value::{ReflectValue, ValueKind};
use crate::config::AttestConfig;
use crate::error::AttestError;

/// Compares two reflected value trees
///
/// The comparator is cheap to construct; build one per comparison. Leniency
/// is configured up front through the mode set, strictness is the absence of
/// modes.
///
/// # Example
///
/// ```rust,ignore
/// use attest::compare::{ReflectComparator, CompareMode};
///
/// let comparator = ReflectComparator::new(&[CompareMode::LenientOrder]);
/// assert!(comparator.get_difference(&left, &right).is_none());
/// ```
pub struct ReflectComparator {
    modes: Vec<CompareMode>,
    max_depth: usize,
}

impl ReflectComparator {
    /// Create a comparator with the given leniency modes and the configured
    /// depth bound
    pub fn new(modes: &[CompareMode]) -> Self {
        Self::with_max_depth(modes, AttestConfig::current().max_depth)
    }

    /// Create a comparator with an explicit depth bound
    pub fn with_max_depth(modes: &[CompareMode], max_depth: usize) -> Self {
        Self {
            modes: modes.to_vec(),
            max_depth,
        }
    }

    fn mode(&self, mode: CompareMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Compare two values; `None` means no difference was found
    pub fn get_difference(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
    ) -> Option<Difference> {
        self.compare(left, right, 0)
    }

    /// True if no difference is found between the two values
    pub fn is_equal(&self, left: &ReflectValue, right: &ReflectValue) -> bool {
        self.get_difference(left, right).is_none()
    }

    fn compare(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
        depth: usize,
    ) -> Option<Difference> {
        if depth > self.max_depth {
            panic!(
                "{}",
                AttestError::DepthExceeded {
                    max_depth: self.max_depth
                }
            );
        }

        if self.mode(CompareMode::IgnoreDefaults) && left.is_default() {
            return None;
        }

        if self.mode(CompareMode::LenientDates) {
            if let Some(difference) = self.compare_timestamps(left, right) {
                return difference;
            }
        }

        match (left, right) {
            (ReflectValue::Seq(left_elements), ReflectValue::Seq(right_elements)) => {
                if self.mode(CompareMode::LenientOrder) {
                    self.compare_unordered(left, right, left_elements, right_elements, depth)
                } else {
                    self.compare_ordered(left, right, left_elements, right_elements, depth)
                }
            }
            (ReflectValue::Map(left_entries), ReflectValue::Map(right_entries)) => {
                self.compare_maps(left, right, left_entries, right_entries, depth)
            }
            (
                ReflectValue::Struct {
                    name: left_name,
                    fields: left_fields,
                },
                ReflectValue::Struct {
                    name: right_name,
                    fields: right_fields,
                },
            ) => {
                if left_name != right_name {
                    return Some(Difference::simple(
                        left.clone(),
                        right.clone(),
                        format!("different types: {} vs {}", left_name, right_name),
                    ));
                }
                self.compare_objects(left, right, left_fields, right_fields, depth)
            }
            _ => self.compare_leaf(left, right),
        }
    }

    /// `Some(result)` when the lenient-dates mode decides the comparison,
    /// `None` when it does not apply to these values.
    #[allow(clippy::option_option)]
    fn compare_timestamps(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
    ) -> Option<Option<Difference>> {
        let left_is_date = matches!(left, ReflectValue::String(s) if is_timestamp(s));
        if !left_is_date {
            return None;
        }
        let right_is_date = matches!(right, ReflectValue::String(s) if is_timestamp(s));
        if right_is_date {
            Some(None)
        } else {
            Some(Some(Difference::simple(
                left.clone(),
                right.clone(),
                "expected a timestamp, actual value is not one",
            )))
        }
    }

    fn compare_leaf(&self, left: &ReflectValue, right: &ReflectValue) -> Option<Difference> {
        if left == right {
            return None;
        }
        let message = if left.kind() != right.kind() {
            kind_mismatch_message(left.kind(), right.kind())
        } else {
            "different values".to_string()
        };
        Some(Difference::simple(left.clone(), right.clone(), message))
    }

    fn compare_ordered(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
        left_elements: &[ReflectValue],
        right_elements: &[ReflectValue],
        depth: usize,
    ) -> Option<Difference> {
        let mut difference =
            CollectionDifference::new(left.clone(), right.clone(), "different elements");

        let common = left_elements.len().min(right_elements.len());
        for index in 0..common {
            if let Some(element_difference) =
                self.compare(&left_elements[index], &right_elements[index], depth + 1)
            {
                difference.add_element_difference(index, element_difference);
            }
        }
        for index in common..left_elements.len() {
            if self.mode(CompareMode::IgnoreDefaults) && left_elements[index].is_default() {
                continue;
            }
            difference.add_left_only(index);
        }
        for index in common..right_elements.len() {
            difference.add_right_only(index);
        }

        if difference.is_empty() {
            None
        } else {
            Some(Difference::Collection(difference))
        }
    }

    fn compare_unordered(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
        left_elements: &[ReflectValue],
        right_elements: &[ReflectValue],
        depth: usize,
    ) -> Option<Difference> {
        let mut difference =
            UnorderedCollectionDifference::new(left.clone(), right.clone(), "different elements");

        // Greedy matching: each left element claims, in index order, the
        // first unclaimed right element it matches exactly. The full
        // candidate matrix is recorded either way so best matches can be
        // resolved for the report.
        let mut claimed = vec![false; right_elements.len()];
        let mut all_matched = true;
        for (left_index, left_element) in left_elements.iter().enumerate() {
            let mut matched = false;
            for (right_index, right_element) in right_elements.iter().enumerate() {
                let element_difference = self.compare(left_element, right_element, depth + 1);
                let exact = element_difference.is_none();
                difference.add_element_difference(left_index, right_index, element_difference);
                if exact && !matched && !claimed[right_index] {
                    claimed[right_index] = true;
                    matched = true;
                }
            }
            if !matched {
                all_matched = false;
            }
        }

        if all_matched && left_elements.len() == right_elements.len() {
            return None;
        }
        Some(Difference::UnorderedCollection(difference))
    }

    fn compare_maps(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
        left_entries: &[(ReflectValue, ReflectValue)],
        right_entries: &[(ReflectValue, ReflectValue)],
        depth: usize,
    ) -> Option<Difference> {
        let mut difference = MapDifference::new(left.clone(), right.clone(), "different entries");

        for (key, left_value) in left_entries {
            let right_value = right_entries
                .iter()
                .find(|(right_key, _)| right_key == key)
                .map(|(_, value)| value);
            match right_value {
                Some(right_value) => {
                    if let Some(value_difference) =
                        self.compare(left_value, right_value, depth + 1)
                    {
                        difference.add_value_difference(key.clone(), value_difference);
                    }
                }
                None => {
                    if self.mode(CompareMode::IgnoreDefaults) && left_value.is_default() {
                        continue;
                    }
                    difference.add_missing_key(key.clone());
                }
            }
        }
        for (key, _) in right_entries {
            if !left_entries.iter().any(|(left_key, _)| left_key == key) {
                difference.add_extra_key(key.clone());
            }
        }

        if difference.is_empty() {
            None
        } else {
            Some(Difference::Map(difference))
        }
    }

    fn compare_objects(
        &self,
        left: &ReflectValue,
        right: &ReflectValue,
        left_fields: &[(&'static str, ReflectValue)],
        right_fields: &[(&'static str, ReflectValue)],
        depth: usize,
    ) -> Option<Difference> {
        let mut difference =
            ObjectDifference::new(left.clone(), right.clone(), "different field values");

        for (field, left_value) in left_fields {
            let right_value = right_fields
                .iter()
                .find(|(right_field, _)| right_field == field)
                .map(|(_, value)| value);
            match right_value {
                Some(right_value) => {
                    if let Some(field_difference) =
                        self.compare(left_value, right_value, depth + 1)
                    {
                        difference.add_field_difference(*field, field_difference);
                    }
                }
                None => {
                    if self.mode(CompareMode::IgnoreDefaults) && left_value.is_default() {
                        continue;
                    }
                    difference.add_field_difference(
                        *field,
                        Difference::simple(
                            left_value.clone(),
                            ReflectValue::Null,
                            "field not present on the actual value",
                        ),
                    );
                }
            }
        }
        for (field, right_value) in right_fields {
            if left_fields.iter().any(|(left_field, _)| left_field == field) {
                continue;
            }
            if self.mode(CompareMode::IgnoreDefaults) {
                continue;
            }
            difference.add_field_difference(
                *field,
                Difference::simple(
                    ReflectValue::Null,
                    right_value.clone(),
                    "field not present on the expected value",
                ),
            );
        }

        if difference.is_empty() {
            None
        } else {
            Some(Difference::Object(difference))
        }
    }
}

fn is_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

fn kind_mismatch_message(left: ValueKind, right: ValueKind) -> String {
    fn name(kind: ValueKind) -> &'static str {
        match kind {
            ValueKind::Null => "null",
            ValueKind::Bool => "a boolean",
            ValueKind::Number => "a number",
            ValueKind::String => "a string",
            ValueKind::Seq => "a sequence",
            ValueKind::Map => "a map",
            ValueKind::Struct => "a struct",
        }
    }
    format!("expected {}, actual value is {}", name(left), name(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::modes::{LENIENT, STRICT};
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn reflect<T: Serialize>(value: &T) -> ReflectValue {
        ReflectValue::from_serialize(value, 64).unwrap()
    }

    fn diff<L: Serialize, R: Serialize>(
        left: &L,
        right: &R,
        modes: &[CompareMode],
    ) -> Option<Difference> {
        ReflectComparator::with_max_depth(modes, 64).get_difference(&reflect(left), &reflect(right))
    }

    #[derive(Serialize, Clone)]
    struct Person {
        name: String,
        age: u32,
        nickname: Option<String>,
    }

    fn person(name: &str, age: u32) -> Person {
        Person {
            name: name.to_string(),
            age,
            nickname: None,
        }
    }

    #[test]
    fn equal_graphs_yield_no_difference() {
        let left = person("ann", 30);
        let right = left.clone();
        assert!(diff(&left, &right, STRICT).is_none());
    }

    #[test]
    fn differing_field_yields_object_difference() {
        let difference = diff(&person("ann", 30), &person("ann", 31), STRICT).unwrap();
        match difference {
            Difference::Object(object) => {
                assert_eq!(object.field_differences().len(), 1);
                assert_eq!(object.field_differences()[0].0, "age");
            }
            other => panic!("expected an object difference, got {:?}", other),
        }
    }

    #[test]
    fn ordered_swap_differs_at_both_indices() {
        let difference = diff(&vec![1, 2], &vec![2, 1], STRICT).unwrap();
        match difference {
            Difference::Collection(collection) => {
                assert_eq!(collection.element_differences().len(), 2);
                assert!(collection.element_differences().contains_key(&0));
                assert!(collection.element_differences().contains_key(&1));
            }
            other => panic!("expected a collection difference, got {:?}", other),
        }
    }

    #[test]
    fn unordered_swap_is_equal() {
        assert!(diff(&vec![1, 2], &vec![2, 1], &[CompareMode::LenientOrder]).is_none());
    }

    #[test]
    fn unordered_mismatch_records_the_candidate_matrix() {
        let difference = diff(
            &vec![1, 2],
            &vec![2, 3],
            &[CompareMode::LenientOrder],
        )
        .unwrap();
        match difference {
            Difference::UnorderedCollection(unordered) => {
                assert_eq!(unordered.element_differences().len(), 2);
                let best = unordered.best_matching_element_differences();
                assert_eq!(best.len(), 1);
                assert_eq!(best[0].left_index, 0);
            }
            other => panic!("expected an unordered difference, got {:?}", other),
        }
    }

    #[test]
    fn unordered_detects_size_mismatch() {
        assert!(diff(&vec![1], &vec![1, 1], &[CompareMode::LenientOrder]).is_some());
        assert!(diff(&vec![1, 1], &vec![1], &[CompareMode::LenientOrder]).is_some());
    }

    #[test]
    fn ignore_defaults_skips_expected_side_defaults() {
        let left = person("ann", 0);
        let mut right = person("ann", 44);
        right.nickname = Some("annie".to_string());
        assert!(diff(&left, &right, &[CompareMode::IgnoreDefaults]).is_none());
        // but not the other way around
        assert!(diff(&right, &left, &[CompareMode::IgnoreDefaults]).is_some());
    }

    #[test]
    fn lenient_dates_compare_by_presence() {
        let left = "2008-04-01T12:00:00+00:00";
        let right = "2013-09-15T08:30:00+00:00";
        assert!(diff(&left, &right, &[CompareMode::LenientDates]).is_none());
        assert!(diff(&left, &"not a date", &[CompareMode::LenientDates]).is_some());
        assert!(diff(&left, &right, STRICT).is_some());
    }

    #[test]
    fn maps_diff_per_key() {
        let mut left = BTreeMap::new();
        left.insert("a", 1);
        left.insert("b", 2);
        let mut right = BTreeMap::new();
        right.insert("a", 1);
        right.insert("c", 3);

        let difference = diff(&left, &right, STRICT).unwrap();
        match difference {
            Difference::Map(map) => {
                assert_eq!(map.missing_keys().len(), 1);
                assert_eq!(map.extra_keys().len(), 1);
                assert!(map.value_differences().is_empty());
            }
            other => panic!("expected a map difference, got {:?}", other),
        }
    }

    #[test]
    fn different_struct_types_are_a_leaf_difference() {
        #[derive(Serialize)]
        struct Other {
            name: String,
            age: u32,
            nickname: Option<String>,
        }
        let left = person("ann", 30);
        let right = Other {
            name: "ann".to_string(),
            age: 30,
            nickname: None,
        };
        let difference = diff(&left, &right, STRICT).unwrap();
        assert!(matches!(difference, Difference::Simple(_)));
    }

    #[test]
    fn lenient_modes_combine() {
        #[derive(Serialize)]
        struct Holder {
            values: Vec<String>,
            note: Option<String>,
        }
        let left = Holder {
            values: vec!["1".to_string(), "2".to_string()],
            note: None,
        };
        let right = Holder {
            values: vec!["2".to_string(), "1".to_string()],
            note: Some("kept".to_string()),
        };
        assert!(diff(&left, &right, LENIENT).is_none());
    }
}
