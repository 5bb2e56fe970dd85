//! Difference-tree formatters
//!
//! Two formatters walk the tree through [`Difference::format`]: the simple
//! formatter emits one `path: expected .. actual ..` line per leaf and is
//! what assertion failures show by default; the tree formatter prints every
//! node's left/right values and is appended when the full report is enabled.

use super::difference::{
    CollectionDifference, Difference, DifferenceFormatter, MapDifference, ObjectDifference,
    SimpleDifference, UnorderedCollectionDifference,
};
use super::value::ReflectValue;
use crate::config::AttestConfig;

/// Longest rendered value before truncation
const MAX_VALUE_LENGTH: usize = 120;

/// Render a reflected value compactly, truncating long output
pub fn format_value(value: &ReflectValue) -> String {
    let rendered = value.to_string();
    if rendered.len() <= MAX_VALUE_LENGTH {
        return rendered;
    }
    let cut = rendered
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|i| *i <= MAX_VALUE_LENGTH)
        .last()
        .unwrap_or(0);
    format!("{}...", &rendered[..cut])
}

/// Extend a field path with a dotted member name
fn member_path(parent: Option<&str>, member: &str) -> String {
    match parent {
        Some(parent) => format!("{}.{}", parent, member),
        None => member.to_string(),
    }
}

/// Extend a field path with an index-style suffix
fn index_path(parent: Option<&str>, suffix: &str) -> String {
    match parent {
        Some(parent) => format!("{}{}", parent, suffix),
        None => suffix.to_string(),
    }
}

/// Formatter that emits one line per leaf difference
///
/// Lines look like `address.lines[2]: expected "a", actual "b"`. For
/// unordered collection differences the best matching element pairs are
/// resolved first.
pub struct SimpleDifferenceFormatter;

impl SimpleDifferenceFormatter {
    fn child(&self, difference: &Difference, field: String) -> String {
        difference.format(Some(&field), self)
    }
}

impl DifferenceFormatter for SimpleDifferenceFormatter {
    fn format_simple(&self, difference: &SimpleDifference, field: Option<&str>) -> String {
        let prefix = field.map(|f| format!("{}: ", f)).unwrap_or_default();
        format!(
            "{}expected {}, actual {}\n",
            prefix,
            format_value(&difference.left),
            format_value(&difference.right)
        )
    }

    fn format_object(&self, difference: &ObjectDifference, field: Option<&str>) -> String {
        let mut result = String::new();
        for (name, child) in difference.field_differences() {
            result.push_str(&self.child(child, member_path(field, name)));
        }
        result
    }

    fn format_collection(&self, difference: &CollectionDifference, field: Option<&str>) -> String {
        let mut result = String::new();
        for (index, child) in difference.element_differences() {
            result.push_str(&self.child(child, index_path(field, &format!("[{}]", index))));
        }
        let left_elements = match &difference.left {
            ReflectValue::Seq(elements) => elements.as_slice(),
            _ => &[],
        };
        let right_elements = match &difference.right {
            ReflectValue::Seq(elements) => elements.as_slice(),
            _ => &[],
        };
        for index in difference.left_only() {
            let path = index_path(field, &format!("[{}]", index));
            let value = left_elements
                .get(*index)
                .map(format_value)
                .unwrap_or_default();
            result.push_str(&format!(
                "{}: expected {}, no element at that index on the actual side\n",
                path, value
            ));
        }
        for index in difference.right_only() {
            let path = index_path(field, &format!("[{}]", index));
            let value = right_elements
                .get(*index)
                .map(format_value)
                .unwrap_or_default();
            result.push_str(&format!(
                "{}: unexpected element {} at that index on the actual side\n",
                path, value
            ));
        }
        result
    }

    fn format_map(&self, difference: &MapDifference, field: Option<&str>) -> String {
        let mut result = String::new();
        for (key, child) in difference.value_differences() {
            result.push_str(&self.child(child, index_path(field, &format!("[{}]", key))));
        }
        for key in difference.missing_keys() {
            result.push_str(&format!(
                "{}: missing entry on the actual side\n",
                index_path(field, &format!("[{}]", key))
            ));
        }
        for key in difference.extra_keys() {
            result.push_str(&format!(
                "{}: unexpected entry on the actual side\n",
                index_path(field, &format!("[{}]", key))
            ));
        }
        result
    }

    fn format_unordered(
        &self,
        difference: &UnorderedCollectionDifference,
        field: Option<&str>,
    ) -> String {
        let mut result = String::new();
        for best in difference.best_matching_element_differences() {
            let path = index_path(
                field,
                &format!("[{}->{}]", best.left_index, best.right_index),
            );
            result.push_str(&self.child(best.difference, path));
        }
        for index in difference.unmatched_left_indices() {
            result.push_str(&format!(
                "{}: no matching element found on the actual side\n",
                index_path(field, &format!("[{}]", index))
            ));
        }
        if result.is_empty() {
            // Sizes differ but every expected element matched; point at the
            // collections themselves.
            result.push_str(&format!(
                "{}expected {}, actual {} (different number of elements)\n",
                field.map(|f| format!("{}: ", f)).unwrap_or_default(),
                format_value(&difference.left),
                format_value(&difference.right)
            ));
        }
        result
    }
}

/// Formatter that prints every node's `[L]`/`[R]` values down the tree
pub struct TreeDifferenceFormatter;

impl TreeDifferenceFormatter {
    fn node(&self, left: &ReflectValue, right: &ReflectValue, field: Option<&str>) -> String {
        let label = field.map(|f| format!("{}   ", f)).unwrap_or_default();
        let padding = " ".repeat(label.len());
        format!(
            "{}[L] {}\n{}[R] {}\n",
            label,
            format_value(left),
            padding,
            format_value(right)
        )
    }
}

impl DifferenceFormatter for TreeDifferenceFormatter {
    fn format_simple(&self, difference: &SimpleDifference, field: Option<&str>) -> String {
        self.node(&difference.left, &difference.right, field)
    }

    fn format_object(&self, difference: &ObjectDifference, field: Option<&str>) -> String {
        let mut result = self.node(&difference.left, &difference.right, field);
        for (name, child) in difference.field_differences() {
            result.push_str(&child.format(Some(&member_path(field, name)), self));
        }
        result
    }

    fn format_collection(&self, difference: &CollectionDifference, field: Option<&str>) -> String {
        let mut result = self.node(&difference.left, &difference.right, field);
        for (index, child) in difference.element_differences() {
            result.push_str(&child.format(Some(&index_path(field, &format!("[{}]", index))), self));
        }
        result
    }

    fn format_map(&self, difference: &MapDifference, field: Option<&str>) -> String {
        let mut result = self.node(&difference.left, &difference.right, field);
        for (key, child) in difference.value_differences() {
            result.push_str(&child.format(Some(&index_path(field, &format!("[{}]", key))), self));
        }
        result
    }

    fn format_unordered(
        &self,
        difference: &UnorderedCollectionDifference,
        field: Option<&str>,
    ) -> String {
        let mut result = self.node(&difference.left, &difference.right, field);
        for best in difference.best_matching_element_differences() {
            let path = index_path(
                field,
                &format!("[{}->{}]", best.left_index, best.right_index),
            );
            result.push_str(&best.difference.format(Some(&path), self));
        }
        result
    }
}

/// Build the failure report for a difference tree
///
/// Shows the compared values, the leaf differences, and (when the full
/// report is enabled in the configuration) the complete tree.
pub fn default_report(difference: &Difference) -> String {
    let mut report = format!(
        "Expected: {}\n  Actual: {}\n\n--- Found following differences ---\n{}",
        format_value(difference.left()),
        format_value(difference.right()),
        difference.format(None, &SimpleDifferenceFormatter)
    );
    if AttestConfig::current().full_report {
        report.push_str("\n--- Difference detail tree ---\n");
        report.push_str(&difference.format(None, &TreeDifferenceFormatter));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::comparator::ReflectComparator;
    use crate::compare::modes::STRICT;
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Address {
        street: String,
        number: u32,
    }

    fn reflect<T: Serialize>(value: &T) -> ReflectValue {
        ReflectValue::from_serialize(value, 64).unwrap()
    }

    #[test]
    fn simple_formatter_emits_leaf_paths() {
        let left = Address {
            street: "Main".to_string(),
            number: 1,
        };
        let right = Address {
            street: "Side".to_string(),
            number: 1,
        };
        let difference = ReflectComparator::with_max_depth(STRICT, 64)
            .get_difference(&reflect(&left), &reflect(&right))
            .unwrap();
        let formatted = difference.format(None, &SimpleDifferenceFormatter);
        assert_eq!(formatted, "street: expected \"Main\", actual \"Side\"\n");
    }

    #[test]
    fn tree_formatter_shows_left_and_right_per_node() {
        let difference = ReflectComparator::with_max_depth(STRICT, 64)
            .get_difference(&reflect(&vec![1, 2]), &reflect(&vec![1, 3]))
            .unwrap();
        let formatted = difference.format(None, &TreeDifferenceFormatter);
        assert!(formatted.contains("[L] [1, 2]"));
        assert!(formatted.contains("[R] [1, 3]"));
        assert!(formatted.contains("[1]   [L] 2"));
    }

    #[test]
    fn long_values_are_truncated() {
        let value = ReflectValue::String("x".repeat(500));
        let rendered = format_value(&value);
        assert!(rendered.len() < 140);
        assert!(rendered.ends_with("..."));
    }
}
