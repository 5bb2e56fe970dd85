//! The difference tree
//!
//! A comparison that finds the two sides unequal produces a tree of
//! [`Difference`] nodes describing where the graphs diverge. Leaf nodes carry
//! the two offending values; composite nodes nest child differences keyed by
//! field name, element index or map key. The tree is built once per
//! comparison and read-only afterwards; formatters walk it through the
//! double-dispatch [`Difference::format`] entry point.

use std::collections::BTreeMap;

use super::value::ReflectValue;

/// A node in the difference tree
#[derive(Debug, Clone)]
pub enum Difference {
    /// Two values differ and neither side warrants element-wise treatment
    Simple(SimpleDifference),
    /// Two structs differ in one or more fields
    Object(ObjectDifference),
    /// Two sequences differ at one or more indices
    Collection(CollectionDifference),
    /// Two maps differ in one or more entries
    Map(MapDifference),
    /// Two sequences compared without order differ
    UnorderedCollection(UnorderedCollectionDifference),
}

/// A leaf difference between two values
#[derive(Debug, Clone)]
pub struct SimpleDifference {
    /// The expected (left) value
    pub left: ReflectValue,
    /// The actual (right) value
    pub right: ReflectValue,
    /// Human readable description of the mismatch
    pub message: String,
}

/// A difference between two structs, keyed by field name
#[derive(Debug, Clone)]
pub struct ObjectDifference {
    pub left: ReflectValue,
    pub right: ReflectValue,
    pub message: String,
    /// Differing fields in declaration order
    field_differences: Vec<(String, Difference)>,
}

/// A difference between two ordered sequences, keyed by index
#[derive(Debug, Clone)]
pub struct CollectionDifference {
    pub left: ReflectValue,
    pub right: ReflectValue,
    pub message: String,
    /// Differences at indices present on both sides
    element_differences: BTreeMap<usize, Difference>,
    /// Indices only present on the left (expected) side
    left_only: Vec<usize>,
    /// Indices only present on the right (actual) side
    right_only: Vec<usize>,
}

/// A difference between two maps, keyed by map key
///
/// Keys are matched by key equality in the reflected model. The original
/// system matched map keys by reference identity; that notion does not
/// survive reflection into a value tree, so equality keying is the documented
/// behavior here.
#[derive(Debug, Clone)]
pub struct MapDifference {
    pub left: ReflectValue,
    pub right: ReflectValue,
    pub message: String,
    /// Differences for keys present on both sides, in left-map order
    value_differences: Vec<(ReflectValue, Difference)>,
    /// Keys only present on the left (expected) side
    missing_keys: Vec<ReflectValue>,
    /// Keys only present on the right (actual) side
    extra_keys: Vec<ReflectValue>,
}

/// A difference between two sequences compared without order
///
/// Holds the complete matrix of candidate differences: for every
/// `(left index, right index)` pair, the difference between those two
/// elements (`None` marks an exact match). Consumers resolve the matrix to
/// one best counterpart per left element via
/// [`best_matching_element_differences`](Self::best_matching_element_differences).
#[derive(Debug, Clone)]
pub struct UnorderedCollectionDifference {
    pub left: ReflectValue,
    pub right: ReflectValue,
    pub message: String,
    element_differences: BTreeMap<usize, BTreeMap<usize, Option<Difference>>>,
}

/// One resolved best match inside an unordered collection difference
#[derive(Debug)]
pub struct BestMatch<'a> {
    /// Index of the element in the left (expected) sequence
    pub left_index: usize,
    /// Index of the chosen counterpart in the right (actual) sequence
    pub right_index: usize,
    /// The difference between the two elements
    pub difference: &'a Difference,
}

/// Visitor for formatting a difference tree
///
/// Each node kind dispatches to its own method; `field` is the path under
/// which the node was reached, `None` at the root.
pub trait DifferenceFormatter {
    fn format_simple(&self, difference: &SimpleDifference, field: Option<&str>) -> String;
    fn format_object(&self, difference: &ObjectDifference, field: Option<&str>) -> String;
    fn format_collection(&self, difference: &CollectionDifference, field: Option<&str>) -> String;
    fn format_map(&self, difference: &MapDifference, field: Option<&str>) -> String;
    fn format_unordered(
        &self,
        difference: &UnorderedCollectionDifference,
        field: Option<&str>,
    ) -> String;
}

impl Difference {
    /// Create a leaf difference
    pub fn simple(
        left: ReflectValue,
        right: ReflectValue,
        message: impl Into<String>,
    ) -> Self {
        Self::Simple(SimpleDifference {
            left,
            right,
            message: message.into(),
        })
    }

    /// The expected (left) value at this node
    pub fn left(&self) -> &ReflectValue {
        match self {
            Self::Simple(d) => &d.left,
            Self::Object(d) => &d.left,
            Self::Collection(d) => &d.left,
            Self::Map(d) => &d.left,
            Self::UnorderedCollection(d) => &d.left,
        }
    }

    /// The actual (right) value at this node
    pub fn right(&self) -> &ReflectValue {
        match self {
            Self::Simple(d) => &d.right,
            Self::Object(d) => &d.right,
            Self::Collection(d) => &d.right,
            Self::Map(d) => &d.right,
            Self::UnorderedCollection(d) => &d.right,
        }
    }

    /// The node's human readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Simple(d) => &d.message,
            Self::Object(d) => &d.message,
            Self::Collection(d) => &d.message,
            Self::Map(d) => &d.message,
            Self::UnorderedCollection(d) => &d.message,
        }
    }

    /// Format this node through the given formatter (double dispatch)
    pub fn format(&self, field: Option<&str>, formatter: &dyn DifferenceFormatter) -> String {
        match self {
            Self::Simple(d) => formatter.format_simple(d, field),
            Self::Object(d) => formatter.format_object(d, field),
            Self::Collection(d) => formatter.format_collection(d, field),
            Self::Map(d) => formatter.format_map(d, field),
            Self::UnorderedCollection(d) => formatter.format_unordered(d, field),
        }
    }

    /// The matching score of this node, used to pick best matches between
    /// unordered collection elements. Lower scores are better matches.
    ///
    /// Leaves score 1, or 5 when the two values are of different kinds (two
    /// values of different shapes are less likely to be intended
    /// counterparts). Composites score the number of child differences;
    /// unordered nodes score the sum of their resolved best matches.
    pub fn matching_score(&self) -> usize {
        match self {
            Self::Simple(d) => {
                if d.left.kind() != d.right.kind() {
                    5
                } else {
                    1
                }
            }
            Self::Object(d) => d.field_differences.len(),
            Self::Collection(d) => {
                d.element_differences.len() + d.left_only.len() + d.right_only.len()
            }
            Self::Map(d) => {
                d.value_differences.len() + d.missing_keys.len() + d.extra_keys.len()
            }
            Self::UnorderedCollection(d) => d
                .best_matching_element_differences()
                .iter()
                .map(|best| best.difference.matching_score())
                .sum(),
        }
    }
}

impl ObjectDifference {
    pub fn new(left: ReflectValue, right: ReflectValue, message: impl Into<String>) -> Self {
        Self {
            left,
            right,
            message: message.into(),
            field_differences: Vec::new(),
        }
    }

    /// Record a difference for a field
    pub fn add_field_difference(&mut self, field: impl Into<String>, difference: Difference) {
        self.field_differences.push((field.into(), difference));
    }

    /// Differing fields, in declaration order
    pub fn field_differences(&self) -> &[(String, Difference)] {
        &self.field_differences
    }

    pub fn is_empty(&self) -> bool {
        self.field_differences.is_empty()
    }
}

impl CollectionDifference {
    pub fn new(left: ReflectValue, right: ReflectValue, message: impl Into<String>) -> Self {
        Self {
            left,
            right,
            message: message.into(),
            element_differences: BTreeMap::new(),
            left_only: Vec::new(),
            right_only: Vec::new(),
        }
    }

    /// Record a difference at an index present on both sides
    pub fn add_element_difference(&mut self, index: usize, difference: Difference) {
        self.element_differences.insert(index, difference);
    }

    /// Record an index with no counterpart on the right side
    pub fn add_left_only(&mut self, index: usize) {
        self.left_only.push(index);
    }

    /// Record an index with no counterpart on the left side
    pub fn add_right_only(&mut self, index: usize) {
        self.right_only.push(index);
    }

    /// Differences at indices present on both sides
    pub fn element_differences(&self) -> &BTreeMap<usize, Difference> {
        &self.element_differences
    }

    /// Indices only present on the left (expected) side
    pub fn left_only(&self) -> &[usize] {
        &self.left_only
    }

    /// Indices only present on the right (actual) side
    pub fn right_only(&self) -> &[usize] {
        &self.right_only
    }

    pub fn is_empty(&self) -> bool {
        self.element_differences.is_empty()
            && self.left_only.is_empty()
            && self.right_only.is_empty()
    }
}

impl MapDifference {
    pub fn new(left: ReflectValue, right: ReflectValue, message: impl Into<String>) -> Self {
        Self {
            left,
            right,
            message: message.into(),
            value_differences: Vec::new(),
            missing_keys: Vec::new(),
            extra_keys: Vec::new(),
        }
    }

    /// Record a difference for a key present on both sides
    pub fn add_value_difference(&mut self, key: ReflectValue, difference: Difference) {
        self.value_differences.push((key, difference));
    }

    /// Record a key only present on the left (expected) side
    pub fn add_missing_key(&mut self, key: ReflectValue) {
        self.missing_keys.push(key);
    }

    /// Record a key only present on the right (actual) side
    pub fn add_extra_key(&mut self, key: ReflectValue) {
        self.extra_keys.push(key);
    }

    /// Differences for keys present on both sides, in left-map order
    pub fn value_differences(&self) -> &[(ReflectValue, Difference)] {
        &self.value_differences
    }

    /// Keys only present on the left (expected) side
    pub fn missing_keys(&self) -> &[ReflectValue] {
        &self.missing_keys
    }

    /// Keys only present on the right (actual) side
    pub fn extra_keys(&self) -> &[ReflectValue] {
        &self.extra_keys
    }

    pub fn is_empty(&self) -> bool {
        self.value_differences.is_empty()
            && self.missing_keys.is_empty()
            && self.extra_keys.is_empty()
    }
}

impl UnorderedCollectionDifference {
    pub fn new(left: ReflectValue, right: ReflectValue, message: impl Into<String>) -> Self {
        Self {
            left,
            right,
            message: message.into(),
            element_differences: BTreeMap::new(),
        }
    }

    /// Record the candidate difference between a left and a right element.
    /// `None` marks an exact match.
    pub fn add_element_difference(
        &mut self,
        left_index: usize,
        right_index: usize,
        difference: Option<Difference>,
    ) {
        self.element_differences
            .entry(left_index)
            .or_default()
            .insert(right_index, difference);
    }

    /// The full candidate matrix, keyed by left then right index
    pub fn element_differences(
        &self,
    ) -> &BTreeMap<usize, BTreeMap<usize, Option<Difference>>> {
        &self.element_differences
    }

    /// Left indices that have an exact counterpart somewhere on the right
    fn exact_matches(&self) -> (Vec<usize>, Vec<usize>) {
        let mut left_matched = Vec::new();
        let mut right_matched = Vec::new();
        for (left_index, candidates) in &self.element_differences {
            for (right_index, difference) in candidates {
                if difference.is_none()
                    && !left_matched.contains(left_index)
                    && !right_matched.contains(right_index)
                {
                    left_matched.push(*left_index);
                    right_matched.push(*right_index);
                    break;
                }
            }
        }
        (left_matched, right_matched)
    }

    /// Resolve the candidate matrix to the best counterpart per left element.
    ///
    /// Exactly matched pairs are claimed first and excluded. For each
    /// remaining left index the unclaimed right index with the lowest
    /// [`Difference::matching_score`] is chosen; ties are broken by the
    /// lowest right index. The `BTreeMap` storage makes the whole resolution
    /// deterministic.
    pub fn best_matching_element_differences(&self) -> Vec<BestMatch<'_>> {
        let (left_matched, right_matched) = self.exact_matches();

        let mut result = Vec::new();
        for (left_index, candidates) in &self.element_differences {
            if left_matched.contains(left_index) {
                continue;
            }
            let mut best: Option<(usize, &Difference, usize)> = None;
            for (right_index, difference) in candidates {
                if right_matched.contains(right_index) {
                    continue;
                }
                let difference = match difference {
                    Some(difference) => difference,
                    None => continue,
                };
                let score = difference.matching_score();
                if best.map(|(_, _, s)| score < s).unwrap_or(true) {
                    best = Some((*right_index, difference, score));
                }
            }
            if let Some((right_index, difference, _)) = best {
                result.push(BestMatch {
                    left_index: *left_index,
                    right_index,
                    difference,
                });
            }
        }
        result
    }

    /// Left indices with neither an exact nor a best-match counterpart
    pub fn unmatched_left_indices(&self) -> Vec<usize> {
        let (left_matched, _) = self.exact_matches();
        let best: Vec<usize> = self
            .best_matching_element_differences()
            .iter()
            .map(|best| best.left_index)
            .collect();
        self.element_differences
            .keys()
            .filter(|index| !left_matched.contains(*index) && !best.contains(*index))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> ReflectValue {
        ReflectValue::Int(value)
    }

    fn leaf(left: i64, right: i64) -> Difference {
        Difference::simple(int(left), int(right), "different values")
    }

    #[test]
    fn leaf_scores_one_for_same_kind_and_five_across_kinds() {
        assert_eq!(leaf(1, 2).matching_score(), 1);
        let cross = Difference::simple(
            int(1),
            ReflectValue::String("1".to_string()),
            "different kinds",
        );
        assert_eq!(cross.matching_score(), 5);
    }

    #[test]
    fn composite_score_counts_child_differences() {
        let mut object = ObjectDifference::new(int(0), int(0), "different fields");
        object.add_field_difference("a", leaf(1, 2));
        object.add_field_difference("b", leaf(3, 4));
        assert_eq!(Difference::Object(object).matching_score(), 2);
    }

    #[test]
    fn best_match_prefers_lowest_score() {
        let mut unordered =
            UnorderedCollectionDifference::new(int(0), int(0), "different elements");
        let mut heavy = ObjectDifference::new(int(0), int(0), "different fields");
        heavy.add_field_difference("a", leaf(1, 2));
        heavy.add_field_difference("b", leaf(3, 4));
        unordered.add_element_difference(0, 0, Some(Difference::Object(heavy)));
        unordered.add_element_difference(0, 1, Some(leaf(1, 2)));

        let best = unordered.best_matching_element_differences();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].left_index, 0);
        assert_eq!(best[0].right_index, 1);
    }

    #[test]
    fn best_match_ties_break_to_lowest_right_index() {
        let mut unordered =
            UnorderedCollectionDifference::new(int(0), int(0), "different elements");
        unordered.add_element_difference(0, 2, Some(leaf(1, 3)));
        unordered.add_element_difference(0, 1, Some(leaf(1, 2)));

        let best = unordered.best_matching_element_differences();
        assert_eq!(best[0].right_index, 1);
    }

    #[test]
    fn exact_matches_are_claimed_and_excluded() {
        let mut unordered =
            UnorderedCollectionDifference::new(int(0), int(0), "different elements");
        unordered.add_element_difference(0, 0, None);
        unordered.add_element_difference(1, 0, Some(leaf(2, 1)));
        unordered.add_element_difference(1, 1, Some(leaf(2, 3)));

        let best = unordered.best_matching_element_differences();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].left_index, 1);
        assert_eq!(best[0].right_index, 1);
    }
}
