//! Structural comparison engine
//!
//! Compares two arbitrary object graphs, tolerating configurable leniency
//! (element order, expected-side defaults, timestamp values). Values enter
//! the engine by being reflected through `serde::Serialize` into a
//! [`ReflectValue`] tree; the [`ReflectComparator`] walks two trees and
//! produces a [`Difference`] tree describing where they diverge, which the
//! formatters in [`report`] turn into failure messages.
//!
//! # Example
//!
//! ```rust,ignore
//! use attest::compare::{reflect_compare, CompareMode};
//!
//! let difference = reflect_compare(&expected, &actual, &[CompareMode::LenientOrder])?;
//! assert!(difference.is_none());
//! ```

pub mod comparator;
pub mod difference;
pub mod modes;
pub mod report;
pub mod value;

pub use comparator::ReflectComparator;
pub use difference::{
    BestMatch, CollectionDifference, Difference, DifferenceFormatter, MapDifference,
    ObjectDifference, SimpleDifference, UnorderedCollectionDifference,
};
pub use modes::{CompareMode, LENIENT, STRICT};
pub use report::{default_report, format_value, SimpleDifferenceFormatter, TreeDifferenceFormatter};
pub use value::{ReflectValue, ValueKind};

use serde::Serialize;

use crate::config::AttestConfig;
use crate::error::AttestError;

/// Reflect both values and compare them under the given modes.
///
/// Returns `Ok(None)` when the graphs are equal, `Ok(Some(difference))` with
/// the difference tree otherwise. Reflection failures (unserializable values,
/// exceeded depth bound) are errors, never silent equality.
pub fn reflect_compare<L, R>(
    left: &L,
    right: &R,
    modes: &[CompareMode],
) -> Result<Option<Difference>, AttestError>
where
    L: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    let max_depth = AttestConfig::current().max_depth;
    let left = ReflectValue::from_serialize(left, max_depth)?;
    let right = ReflectValue::from_serialize(right, max_depth)?;
    Ok(ReflectComparator::with_max_depth(modes, max_depth).get_difference(&left, &right))
}
