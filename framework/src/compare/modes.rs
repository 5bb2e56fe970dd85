//! Comparison leniency modes

/// A leniency mode for the reflection comparator
///
/// By default a strict comparison is performed. Modes relax it:
///
/// - `IgnoreDefaults`: expected-side values that are null, `false` or numeric
///   zero are not compared; fields that only exist on the actual side are
///   tolerated.
/// - `LenientOrder`: sequences only have to contain the same elements, their
///   order is not compared.
/// - `LenientDates`: RFC 3339 timestamps only have to both be present (or
///   both absent); the actual instants are not compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareMode {
    /// Skip expected-side defaults (null / 0 / false) and actual-only fields
    IgnoreDefaults,
    /// Compare sequences without regard to element order
    LenientOrder,
    /// Compare timestamps by presence only
    LenientDates,
}

/// The mode set used by the lenient asserts and the `len_eq` argument
/// matcher: lenient order plus ignore defaults.
pub const LENIENT: &[CompareMode] = &[CompareMode::LenientOrder, CompareMode::IgnoreDefaults];

/// The empty mode set: strict comparison.
pub const STRICT: &[CompareMode] = &[];
