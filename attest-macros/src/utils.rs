//! Small shared helpers for code generation

/// Convert a CamelCase identifier to snake_case
///
/// Used to derive default mock names: `OrderRepository` becomes
/// `order_repository`.
pub fn snake_case(name: &str) -> String {
    let mut result = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Normalize a type's token string into a readable label.
///
/// `quote` renders types with spaces around every token
/// (`Vec < Option < u64 > >`); this tightens them back up for method
/// descriptors and diagnostics.
pub fn type_label(tokens: &str) -> String {
    tokens
        .replace(" :: ", "::")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}
