use std::path::Path;

/// Load environment variables from `.env` files.
///
/// Precedence (later sources override earlier):
/// 1. `.env` (base defaults)
/// 2. `.env.testing` (test-run overrides)
/// 3. Actual system environment variables (highest priority)
pub fn load_dotenv(project_root: &Path) {
    // dotenvy does not overwrite existing vars, so load the most specific
    // file first.
    let _ = dotenvy::from_path(project_root.join(".env.testing"));
    let _ = dotenvy::from_path(project_root.join(".env"));
}

/// Get an environment variable with a default value
///
/// # Example
/// ```rust,ignore
/// use attest::config::env;
///
/// let depth: usize = env("ATTEST_MAX_DEPTH", 64);
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get an optional environment variable
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
