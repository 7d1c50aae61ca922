//! Version information.

/// Get the version string.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get the version string with the package name.
#[must_use]
pub fn full_version() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), version())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_not_empty() {
        assert!(!version().is_empty());
    }

    #[test]
    fn full_version_names_package() {
        assert!(full_version().starts_with("cartoon "));
    }
}
