use std::fmt;

use serde::Serialize;

/// Compile-time build metadata, populated by `build.rs`
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub package_version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION"),
        package_version: env!("CARGO_PKG_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        target: env!("BUILD_TARGET"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sealpost {} ({}, {} build, {})\nbuilt {} with {}",
            self.package_version,
            self.version,
            self.build_profile,
            self.target,
            self.build_timestamp,
            self.rust_version
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_info_populated() {
        let info = build_info();
        assert!(!info.version.is_empty());
        assert_eq!(info.package_version, env!("CARGO_PKG_VERSION"));
        assert!(info.to_string().starts_with("sealpost "));
    }
}
