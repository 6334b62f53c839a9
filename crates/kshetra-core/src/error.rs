//! Error types for Kshetra

use thiserror::Error;

use crate::region::{Branch, RegionId, RegionType};

/// Errors raised by region and summary providers
///
/// These never escape the selection controller or the aggregator: both log
/// them and carry on with an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Rejected selections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Cannot select {kind}: {missing} is not selected")]
    AncestorUnset {
        kind: RegionType,
        missing: RegionType,
    },

    #[error("Cannot select {kind}: access stops at {max}")]
    BeyondScope { kind: RegionType, max: RegionType },

    #[error("Cannot select {0}: level is fixed by the user's assignment")]
    FixedLevel(RegionType),

    #[error("Cannot select {0}: level is outside the user's assigned region")]
    OutsideAssignment(RegionType),

    #[error("Cannot select {kind}: {branch} branch is not offered")]
    BranchNotOffered { kind: RegionType, branch: Branch },

    #[error("Region type mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: RegionType,
        actual: RegionType,
    },
}

/// Rejected drill-down operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Level {index} out of range (stack has {len} levels)")]
    LevelOutOfRange { index: usize, len: usize },

    #[error("Region {child} is not a child of region {parent}")]
    NotAChild { child: RegionId, parent: RegionId },

    #[error("Region {region} is not a row of level {level}")]
    RowNotFound { level: usize, region: RegionId },
}

/// Errors loading configuration or fixtures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid fixture: {0}")]
    Fixture(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Unavailable("timeout".to_string());
        assert!(format!("{}", err).contains("unavailable"));
        assert!(format!("{}", err).contains("timeout"));

        let err = ProviderError::RegionNotFound(RegionId(42));
        assert!(format!("{}", err).contains("42"));
    }

    #[test]
    fn test_selection_error_display() {
        let err = SelectionError::AncestorUnset {
            kind: RegionType::Jila,
            missing: RegionType::Vibhag,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Jila"));
        assert!(msg.contains("Vibhag"));

        let err = SelectionError::BeyondScope {
            kind: RegionType::Basti,
            max: RegionType::Nagar,
        };
        assert!(format!("{}", err).contains("access stops at Nagar"));

        let err = SelectionError::BranchNotOffered {
            kind: RegionType::Khand,
            branch: Branch::Rural,
        };
        assert!(format!("{}", err).contains("rural"));
    }

    #[test]
    fn test_report_error_display() {
        let err = ReportError::LevelOutOfRange { index: 5, len: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains("5"));
        assert!(msg.contains("2"));

        let err = ReportError::NotAChild {
            child: RegionId(7),
            parent: RegionId(3),
        };
        assert!(format!("{}", err).contains("not a child"));
    }

    #[test]
    fn test_config_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "demo.json");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(format!("{}", err).contains("demo.json"));
    }
}
