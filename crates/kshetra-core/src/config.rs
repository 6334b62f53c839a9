//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::region::{RegionId, RegionNode, RegionType};
use crate::summary::ReportKind;

/// Behavior switches for the selection and reporting engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Select the only offered child automatically
    pub auto_select_single_child: bool,

    /// Offer only the urban branch at JILA to role-based grants
    pub gate_branches_on_role: bool,

    /// Region shown at the top of a report when the user has no assignment
    pub default_root: RootRegion,

    /// Report shown when none is requested
    pub report_kind: ReportKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_select_single_child: false,
            gate_branches_on_role: false,
            default_root: RootRegion::default(),
            report_kind: ReportKind::Team,
        }
    }
}

impl EngineConfig {
    /// Auto-select single children; everything else default
    pub fn guided() -> Self {
        Self {
            auto_select_single_child: true,
            ..Default::default()
        }
    }

    /// Role grants only see the urban branch below JILA
    pub fn urban_only_roles() -> Self {
        Self {
            gate_branches_on_role: true,
            ..Default::default()
        }
    }

    /// Parse a config from TOML
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// The fallback root region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootRegion {
    pub id: RegionId,
    pub name: String,
    pub code: String,
}

impl Default for RootRegion {
    fn default() -> Self {
        Self {
            id: RegionId(1),
            name: "Haryana Prant".to_string(),
            code: String::new(),
        }
    }
}

impl RootRegion {
    /// The root as a PRANT node
    pub fn to_node(&self) -> RegionNode {
        RegionNode::new(self.id, self.name.clone(), RegionType::Prant, None).with_code(self.code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.auto_select_single_child);
        assert!(!config.gate_branches_on_role);
        assert_eq!(config.default_root.id, RegionId(1));
        assert_eq!(config.default_root.name, "Haryana Prant");
        assert_eq!(config.report_kind, ReportKind::Team);
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            auto_select_single_child = true
            report_kind = "household"

            [default_root]
            id = 7
            name = "Delhi Prant"
            "#,
        )
        .unwrap();
        assert!(config.auto_select_single_child);
        assert!(!config.gate_branches_on_role);
        assert_eq!(config.report_kind, ReportKind::Household);
        assert_eq!(config.default_root.id, RegionId(7));
        assert!(config.default_root.code.is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_bad_toml() {
        let err = EngineConfig::from_toml_str("auto_select_single_child = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_presets() {
        assert!(EngineConfig::guided().auto_select_single_child);
        assert!(EngineConfig::urban_only_roles().gate_branches_on_role);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kshetra.toml");
        std::fs::write(&path, "gate_branches_on_role = true\n").unwrap();
        assert!(EngineConfig::load(&path).unwrap().gate_branches_on_role);

        let missing = EngineConfig::load(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_root_node() {
        let node = RootRegion::default().to_node();
        assert_eq!(node.kind, RegionType::Prant);
        assert!(node.parent_id.is_none());
    }
}
