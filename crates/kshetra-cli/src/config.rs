use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use kshetra_core::{AccessGrant, AccessLevel, EngineConfig, RegionId, ReportKind, Role, StaticAuth};
use kshetra_logging::LogConfig;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "kshetra",
    about = "Region selection and drill-down reports over a fixture"
)]
pub struct Cli {
    /// Engine and logging settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More engine log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write JSONL logs to rotated files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Walk the hierarchy and report the region a record would be filed under
    Select {
        #[command(flatten)]
        session: SessionArgs,
        /// Region ids to pick, top-down (already fixed levels are skipped)
        #[arg(long = "pick", value_delimiter = ',')]
        picks: Vec<u64>,
    },
    /// Drill a report down from the user's root region
    Drill {
        #[command(flatten)]
        session: SessionArgs,
        /// Report to show (defaults to the configured one)
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Row ids to expand, one per level
        #[arg(long = "path", value_delimiter = ',')]
        path: Vec<u64>,
    },
    /// Print the hierarchy table
    Levels,
}

/// Who is navigating, and over which data
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Region fixture (JSON)
    #[arg(long)]
    pub fixture: PathBuf,
    /// Region the user is assigned to
    #[arg(long)]
    pub user_region: Option<u64>,
    /// Role or access level bounding the selection
    #[arg(long, value_enum, default_value_t = GrantArg::Admin)]
    pub grant: GrantArg,
    /// User id attached to log output
    #[arg(long)]
    pub user_id: Option<String>,
}

impl SessionArgs {
    pub fn auth(&self) -> StaticAuth {
        let auth = StaticAuth::new(self.user_region.map(RegionId), self.grant);
        match &self.user_id {
            Some(id) => auth.with_user_id(id.clone()),
            None => auth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GrantArg {
    Admin,
    PrantKaryakarta,
    VibhagKaryakarta,
    JilaKaryakarta,
    NagarKaryakarta,
    ToliCreation,
    ViewOnly,
}

impl From<GrantArg> for AccessGrant {
    fn from(grant: GrantArg) -> Self {
        match grant {
            GrantArg::Admin => Role::Admin.into(),
            GrantArg::PrantKaryakarta => Role::PrantKaryakarta.into(),
            GrantArg::VibhagKaryakarta => Role::VibhagKaryakarta.into(),
            GrantArg::JilaKaryakarta => Role::JilaKaryakarta.into(),
            GrantArg::NagarKaryakarta => Role::NagarKaryakarta.into(),
            GrantArg::ToliCreation => AccessLevel::ToliCreation.into(),
            GrantArg::ViewOnly => AccessLevel::ViewOnly.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "toli")]
    Team,
    #[value(alias = "parivar")]
    Household,
    #[value(alias = "utsuk")]
    Lead,
}

impl From<KindArg> for ReportKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Team => ReportKind::Team,
            KindArg::Household => ReportKind::Household,
            KindArg::Lead => ReportKind::Lead,
        }
    }
}

/// Contents of the `--config` file: engine switches at the top level, and
/// an optional `[logging]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    pub logging: LogConfig,
}

impl CliConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kshetra_logging::ConsoleFormat;

    #[test]
    fn test_parse_select() {
        let cli = Cli::try_parse_from([
            "kshetra",
            "select",
            "--fixture",
            "demo.json",
            "--user-region",
            "100",
            "--grant",
            "toli-creation",
            "--pick",
            "1000,10000",
        ])
        .unwrap();
        let Command::Select { session, picks } = cli.command else {
            panic!("expected select");
        };
        assert_eq!(picks, vec![1000, 10000]);
        assert_eq!(session.grant, GrantArg::ToliCreation);
        assert_eq!(session.user_region, Some(100));
    }

    #[test]
    fn test_parse_drill_alias() {
        let cli = Cli::try_parse_from([
            "kshetra", "-v", "drill", "--fixture", "demo.json", "--kind", "parivar", "--path", "10",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Drill { kind, path, .. } = cli.command else {
            panic!("expected drill");
        };
        assert_eq!(kind.map(ReportKind::from), Some(ReportKind::Household));
        assert_eq!(path, vec![10]);
    }

    #[test]
    fn test_config_file() {
        let config = CliConfig::from_toml_str(
            r#"
            auto_select_single_child = true
            report_kind = "household"

            [default_root]
            id = 7
            name = "Delhi Prant"

            [logging]
            level = "info"
            console = "off"

            [logging.components]
            kshetra_cli = "debug"
            "#,
        )
        .unwrap();
        assert!(config.engine.auto_select_single_child);
        assert!(!config.engine.gate_branches_on_role);
        assert_eq!(config.engine.report_kind, ReportKind::Household);
        assert_eq!(config.engine.default_root.id, RegionId(7));
        assert_eq!(config.logging.console, ConsoleFormat::Off);
        assert_eq!(
            config.logging.with_verbosity(1).directives(),
            "info,kshetra_cache=debug,kshetra_cli=debug,kshetra_report=debug,kshetra_select=debug"
        );
    }

    #[test]
    fn test_default_config_is_quiet() {
        let config = CliConfig::from_toml_str("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.logging.directives(), "warn");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_global_log_flags() {
        let cli = Cli::try_parse_from(["kshetra", "levels", "-vv", "--log-dir", "/tmp/kshetra"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/kshetra")));
    }
}
