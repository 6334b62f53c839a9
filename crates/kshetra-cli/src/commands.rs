//! Subcommand bodies, kept apart from argument parsing so they can be tested

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use kshetra_cache::RegionCache;
use kshetra_core::{
    AuthContext, EngineConfig, HIERARCHY, InMemoryRegionProvider, InMemorySummaryProvider,
    RegionFixture, RegionId, RegionNode, RegionType, ReportKind,
};
use kshetra_report::{DrillDownAggregator, ExpandOutcome, ReportSnapshot, resolve_root};
use kshetra_select::{AccessScopePolicy, CascadingSelectionController, SelectOutcome};
use serde::Serialize;
use tracing::debug;

fn load_fixture(path: &Path) -> anyhow::Result<RegionFixture> {
    RegionFixture::load(path).with_context(|| format!("loading fixture {}", path.display()))
}

// ============================================================================
// select
// ============================================================================

/// Where a selection walk ended up
#[derive(Debug, Clone, Serialize)]
pub struct SelectReport {
    pub grant: String,
    /// Levels fixed by the user's assignment
    pub fixed: Vec<RegionNode>,
    /// Every picked level, root first
    pub path: Vec<RegionNode>,
    pub resolved: Option<RegionNode>,
    /// The region a record would be filed under
    pub submit: Option<RegionId>,
    /// Why the selection cannot be submitted yet
    pub blocked: Option<String>,
    /// Options offered one level below the resolved region
    pub next: BTreeMap<RegionType, Vec<RegionNode>>,
}

pub async fn run_select(
    fixture: &Path,
    auth: &dyn AuthContext,
    picks: &[u64],
    config: &EngineConfig,
) -> anyhow::Result<SelectReport> {
    let provider = InMemoryRegionProvider::from_fixture(&load_fixture(fixture)?);
    let scope = AccessScopePolicy::new(config)
        .resolve_for(auth, &provider)
        .await;
    let selector = CascadingSelectionController::new(Arc::new(RegionCache::new(provider)), scope);
    selector.mount().await;

    for &id in picks {
        let id = RegionId(id);
        let node = selector
            .cache()
            .provider()
            .get(id)
            .ok_or_else(|| anyhow!("region {id} is not in the fixture"))?;

        if selector
            .scope()
            .fixed_region(node.kind)
            .is_some_and(|fixed| fixed.id == id)
        {
            continue;
        }

        let outcome = selector
            .select_id(node.kind, id)
            .await
            .with_context(|| format!("cannot pick {node} {}", node.name))?;
        match outcome {
            SelectOutcome::Ignored => bail!("{node} {} is not offered here", node.name),
            outcome => debug!(region_id = %id, ?outcome, "picked"),
        }
    }

    let state = selector.state();
    let scope = selector.scope();
    let below: &[RegionType] = match state.resolved() {
        Some(node) => node.kind.children(),
        None => &[RegionType::Prant],
    };
    let next = below
        .iter()
        .filter(|kind| scope.permits(**kind))
        .map(|&kind| (kind, selector.options(kind)))
        .collect();

    let submission = selector.submission();
    Ok(SelectReport {
        grant: auth.grant().to_string(),
        fixed: scope.fixed_prefix.clone(),
        path: state.path().into_iter().cloned().collect(),
        resolved: state.resolved().cloned(),
        submit: submission.as_ref().ok().copied(),
        blocked: submission.err().map(|block| block.to_string()),
        next,
    })
}

fn trail(nodes: &[RegionNode]) -> String {
    nodes
        .iter()
        .map(|n| format!("{n} {}", n.name))
        .collect::<Vec<_>>()
        .join(" > ")
}

impl fmt::Display for SelectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "grant:    {}", self.grant)?;
        if !self.fixed.is_empty() {
            writeln!(f, "fixed:    {}", trail(&self.fixed))?;
        }
        writeln!(f, "path:     {}", trail(&self.path))?;
        match &self.resolved {
            Some(node) => writeln!(f, "resolved: {node} {}", node.name)?,
            None => writeln!(f, "resolved: -")?,
        }
        match (&self.submit, &self.blocked) {
            (Some(id), _) => writeln!(f, "submit:   region {id}")?,
            (None, Some(reason)) => writeln!(f, "submit:   blocked ({reason})")?,
            (None, None) => writeln!(f, "submit:   -")?,
        }
        for (kind, options) in &self.next {
            let names: Vec<String> = options.iter().map(|n| format!("{} {}", n.id, n.name)).collect();
            writeln!(f, "next {kind}: {}", names.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// drill
// ============================================================================

/// A drill-down report after every requested expansion
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DrillReport(pub ReportSnapshot);

pub async fn run_drill(
    fixture: &Path,
    auth: &dyn AuthContext,
    kind: ReportKind,
    path: &[u64],
    config: &EngineConfig,
) -> anyhow::Result<DrillReport> {
    let fixture = load_fixture(fixture)?;
    let regions = InMemoryRegionProvider::from_fixture(&fixture);
    let root = resolve_root(auth, &regions, config).await;
    let report = DrillDownAggregator::new(
        InMemorySummaryProvider::from_fixture(&fixture),
        kind,
        root,
    );
    report.load_root().await;

    for &id in path {
        let index = report.depth().saturating_sub(1);
        let outcome = report
            .expand_row(index, RegionId(id))
            .await
            .with_context(|| format!("cannot expand {id} on level {index}"))?;
        if outcome == ExpandOutcome::NotExpandable {
            bail!("region {id} is terminal and has nothing to expand");
        }
    }

    let snapshot = report.subscribe().borrow().clone();
    Ok(DrillReport(snapshot))
}

impl fmt::Display for DrillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = &self.0;
        let headline = snapshot.kind.headline_metric();
        let crumbs: Vec<String> = snapshot
            .breadcrumb
            .iter()
            .map(|c| format!("{c} {}", c.name))
            .collect();
        writeln!(f, "{} report: {}", snapshot.kind, crumbs.join(" > "))?;

        for level in &snapshot.levels {
            writeln!(
                f,
                "[{}] {} {}  {}={}",
                level.index,
                level.region,
                level.region.name,
                headline,
                level.total().headline(snapshot.kind)
            )?;
            if level.rows.is_empty() {
                writeln!(f, "      (no rows)")?;
            }
            for row in &level.rows {
                let marker = if level.expanded_row == Some(row.region_id) { ">" } else { " " };
                let terminal = if row.is_clickable() { "" } else { "  (terminal)" };
                writeln!(
                    f,
                    "    {marker} {}({}) {}  {}{terminal}",
                    row.kind,
                    row.region_id,
                    row.label,
                    row.metric(headline)
                )?;
            }
        }

        writeln!(f, "current: {}", snapshot.current_total)?;
        writeln!(f, "root:    {}", snapshot.root_total)
    }
}

// ============================================================================
// levels
// ============================================================================

pub fn render_levels() -> String {
    let mut out = String::from("level    parent   children        branch  terminal\n");
    for row in HIERARCHY.iter() {
        let parent = row.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        let children: Vec<String> = row.children.iter().map(|c| c.to_string()).collect();
        let branch = row.branch.map(|b| b.to_string()).unwrap_or_else(|| "-".into());
        out.push_str(&format!(
            "{:<8} {:<8} {:<15} {:<7} {}\n",
            row.kind.to_string(),
            parent,
            if children.is_empty() { "-".to_string() } else { children.join(",") },
            branch,
            row.terminal
        ));
    }
    out
}
