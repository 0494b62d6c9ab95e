use std::fmt;

use crate::component::lifecycle::StageOutcome;
use crate::foundation::core::BuildStage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Ran,
    Skipped,
    Disabled,
    Failed(String),
    /// Not attempted because a dependency failed, or this component failed an earlier pass.
    Blocked(String),
}

impl StageStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Blocked(_))
    }
}

impl From<StageOutcome> for StageStatus {
    fn from(o: StageOutcome) -> Self {
        match o {
            StageOutcome::Ran => Self::Ran,
            StageOutcome::Skipped => Self::Skipped,
            StageOutcome::Disabled => Self::Disabled,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ran => f.write_str("ran"),
            Self::Skipped => f.write_str("skipped"),
            Self::Disabled => f.write_str("disabled"),
            Self::Failed(e) => write!(f, "FAILED: {e}"),
            Self::Blocked(why) => write!(f, "blocked: {why}"),
        }
    }
}

/// Per-component result of one orchestrator pass, in build order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReport {
    pub stage: BuildStage,
    pub entries: Vec<(String, StageStatus)>,
}

impl StageReport {
    pub fn new(stage: BuildStage) -> Self {
        Self {
            stage,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, component: impl Into<String>, status: StageStatus) {
        self.entries.push((component.into(), status));
    }

    pub fn status(&self, component: &str) -> Option<&StageStatus> {
        self.entries
            .iter()
            .find(|(n, _)| n == component)
            .map(|(_, s)| s)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &StageStatus)> {
        self.entries
            .iter()
            .filter(|(_, s)| s.is_failure())
            .map(|(n, s)| (n.as_str(), s))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.stage)?;
        for (name, status) in &self.entries {
            writeln!(f, "  {name:<24} {status}")?;
        }
        Ok(())
    }
}

/// Every pass of one [`run`](crate::BuildOrchestrator::run).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub reports: Vec<StageReport>,
}

impl BuildSummary {
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(StageReport::is_clean)
    }

    /// Distinct failing components with the first failure seen for each.
    pub fn failures(&self) -> Vec<(BuildStage, &str, &StageStatus)> {
        let mut seen = Vec::<&str>::new();
        let mut out = Vec::new();
        for r in &self.reports {
            for (name, status) in r.failures() {
                if !seen.contains(&name) {
                    seen.push(name);
                    out.push((r.stage, name, status));
                }
            }
        }
        out
    }

    pub fn report(&self, stage: BuildStage) -> Option<&StageReport> {
        self.reports.iter().find(|r| r.stage == stage)
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.reports {
            write!(f, "{r}")?;
        }
        Ok(())
    }
}
