//! Scenario suite runner.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    Harness, HarnessConfig, HarnessError, HarnessObserver, LoggingObserver, MetadataScenario,
    MintScenario, Scenario, ScenarioReport,
};

/// Outcome of a single scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: String,
    /// Report on success, the aborting error otherwise.
    pub result: Result<ScenarioReport, HarnessError>,
    /// Wall time including backend startup and teardown.
    pub elapsed: Duration,
}

impl ScenarioOutcome {
    /// Returns true if the scenario passed.
    pub const fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a suite run, in scenario order.
#[derive(Debug, Default)]
pub struct SuiteReport {
    /// Per-scenario outcomes.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Returns true if every scenario passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(ScenarioOutcome::passed)
    }

    /// Number of failed scenarios.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }
}

impl std::fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(_) => writeln!(f, "ok      {} ({:.2?})", outcome.name, outcome.elapsed)?,
                Err(e) => writeln!(f, "FAILED  {} ({:.2?}): {e}", outcome.name, outcome.elapsed)?,
            }
        }
        write!(
            f,
            "{} passed; {} failed",
            self.outcomes.len() - self.failures(),
            self.failures()
        )
    }
}

/// Runs scenarios, each against its own harness.
///
/// Every scenario gets a freshly started backend, which is stopped after
/// the scenario whether it passed or not.
pub struct Suite {
    config: HarnessConfig,
    scenarios: Vec<Box<dyn Scenario>>,
    observer: Arc<dyn HarnessObserver>,
}

impl Suite {
    /// Creates an empty suite.
    pub fn new(config: HarnessConfig) -> Self {
        let observer = Arc::new(LoggingObserver::new(config.verbose));
        Self { config, scenarios: Vec::new(), observer }
    }

    /// The metadata and mint scenarios with their default parameters.
    pub fn reference(config: HarnessConfig) -> Self {
        Self::new(config)
            .with_scenario(MetadataScenario::default())
            .with_scenario(MintScenario::default())
    }

    /// Appends a scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Scenario + 'static) -> Self {
        self.scenarios.push(Box::new(scenario));
        self
    }

    /// Replaces the observer handed to each harness.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn HarnessObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Returns true if the suite has no scenarios.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Runs every scenario in order.
    pub async fn run(&self) -> SuiteReport {
        let mut report = SuiteReport::default();
        for scenario in &self.scenarios {
            let name = scenario.name().to_string();
            tracing::info!(scenario = %name, "Running scenario");

            let started = Instant::now();
            let result = self.run_one(scenario.as_ref()).await;
            let elapsed = started.elapsed();

            match &result {
                Ok(_) => tracing::info!(scenario = %name, ?elapsed, "Scenario passed"),
                Err(e) => tracing::error!(scenario = %name, error = %e, "Scenario failed"),
            }
            report.outcomes.push(ScenarioOutcome { name, result, elapsed });
        }
        report
    }

    async fn run_one(&self, scenario: &dyn Scenario) -> Result<ScenarioReport, HarnessError> {
        let mut harness = Harness::new(self.config.clone()).with_observer(self.observer.clone());
        let result = drive(&mut harness, scenario).await;
        harness.stop().await;
        result
    }
}

async fn drive(harness: &mut Harness, scenario: &dyn Scenario) -> Result<ScenarioReport, HarnessError> {
    harness.start_backend().await?;
    if scenario.requires_naming() {
        harness.resolve_naming_dependency().await?;
    }
    scenario.run(harness).await
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.scenarios.iter().map(|s| s.name()).collect();
        f.debug_struct("Suite").field("backend", &self.config.kind).field("scenarios", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reference_suite_passes_in_memory() {
        let suite = Suite::reference(HarnessConfig::in_memory());
        assert_eq!(suite.len(), 2);

        let report = suite.run().await;
        assert!(report.passed(), "{report}");
        assert_eq!(report.failures(), 0);
        assert!(report.to_string().ends_with("2 passed; 0 failed"));
    }

    #[tokio::test]
    async fn empty_suite_passes() {
        let suite = Suite::new(HarnessConfig::in_memory());
        assert!(suite.is_empty());
        assert!(suite.run().await.passed());
    }
}
