//! TOML pipelines
//!
//! A pipeline is a list of algorithm steps run in order against one
//! framework, so later steps read what earlier steps stored:
//!
//! ```toml
//! [[step]]
//! algorithm = "CreateWorkspace"
//! properties = { DataX = [0.0, 1.0, 2.0], DataY = [3.0, 4.0], OutputWorkspace = "raw" }
//!
//! [[step]]
//! algorithm = "Integration"
//! version = 1
//!
//! [step.properties]
//! InputWorkspace = "raw"
//! OutputWorkspace = "total"
//! ```
//!
//! Property values may be native TOML values or their string forms.

use crate::error::{AlgorithmError, PipelineError};
use crate::framework::Framework;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Ordered algorithm steps
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pipeline {
    /// `[[step]]` tables
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One algorithm run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Registered algorithm name
    pub algorithm: String,
    /// Version; the configured policy decides when absent
    #[serde(default)]
    pub version: Option<u32>,
    /// Property values
    #[serde(default)]
    pub properties: toml::Table,
}

/// Outcome of one successful step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// One-based step number
    pub index: usize,
    /// Algorithm name
    pub algorithm: String,
    /// Version that ran
    pub version: u32,
    /// Instance id
    pub id: String,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

impl Pipeline {
    /// Parse TOML text
    ///
    /// # Errors
    /// `PipelineError::Parse`
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `PipelineError::Io` or `PipelineError::Parse`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Run every step, stopping at the first failure
    ///
    /// # Errors
    /// `PipelineError::Step` naming the failed step
    pub fn run(&self, framework: &Framework) -> Result<Vec<StepReport>, PipelineError> {
        tracing::info!(steps = self.steps.len(), "running pipeline");
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                step.run(framework, i + 1).map_err(|source| PipelineError::Step {
                    index: i + 1,
                    algorithm: step.algorithm.clone(),
                    source,
                })
            })
            .collect()
    }
}

impl Step {
    fn run(&self, framework: &Framework, index: usize) -> Result<StepReport, AlgorithmError> {
        let mut runner = framework.create_algorithm(&self.algorithm, self.version)?;
        let properties = serde_json::to_value(&self.properties)
            .map_err(|e| AlgorithmError::invalid_argument(e.to_string()))?;
        runner.set_properties_from_json(&properties)?;
        let started = Instant::now();
        runner.execute()?;
        Ok(StepReport {
            index,
            algorithm: runner.name().to_string(),
            version: runner.version(),
            id: runner.id().to_string(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameworkConfig;
    use pretty_assertions::assert_eq;

    const TWO_STEPS: &str = r#"
        [[step]]
        algorithm = "CreateWorkspace"
        properties = { DataX = [0, 1, 2], DataY = [3.0, 4.0], OutputWorkspace = "raw" }

        [[step]]
        algorithm = "Integration"
        version = 1

        [step.properties]
        InputWorkspace = "raw"
        OutputWorkspace = "total"
    "#;

    fn framework() -> Framework {
        Framework::builder()
            .config(FrameworkConfig::default().with_parallel(false))
            .build()
            .unwrap()
    }

    #[test]
    fn parses_steps_in_order() {
        let pipeline = Pipeline::from_toml_str(TWO_STEPS).unwrap();
        assert_eq!(pipeline.steps.len(), 2);
        assert_eq!(pipeline.steps[0].algorithm, "CreateWorkspace");
        assert_eq!(pipeline.steps[1].version, Some(1));
    }

    #[test]
    fn unknown_step_field_rejected() {
        let result = Pipeline::from_toml_str("[[step]]\nalgorithm = \"Scale\"\nfactor = 2\n");
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn steps_share_the_data_service() {
        let framework = framework();
        let reports = Pipeline::from_toml_str(TWO_STEPS)
            .unwrap()
            .run(&framework)
            .unwrap();
        assert_eq!(
            reports.iter().map(|r| (r.index, r.version)).collect::<Vec<_>>(),
            vec![(1, 1), (2, 1)]
        );
        let total = framework.data_service().retrieve("total").unwrap();
        assert_eq!(total.read().histogram(0).unwrap().y(), &[7.0]);
    }

    #[test]
    fn failing_step_is_named() {
        let framework = framework();
        let pipeline = Pipeline::from_toml_str(
            "[[step]]\nalgorithm = \"Integration\"\n[step.properties]\nInputWorkspace = \"missing\"\nOutputWorkspace = \"out\"\n",
        )
        .unwrap();
        match pipeline.run(&framework) {
            Err(PipelineError::Step { index, algorithm, source }) => {
                assert_eq!(index, 1);
                assert_eq!(algorithm, "Integration");
                let failures = source.validation_failures().unwrap();
                assert_eq!(failures.for_property("InputWorkspace").count(), 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
