//! Scale a workspace so that all its counts add up to one

use super::{declare_input_output, INPUT_WORKSPACE, OUTPUT_WORKSPACE};
use crate::algorithm::Algorithm;
use crate::error::AlgorithmError;
use crate::runner::ExecutionContext;
use alg_property::{PropertyError, PropertyManager};
use alg_registry::VersionRequest;

/// Divide every bin by the total over all spectra
///
/// Runs `Integration`, `SumSpectra` and `Scale` as child algorithms.
#[derive(Debug, Default)]
pub struct NormaliseToTotal;

impl Algorithm for NormaliseToTotal {
    fn name(&self) -> &'static str {
        "NormaliseToTotal"
    }

    fn category(&self) -> &'static str {
        "CorrectionFunctions\\NormalisationCorrections"
    }

    fn summary(&self) -> &'static str {
        "Divide every bin by the total counts of the workspace"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_input_output(properties)
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let input = ctx.workspace(INPUT_WORKSPACE)?;

        let mut integrate = ctx.create_child_algorithm("Integration", VersionRequest::Latest)?;
        integrate.set_workspace(INPUT_WORKSPACE, input.clone())?;
        integrate.execute()?;
        ctx.report_progress(0.3, "integrated spectra");

        let mut sum = ctx.create_child_algorithm("SumSpectra", VersionRequest::Latest)?;
        sum.set_workspace(INPUT_WORKSPACE, integrate.workspace(OUTPUT_WORKSPACE)?)?;
        sum.execute()?;
        let summed = sum.workspace(OUTPUT_WORKSPACE)?;
        let total = summed.read().histogram(0)?.sum_y();
        if total.abs() < f64::EPSILON || !total.is_finite() {
            return Err(AlgorithmError::runtime(format!(
                "cannot normalise by a total of {total}"
            )));
        }
        ctx.report_progress(0.6, "summed spectra");

        let mut scale = ctx.create_child_algorithm("Scale", VersionRequest::Latest)?;
        scale.set_workspace(INPUT_WORKSPACE, input)?;
        scale.set_property("Factor", total.recip())?;
        scale.execute()?;
        ctx.report_progress(1.0, "scaled");

        ctx.set_workspace(OUTPUT_WORKSPACE, scale.workspace(OUTPUT_WORKSPACE)?)
    }
}
