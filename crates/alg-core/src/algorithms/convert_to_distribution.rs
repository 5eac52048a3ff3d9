//! Divide counts by bin width, in place

use super::declare_in_out;
use crate::algorithm::Algorithm;
use crate::error::{AlgorithmError, ValidationIssue};
use crate::runner::ExecutionContext;
use alg_property::{HistogramValidator, PropertyError, PropertyManager};

const WORKSPACE: &str = "Workspace";

/// Turn histogram counts into a distribution by dividing y and e by the bin
/// width
///
/// The workspace is replaced only once every spectrum converted, so a
/// failure or cancellation leaves it untouched.
#[derive(Debug, Default)]
pub struct ConvertToDistribution;

impl Algorithm for ConvertToDistribution {
    fn name(&self) -> &'static str {
        "ConvertToDistribution"
    }

    fn category(&self) -> &'static str {
        "Transforms\\Distribution"
    }

    fn summary(&self) -> &'static str {
        "Divide y and e by the bin width"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_in_out(properties, WORKSPACE, HistogramValidator::new())
    }

    fn validate_inputs(&self, properties: &PropertyManager) -> Vec<ValidationIssue> {
        match properties.workspace(WORKSPACE) {
            Ok(handle) if handle.read().metadata().distribution => vec![(
                WORKSPACE.to_string(),
                "Workspace is already a distribution".to_string(),
            )],
            _ => Vec::new(),
        }
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let handle = ctx.workspace(WORKSPACE)?;
        let mut workspace = handle.write();
        let mut converted = workspace.clone_workspace();
        ctx.parallel().for_each_mut(
            converted.histograms_mut(),
            ctx.token(),
            self.name(),
            |index, histogram| {
                let widths = histogram.bin_widths().ok_or_else(|| {
                    AlgorithmError::invalid_argument(format!(
                        "workspace index {index} holds point data"
                    ))
                })?;
                if let Some(bin) = widths.iter().position(|w| w.abs() < f64::EPSILON) {
                    return Err(AlgorithmError::runtime(format!(
                        "zero bin width at workspace index {index}, bin {bin}"
                    )));
                }
                let (y, e) = histogram.y_e_mut();
                for ((y, e), width) in y.iter_mut().zip(e.iter_mut()).zip(&widths) {
                    *y /= width;
                    *e /= width;
                }
                Ok(())
            },
        )?;
        converted.metadata_mut().distribution = true;
        *workspace = converted;
        Ok(())
    }
}
