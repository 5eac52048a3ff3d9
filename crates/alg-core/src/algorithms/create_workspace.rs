//! Workspaces from literal values

use super::{declare_output, OUTPUT_WORKSPACE};
use crate::algorithm::Algorithm;
use crate::error::{AlgorithmError, ValidationIssue};
use crate::runner::ExecutionContext;
use alg_property::{
    BoundedValidator, Direction, MandatoryValidator, Property, PropertyError, PropertyManager,
};
use alg_workspace::{Workspace2D, WorkspaceSingleValue};

/// Build a `Workspace2D` from flat x, y and e arrays
///
/// `DataY` holds `NSpec` spectra back to back. `DataX` is either one x
/// array shared by every spectrum or `NSpec` arrays back to back; each is as
/// long as a spectrum's y (point data) or one longer (histogram data).
#[derive(Debug, Default)]
pub struct CreateWorkspace;

impl CreateWorkspace {
    /// Per-spectrum x length and whether one x array is shared
    fn x_layout(x_len: usize, y_len: usize, spectra: usize) -> Option<(usize, bool)> {
        if x_len == y_len || x_len == y_len + 1 {
            return Some((x_len, true));
        }
        if spectra == 0 || x_len % spectra != 0 {
            return None;
        }
        let per_spectrum = x_len / spectra;
        (per_spectrum == y_len || per_spectrum == y_len + 1).then_some((per_spectrum, false))
    }

    fn spectra(properties: &PropertyManager) -> Result<usize, PropertyError> {
        let n: i64 = properties.get("NSpec")?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl Algorithm for CreateWorkspace {
    fn name(&self) -> &'static str {
        "CreateWorkspace"
    }

    fn category(&self) -> &'static str {
        "Utility\\Workspaces"
    }

    fn summary(&self) -> &'static str {
        "Build a workspace from flat x, y and e arrays"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        properties.declare(
            Property::new("DataX", Vec::<f64>::new(), Direction::Input)
                .with_validator(MandatoryValidator::new())
                .with_documentation("X values, shared or one array per spectrum"),
        )?;
        properties.declare(
            Property::new("DataY", Vec::<f64>::new(), Direction::Input)
                .with_validator(MandatoryValidator::new())
                .with_documentation("Y values of all spectra, back to back"),
        )?;
        properties.declare(
            Property::new("DataE", Vec::<f64>::new(), Direction::Input)
                .with_documentation("Errors, same layout as DataY; zeros when empty"),
        )?;
        properties.declare(
            Property::new("NSpec", 1_i64, Direction::Input)
                .with_validator(BoundedValidator::at_least(1.0))
                .with_documentation("Number of spectra"),
        )?;
        properties.declare(Property::new("WorkspaceTitle", "", Direction::Input))?;
        properties.declare(Property::new("YUnitLabel", "", Direction::Input))?;
        properties.declare(
            Property::new("Distribution", false, Direction::Input)
                .with_documentation("Whether y is already divided by bin width"),
        )?;
        declare_output(properties, "Name of the new workspace")
    }

    fn validate_inputs(&self, properties: &PropertyManager) -> Vec<ValidationIssue> {
        let (Ok(x), Ok(y), Ok(e), Ok(spectra)) = (
            properties.get::<Vec<f64>>("DataX"),
            properties.get::<Vec<f64>>("DataY"),
            properties.get::<Vec<f64>>("DataE"),
            Self::spectra(properties),
        ) else {
            return Vec::new();
        };
        if y.is_empty() || spectra == 0 {
            return Vec::new();
        }

        let mut issues = Vec::new();
        if y.len() % spectra == 0 {
            if Self::x_layout(x.len(), y.len() / spectra, spectra).is_none() {
                issues.push((
                    "DataX".to_string(),
                    format!(
                        "Length of DataX ({}) must match one spectrum of DataY, plus one for \
                         histograms, or NSpec times that",
                        x.len()
                    ),
                ));
            }
        } else {
            issues.push((
                "DataY".to_string(),
                format!(
                    "Length of DataY ({}) must be a multiple of NSpec ({spectra})",
                    y.len()
                ),
            ));
        }
        if !e.is_empty() && e.len() != y.len() {
            issues.push((
                "DataE".to_string(),
                format!("DataE must be empty or as long as DataY ({})", y.len()),
            ));
        }
        issues
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let x: Vec<f64> = ctx.get("DataX")?;
        let y: Vec<f64> = ctx.get("DataY")?;
        let e: Vec<f64> = ctx.get("DataE")?;
        let spectra = Self::spectra(ctx.properties())?;
        let y_len = y.len() / spectra;
        let (x_len, shared) = Self::x_layout(x.len(), y_len, spectra)
            .ok_or_else(|| AlgorithmError::invalid_argument("DataX does not fit DataY"))?;

        let output = ctx.create_workspace(Workspace2D::TYPE_ID, spectra, x_len, y_len)?;
        {
            let mut workspace = output.write();
            for (i, histogram) in workspace.histograms_mut().iter_mut().enumerate() {
                let xs = if shared {
                    x.clone()
                } else {
                    x[i * x_len..(i + 1) * x_len].to_vec()
                };
                histogram.set_x(xs)?;
                histogram.set_y(y[i * y_len..(i + 1) * y_len].to_vec())?;
                if !e.is_empty() {
                    histogram.set_e(e[i * y_len..(i + 1) * y_len].to_vec())?;
                }
            }
            let metadata = workspace.metadata_mut();
            metadata.title = ctx.get("WorkspaceTitle")?;
            metadata.y_unit = ctx.get("YUnitLabel")?;
            metadata.distribution = ctx.get("Distribution")?;
        }
        ctx.set_workspace(OUTPUT_WORKSPACE, output)
    }
}

/// Workspace holding one value and its error
#[derive(Debug, Default)]
pub struct CreateSingleValuedWorkspace;

impl Algorithm for CreateSingleValuedWorkspace {
    fn name(&self) -> &'static str {
        "CreateSingleValuedWorkspace"
    }

    fn category(&self) -> &'static str {
        "Utility\\Workspaces"
    }

    fn summary(&self) -> &'static str {
        "Create a workspace holding a single value"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        properties.declare(
            Property::new("DataValue", 0.0, Direction::Input)
                .with_validator(MandatoryValidator::new())
                .with_documentation("The value"),
        )?;
        properties.declare(
            Property::new("ErrorValue", 0.0, Direction::Input)
                .with_validator(BoundedValidator::at_least(0.0))
                .with_documentation("Its error"),
        )?;
        declare_output(properties, "Name of the new workspace")
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let value: f64 = ctx.get("DataValue")?;
        let error: f64 = ctx.get("ErrorValue")?;
        let output = ctx.create_workspace(WorkspaceSingleValue::TYPE_ID, 1, 1, 1)?;
        {
            let mut workspace = output.write();
            let histogram = workspace.histogram_mut(0)?;
            histogram.y_mut()[0] = value;
            histogram.e_mut()[0] = error;
        }
        ctx.set_workspace(OUTPUT_WORKSPACE, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_layout_shared_and_per_spectrum() {
        assert_eq!(CreateWorkspace::x_layout(4, 3, 2), Some((4, true)));
        assert_eq!(CreateWorkspace::x_layout(3, 3, 2), Some((3, true)));
        assert_eq!(CreateWorkspace::x_layout(8, 3, 2), Some((4, false)));
        assert_eq!(CreateWorkspace::x_layout(6, 3, 2), Some((3, false)));
        assert_eq!(CreateWorkspace::x_layout(5, 3, 2), None);
    }
}
