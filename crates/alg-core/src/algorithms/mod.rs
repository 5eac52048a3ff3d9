//! Built-in algorithms
//!
//! Small, complete algorithms that exercise the framework end to end:
//! workspace creation, per-spectrum transforms on the worker pool, reductions,
//! in-place edits and composition through child algorithms.

mod add_sample_log;
mod clone_workspace;
mod convert_to_distribution;
mod create_workspace;
mod integration;
mod normalise_to_total;
mod scale;
mod sum_spectra;

pub use add_sample_log::AddSampleLog;
pub use clone_workspace::CloneWorkspace;
pub use convert_to_distribution::ConvertToDistribution;
pub use create_workspace::{CreateSingleValuedWorkspace, CreateWorkspace};
pub use integration::{Integration, IntegrationV2};
pub use normalise_to_total::NormaliseToTotal;
pub use scale::Scale;
pub use sum_spectra::SumSpectra;

use crate::error::{AlgorithmError, FrameworkError, ValidationIssue};
use crate::registry::{RegistrationModule, RegistryBuilder};
use crate::runner::ExecutionContext;
use alg_property::{
    BoundedValidator, Direction, MandatoryValidator, Property, PropertyError, PropertyManager,
    Validator, WorkspaceSlot,
};
use std::ops::Range;

/// Conventional input workspace property name
pub const INPUT_WORKSPACE: &str = "InputWorkspace";
/// Conventional output workspace property name
pub const OUTPUT_WORKSPACE: &str = "OutputWorkspace";

const START_INDEX: &str = "StartWorkspaceIndex";
const END_INDEX: &str = "EndWorkspaceIndex";

/// Registers every built-in algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAlgorithms;

impl RegistrationModule for BuiltinAlgorithms {
    fn name(&self) -> &str {
        "builtin-algorithms"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), FrameworkError> {
        builder.register_algorithm::<AddSampleLog>()?;
        builder.register_algorithm::<CloneWorkspace>()?;
        builder.register_algorithm::<ConvertToDistribution>()?;
        builder.register_algorithm::<CreateSingleValuedWorkspace>()?;
        builder.register_algorithm::<CreateWorkspace>()?;
        builder.register_algorithm::<Integration>()?;
        builder.register_algorithm::<IntegrationV2>()?;
        builder.register_algorithm::<NormaliseToTotal>()?;
        builder.register_algorithm::<Scale>()?;
        builder.register_algorithm::<SumSpectra>()?;
        Ok(())
    }
}

fn declare_input(
    properties: &mut PropertyManager,
    name: &str,
    validator: impl Validator + 'static,
    documentation: &str,
) -> Result<(), PropertyError> {
    properties.declare(
        Property::new(name, WorkspaceSlot::default(), Direction::Input)
            .with_validator(validator)
            .with_documentation(documentation),
    )
}

fn declare_output(properties: &mut PropertyManager, documentation: &str) -> Result<(), PropertyError> {
    properties.declare(
        Property::new(OUTPUT_WORKSPACE, WorkspaceSlot::default(), Direction::Output)
            .with_documentation(documentation),
    )
}

fn declare_in_out(
    properties: &mut PropertyManager,
    name: &str,
    validator: impl Validator + 'static,
) -> Result<(), PropertyError> {
    properties.declare(
        Property::new(name, WorkspaceSlot::default(), Direction::InOut)
            .with_validator(validator)
            .with_documentation("Workspace modified in place"),
    )
}

/// Standard `InputWorkspace` + `OutputWorkspace` pair
fn declare_input_output(properties: &mut PropertyManager) -> Result<(), PropertyError> {
    declare_input(
        properties,
        INPUT_WORKSPACE,
        MandatoryValidator::new(),
        "Workspace to read",
    )?;
    declare_output(properties, "Name of the result")
}

fn declare_index_range(properties: &mut PropertyManager) -> Result<(), PropertyError> {
    properties.declare(
        Property::new(START_INDEX, 0_i64, Direction::Input)
            .with_validator(BoundedValidator::at_least(0.0))
            .with_documentation("First workspace index to include"),
    )?;
    properties.declare(
        Property::new(END_INDEX, -1_i64, Direction::Input)
            .with_validator(BoundedValidator::at_least(-1.0))
            .with_documentation("Last workspace index to include, -1 for the last spectrum"),
    )
}

fn check_index_range(properties: &PropertyManager) -> Vec<ValidationIssue> {
    match (properties.get::<i64>(START_INDEX), properties.get::<i64>(END_INDEX)) {
        (Ok(start), Ok(end)) if end >= 0 && end < start => vec![(
            END_INDEX.to_string(),
            format!("{END_INDEX} ({end}) must not be below {START_INDEX} ({start})"),
        )],
        _ => Vec::new(),
    }
}

/// Selected workspace indices, checked against `count` spectra
fn index_range(ctx: &ExecutionContext<'_>, count: usize) -> Result<Range<usize>, AlgorithmError> {
    let start = usize::try_from(ctx.get::<i64>(START_INDEX)?)
        .map_err(|_| AlgorithmError::invalid_argument(format!("{START_INDEX} must not be negative")))?;
    let end = match usize::try_from(ctx.get::<i64>(END_INDEX)?) {
        Ok(end) => end,
        Err(_) => count.saturating_sub(1),
    };
    if start >= count || end >= count {
        return Err(AlgorithmError::invalid_argument(format!(
            "workspace index range {start}..={end} is outside the {count} spectra"
        )));
    }
    Ok(start..end + 1)
}
