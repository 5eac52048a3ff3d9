//! Independent copy of a workspace

use super::{declare_input_output, INPUT_WORKSPACE, OUTPUT_WORKSPACE};
use crate::algorithm::Algorithm;
use crate::error::AlgorithmError;
use crate::runner::ExecutionContext;
use alg_property::{PropertyError, PropertyManager};

/// Deep copy: data, metadata and spectrum definitions
#[derive(Debug, Default)]
pub struct CloneWorkspace;

impl Algorithm for CloneWorkspace {
    fn name(&self) -> &'static str {
        "CloneWorkspace"
    }

    fn category(&self) -> &'static str {
        "Utility\\Workspaces"
    }

    fn summary(&self) -> &'static str {
        "Copy a workspace, data included"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_input_output(properties)
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let copy = ctx.workspace(INPUT_WORKSPACE)?.deep_clone();
        ctx.set_workspace(OUTPUT_WORKSPACE, copy)
    }
}
