//! Multiply or offset every value of a workspace

use super::{declare_input_output, INPUT_WORKSPACE, OUTPUT_WORKSPACE};
use crate::algorithm::Algorithm;
use crate::error::AlgorithmError;
use crate::runner::ExecutionContext;
use alg_property::{Direction, ListValidator, Property, PropertyError, PropertyManager};
use alg_workspace::WorkspaceHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operation {
    Multiply,
    Add,
}

impl Operation {
    fn parse(value: &str) -> Result<Self, AlgorithmError> {
        match value {
            "Multiply" => Ok(Self::Multiply),
            "Add" => Ok(Self::Add),
            other => Err(AlgorithmError::invalid_argument(format!(
                "unknown operation '{other}'"
            ))),
        }
    }

    fn apply(self, factor: f64, y: f64, e: f64) -> (f64, f64) {
        match self {
            Self::Multiply => (y * factor, e * factor.abs()),
            Self::Add => (y + factor, e),
        }
    }
}

/// `y * Factor` or `y + Factor` for every bin
#[derive(Debug, Default)]
pub struct Scale;

impl Algorithm for Scale {
    fn name(&self) -> &'static str {
        "Scale"
    }

    fn category(&self) -> &'static str {
        "Arithmetic"
    }

    fn summary(&self) -> &'static str {
        "Multiply every value by a factor, or add the factor to it"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_input_output(properties)?;
        properties.declare(
            Property::new("Factor", 1.0, Direction::Input).with_documentation("Factor or offset"),
        )?;
        properties.declare(
            Property::new("Operation", "Multiply", Direction::Input)
                .with_validator(ListValidator::new(["Multiply", "Add"]))
                .with_documentation("Multiply or Add"),
        )
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let input = ctx.workspace(INPUT_WORKSPACE)?;
        let factor: f64 = ctx.get("Factor")?;
        let operation = Operation::parse(&ctx.get::<String>("Operation")?)?;

        let output = {
            let source = input.read();
            let output = WorkspaceHandle::new(ctx.workspace_factory().create_from_parent(&**source)?);
            let sources = source.histograms();
            let mut target = output.write();
            ctx.parallel().for_each_mut(
                target.histograms_mut(),
                ctx.token(),
                self.name(),
                |i, histogram| {
                    let from = &sources[i];
                    histogram.set_x(from.x().to_vec())?;
                    let (y, e) = histogram.y_e_mut();
                    for (j, (y, e)) in y.iter_mut().zip(e.iter_mut()).enumerate() {
                        (*y, *e) = operation.apply(factor, from.y()[j], from.e()[j]);
                    }
                    Ok(())
                },
            )?;
            drop(target);
            output
        };
        ctx.set_workspace(OUTPUT_WORKSPACE, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_scales_errors_by_magnitude() {
        assert_eq!(Operation::Multiply.apply(-2.0, 3.0, 0.5), (-6.0, 1.0));
        assert_eq!(Operation::Add.apply(-2.0, 3.0, 0.5), (1.0, 0.5));
        assert!(Operation::parse("Divide").is_err());
    }
}
