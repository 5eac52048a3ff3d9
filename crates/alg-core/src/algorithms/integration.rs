//! Sum each spectrum into a single bin

use super::{check_index_range, declare_index_range, declare_input_output, index_range};
use super::{INPUT_WORKSPACE, OUTPUT_WORKSPACE};
use crate::algorithm::Algorithm;
use crate::error::{AlgorithmError, ValidationIssue};
use crate::runner::ExecutionContext;
use alg_property::{Direction, Property, PropertyError, PropertyManager};
use alg_workspace::{Histogram, WorkspaceHandle};

/// Integration window over x
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    lower: f64,
    upper: f64,
    partial_bins: bool,
}

impl Window {
    const ALL: Window = Window {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
        partial_bins: false,
    };

    /// Fraction of the bin `[a, b]` inside the window
    fn fraction(&self, a: f64, b: f64) -> f64 {
        let width = b - a;
        if width > 0.0 {
            ((b.min(self.upper) - a.max(self.lower)) / width).clamp(0.0, 1.0)
        } else if self.contains(a) {
            1.0
        } else {
            0.0
        }
    }

    fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }

    /// Sum, error and covered x range of one spectrum
    fn integrate(&self, histogram: &Histogram) -> (f64, f64, [f64; 2]) {
        let (x, y, e) = (histogram.x(), histogram.y(), histogram.e());
        let mut sum = 0.0;
        let mut error_sq = 0.0;
        if histogram.is_histogram_data() {
            for (i, (y, e)) in y.iter().zip(e).enumerate() {
                let fraction = self.fraction(x[i], x[i + 1]);
                if fraction <= 0.0 || (fraction < 1.0 && !self.partial_bins) {
                    continue;
                }
                sum += y * fraction;
                error_sq += (e * fraction).powi(2);
            }
        } else {
            for ((x, y), e) in x.iter().zip(y).zip(e) {
                if self.contains(*x) {
                    sum += y;
                    error_sq += e * e;
                }
            }
        }
        let first = x.first().copied().unwrap_or(0.0);
        let last = x.last().copied().unwrap_or(first);
        let low = first.max(self.lower);
        let high = last.min(self.upper).max(low);
        (sum, error_sq.sqrt(), [low, high])
    }
}

fn integrate(
    ctx: &mut ExecutionContext<'_>,
    window: Window,
    label: &str,
) -> Result<(), AlgorithmError> {
    let input = ctx.workspace(INPUT_WORKSPACE)?;
    let output = {
        let source = input.read();
        let range = index_range(ctx, source.histogram_count())?;
        let first = range.start;
        let output = WorkspaceHandle::new(
            ctx.workspace_factory()
                .create_from_parent_with_shape(&**source, range.len(), 2, 1)?,
        );
        let sources = source.histograms();
        let mut target = output.write();
        ctx.parallel()
            .for_each_mut(target.histograms_mut(), ctx.token(), label, |i, histogram| {
                let from = &sources[first + i];
                let (sum, error, x) = window.integrate(from);
                histogram.set_x(x.to_vec())?;
                histogram.y_mut()[0] = sum;
                histogram.e_mut()[0] = error;
                histogram.copy_spectrum_definition(from);
                Ok(())
            })?;
        drop(target);
        output
    };
    ctx.set_workspace(OUTPUT_WORKSPACE, output)
}

/// Sum of every bin of the selected spectra
#[derive(Debug, Default)]
pub struct Integration;

impl Algorithm for Integration {
    fn name(&self) -> &'static str {
        "Integration"
    }

    fn category(&self) -> &'static str {
        "Arithmetic\\Integration"
    }

    fn summary(&self) -> &'static str {
        "Sum every bin of each spectrum into one bin"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_input_output(properties)?;
        declare_index_range(properties)
    }

    fn validate_inputs(&self, properties: &PropertyManager) -> Vec<ValidationIssue> {
        check_index_range(properties)
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        integrate(ctx, Window::ALL, self.name())
    }
}

/// Integration restricted to an x range, optionally weighting partial bins
#[derive(Debug, Default)]
pub struct IntegrationV2;

impl Algorithm for IntegrationV2 {
    fn name(&self) -> &'static str {
        "Integration"
    }

    fn version(&self) -> u32 {
        2
    }

    fn category(&self) -> &'static str {
        "Arithmetic\\Integration"
    }

    fn summary(&self) -> &'static str {
        "Sum the bins of each spectrum inside an x range"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_input_output(properties)?;
        properties.declare(
            Property::new("RangeLower", f64::NEG_INFINITY, Direction::Input)
                .with_documentation("Lowest x to include"),
        )?;
        properties.declare(
            Property::new("RangeUpper", f64::INFINITY, Direction::Input)
                .with_documentation("Highest x to include"),
        )?;
        properties.declare(
            Property::new("IncludePartialBins", false, Direction::Input)
                .with_documentation("Weight bins cut by the range by their covered fraction"),
        )?;
        declare_index_range(properties)
    }

    fn validate_inputs(&self, properties: &PropertyManager) -> Vec<ValidationIssue> {
        let mut issues = check_index_range(properties);
        if let (Ok(lower), Ok(upper)) = (
            properties.get::<f64>("RangeLower"),
            properties.get::<f64>("RangeUpper"),
        ) {
            if lower > upper {
                issues.push((
                    "RangeUpper".to_string(),
                    format!("RangeUpper ({upper}) must not be below RangeLower ({lower})"),
                ));
            }
        }
        issues
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let window = Window {
            lower: ctx.get("RangeLower")?,
            upper: ctx.get("RangeUpper")?,
            partial_bins: ctx.get("IncludePartialBins")?,
        };
        integrate(ctx, window, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spectrum() -> Histogram {
        Histogram::from_buffers(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![1.0, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn whole_range_sums_everything() {
        let (sum, error, x) = Window::ALL.integrate(&spectrum());
        assert_eq!(sum, 10.0);
        assert_eq!(error, 2.0);
        assert_eq!(x, [0.0, 4.0]);
    }

    #[test]
    fn window_skips_partial_bins_unless_asked() {
        let mut window = Window {
            lower: 0.5,
            upper: 3.0,
            partial_bins: false,
        };
        assert_eq!(window.integrate(&spectrum()).0, 5.0);
        window.partial_bins = true;
        assert_eq!(window.integrate(&spectrum()).0, 5.5);
        assert_eq!(window.integrate(&spectrum()).2, [0.5, 3.0]);
    }

    #[test]
    fn point_data_uses_contained_points() {
        let points =
            Histogram::from_buffers(vec![1.0, 2.0, 3.0], vec![5.0, 6.0, 7.0], vec![0.0; 3])
                .unwrap();
        let window = Window {
            lower: 1.5,
            upper: 3.0,
            partial_bins: false,
        };
        assert_eq!(window.integrate(&points).0, 13.0);
    }
}
