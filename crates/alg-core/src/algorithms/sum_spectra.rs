//! Add spectra together bin by bin

use super::{check_index_range, declare_index_range, declare_input_output, index_range};
use super::{INPUT_WORKSPACE, OUTPUT_WORKSPACE};
use crate::algorithm::Algorithm;
use crate::error::{AlgorithmError, ValidationIssue};
use crate::runner::ExecutionContext;
use alg_property::{PropertyError, PropertyManager};
use alg_workspace::{Histogram, WorkspaceHandle};

/// Running bin-wise total; errors are kept squared until the end
#[derive(Debug, Clone, Default, PartialEq)]
struct Total {
    y: Vec<f64>,
    error_sq: Vec<f64>,
    detectors: Vec<u32>,
}

impl Total {
    fn of(histogram: &Histogram) -> Self {
        Self {
            y: histogram.y().to_vec(),
            error_sq: histogram.e().iter().map(|e| e * e).collect(),
            detectors: histogram.detector_ids().to_vec(),
        }
    }

    /// Merge two totals; an empty side is the identity
    fn merge(mut self, other: Self) -> Self {
        if self.y.is_empty() {
            return Self {
                detectors: [self.detectors, other.detectors].concat(),
                ..other
            };
        }
        for (a, b) in self.y.iter_mut().zip(&other.y) {
            *a += b;
        }
        for (a, b) in self.error_sq.iter_mut().zip(&other.error_sq) {
            *a += b;
        }
        self.detectors.extend(other.detectors);
        self
    }
}

/// One spectrum holding the sum of the selected spectra
#[derive(Debug, Default)]
pub struct SumSpectra;

impl Algorithm for SumSpectra {
    fn name(&self) -> &'static str {
        "SumSpectra"
    }

    fn category(&self) -> &'static str {
        "Transforms\\Grouping"
    }

    fn summary(&self) -> &'static str {
        "Add the selected spectra into a single spectrum"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        declare_input_output(properties)?;
        declare_index_range(properties)
    }

    fn validate_inputs(&self, properties: &PropertyManager) -> Vec<ValidationIssue> {
        check_index_range(properties)
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let input = ctx.workspace(INPUT_WORKSPACE)?;
        let output = {
            let source = input.read();
            let range = index_range(ctx, source.histogram_count())?;
            let first = source.histogram(range.start)?;
            let y_length = first.y().len();
            let sources = source.histograms();

            let total = ctx.parallel().parallel_reduce(
                range.len(),
                ctx.token(),
                self.name(),
                Total::default(),
                |i| {
                    let histogram = &sources[range.start + i];
                    if histogram.y().len() == y_length {
                        Ok(Total::of(histogram))
                    } else {
                        Err(AlgorithmError::invalid_argument(format!(
                            "spectrum {} has {} bins, expected {y_length}",
                            range.start + i,
                            histogram.y().len()
                        )))
                    }
                },
                Total::merge,
            )?;

            let mut summed = ctx.workspace_factory().create_from_parent_with_shape(
                &**source,
                1,
                first.x().len(),
                y_length,
            )?;
            let histogram = summed.histogram_mut(0)?;
            histogram.set_x(first.x().to_vec())?;
            histogram.set_y(total.y)?;
            histogram.set_e(total.error_sq.into_iter().map(f64::sqrt).collect())?;
            histogram.set_spectrum_number(first.spectrum_number());
            let mut detectors = total.detectors;
            detectors.sort_unstable();
            detectors.dedup();
            histogram.set_detector_ids(detectors);
            WorkspaceHandle::new(summed)
        };
        ctx.set_workspace(OUTPUT_WORKSPACE, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_with_identity_keeps_other_side() {
        let mut h = Histogram::from_buffers(vec![0.0, 1.0], vec![2.0], vec![3.0]).unwrap();
        h.set_detector_ids([7]);
        let total = Total::default().merge(Total::of(&h));
        assert_eq!(total, Total::of(&h));
        let doubled = total.clone().merge(total);
        assert_eq!(doubled.y, vec![4.0]);
        assert_eq!(doubled.error_sq, vec![18.0]);
        assert_eq!(doubled.detectors, vec![7, 7]);
    }
}
