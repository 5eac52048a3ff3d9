//! Workspace dimensions

use crate::error::WorkspaceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimensions of a matrix workspace
///
/// # Invariants
/// - every field is ≥ 1 once validated
/// - `x_length == y_length` (point data) or `x_length == y_length + 1`
///   (histogram data, x holds bin boundaries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceShape {
    /// Number of spectra
    pub histogram_count: usize,
    /// Length of each x buffer
    pub x_length: usize,
    /// Length of each y (and e) buffer
    pub y_length: usize,
}

impl WorkspaceShape {
    /// Shape of a workspace that has not been initialized yet
    pub const EMPTY: Self = Self {
        histogram_count: 0,
        x_length: 0,
        y_length: 0,
    };

    /// Shape of a single-value workspace
    pub const SINGLE: Self = Self {
        histogram_count: 1,
        x_length: 1,
        y_length: 1,
    };

    /// Validated shape
    ///
    /// # Errors
    /// `WorkspaceError::InvalidArgument` for zero sizes, an x length that is
    /// neither `y_length` nor `y_length + 1`, or a value count that overflows
    /// `usize`
    pub fn new(
        histogram_count: usize,
        x_length: usize,
        y_length: usize,
    ) -> Result<Self, WorkspaceError> {
        let shape = Self {
            histogram_count,
            x_length,
            y_length,
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Histogram-data shape with `bins` bins per spectrum
    ///
    /// # Errors
    /// Same as [`new`](Self::new), plus `InvalidArgument` when `bins + 1`
    /// overflows
    pub fn histogram(histogram_count: usize, bins: usize) -> Result<Self, WorkspaceError> {
        let x_length = bins
            .checked_add(1)
            .ok_or_else(|| WorkspaceError::invalid(format!("{bins} bins is too many")))?;
        Self::new(histogram_count, x_length, bins)
    }

    /// Check the invariants
    ///
    /// # Errors
    /// See [`new`](Self::new)
    pub fn validate(&self) -> Result<(), WorkspaceError> {
        if self.histogram_count == 0 || self.x_length == 0 || self.y_length == 0 {
            return Err(WorkspaceError::invalid(format!(
                "all workspace dimensions must be positive, got {self}"
            )));
        }
        if self.x_length != self.y_length && !self.is_histogram_data() {
            return Err(WorkspaceError::invalid(format!(
                "x length {} must equal y length {} or y length + 1",
                self.x_length, self.y_length
            )));
        }
        if self.histogram_count.checked_mul(self.x_length).is_none() {
            return Err(WorkspaceError::invalid(format!(
                "workspace of {self} overflows the addressable size"
            )));
        }
        Ok(())
    }

    /// Whether x holds bin boundaries
    #[inline]
    #[must_use]
    pub fn is_histogram_data(&self) -> bool {
        self.y_length.checked_add(1) == Some(self.x_length)
    }

    /// Total number of y values, saturating for unvalidated shapes
    #[inline]
    #[must_use]
    pub fn total_values(&self) -> usize {
        self.histogram_count.saturating_mul(self.y_length)
    }
}

impl fmt::Display for WorkspaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} spectra x {} (x) / {} (y)",
            self.histogram_count, self.x_length, self.y_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_shape() {
        let shape = WorkspaceShape::histogram(3, 10).unwrap();
        assert_eq!(shape.x_length, 11);
        assert!(shape.is_histogram_data());
        assert_eq!(shape.total_values(), 30);
    }

    #[test]
    fn point_shape() {
        let shape = WorkspaceShape::new(2, 5, 5).unwrap();
        assert!(!shape.is_histogram_data());
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(WorkspaceShape::new(0, 2, 1).is_err());
        assert!(WorkspaceShape::new(1, 0, 0).is_err());
    }

    #[test]
    fn rejects_inconsistent_x_length() {
        assert!(matches!(
            WorkspaceShape::new(1, 7, 4),
            Err(WorkspaceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn oversized_shapes_rejected() {
        assert!(matches!(
            WorkspaceShape::histogram(1, usize::MAX),
            Err(WorkspaceError::InvalidArgument(_))
        ));
        assert!(matches!(
            WorkspaceShape::new(usize::MAX, 3, 2),
            Err(WorkspaceError::InvalidArgument(_))
        ));
        assert!(WorkspaceShape::new(1, usize::MAX, usize::MAX).is_ok());

        let unchecked = WorkspaceShape {
            histogram_count: usize::MAX,
            x_length: usize::MAX,
            y_length: usize::MAX,
        };
        assert!(!unchecked.is_histogram_data());
        assert_eq!(unchecked.total_values(), usize::MAX);
    }

    #[test]
    fn empty_shape_is_invalid() {
        assert!(WorkspaceShape::EMPTY.validate().is_err());
        assert!(WorkspaceShape::SINGLE.validate().is_ok());
    }
}
