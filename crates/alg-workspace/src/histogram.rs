//! One spectrum of a matrix workspace

use crate::error::WorkspaceError;
use smallvec::SmallVec;

/// Detector ids contributing to a spectrum; usually one
pub type DetectorIds = SmallVec<[u32; 4]>;

/// X, Y and E buffers of one spectrum plus its spectrum definition
///
/// Buffer lengths are fixed at construction; setters reject buffers of a
/// different length.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    x: Vec<f64>,
    y: Vec<f64>,
    e: Vec<f64>,
    spectrum_number: i32,
    detector_ids: DetectorIds,
}

impl Histogram {
    /// Zero-filled buffers
    #[must_use]
    pub fn zeroed(x_length: usize, y_length: usize) -> Self {
        Self {
            x: vec![0.0; x_length],
            y: vec![0.0; y_length],
            e: vec![0.0; y_length],
            spectrum_number: 0,
            detector_ids: DetectorIds::new(),
        }
    }

    /// Build from buffers
    ///
    /// # Errors
    /// `WorkspaceError::LengthMismatch` if `e` and `y` differ in length or `x`
    /// is neither `y.len()` nor `y.len() + 1` long
    pub fn from_buffers(x: Vec<f64>, y: Vec<f64>, e: Vec<f64>) -> Result<Self, WorkspaceError> {
        if e.len() != y.len() {
            return Err(WorkspaceError::LengthMismatch {
                buffer: "e",
                expected: y.len(),
                actual: e.len(),
            });
        }
        if x.len() != y.len() && x.len() != y.len() + 1 {
            return Err(WorkspaceError::LengthMismatch {
                buffer: "x",
                expected: y.len() + 1,
                actual: x.len(),
            });
        }
        Ok(Self {
            x,
            y,
            e,
            spectrum_number: 0,
            detector_ids: DetectorIds::new(),
        })
    }

    /// X values (bin boundaries or points)
    #[inline]
    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Y values (counts)
    #[inline]
    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// E values (errors)
    #[inline]
    #[must_use]
    pub fn e(&self) -> &[f64] {
        &self.e
    }

    /// Mutable x values
    #[inline]
    pub fn x_mut(&mut self) -> &mut [f64] {
        &mut self.x
    }

    /// Mutable y values
    #[inline]
    pub fn y_mut(&mut self) -> &mut [f64] {
        &mut self.y
    }

    /// Mutable e values
    #[inline]
    pub fn e_mut(&mut self) -> &mut [f64] {
        &mut self.e
    }

    /// Mutable y and e at once
    #[inline]
    pub fn y_e_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.y, &mut self.e)
    }

    /// Replace x
    ///
    /// # Errors
    /// `WorkspaceError::LengthMismatch` if the length differs
    pub fn set_x(&mut self, x: Vec<f64>) -> Result<(), WorkspaceError> {
        Self::check_len("x", self.x.len(), x.len())?;
        self.x = x;
        Ok(())
    }

    /// Replace y
    ///
    /// # Errors
    /// `WorkspaceError::LengthMismatch` if the length differs
    pub fn set_y(&mut self, y: Vec<f64>) -> Result<(), WorkspaceError> {
        Self::check_len("y", self.y.len(), y.len())?;
        self.y = y;
        Ok(())
    }

    /// Replace e
    ///
    /// # Errors
    /// `WorkspaceError::LengthMismatch` if the length differs
    pub fn set_e(&mut self, e: Vec<f64>) -> Result<(), WorkspaceError> {
        Self::check_len("e", self.e.len(), e.len())?;
        self.e = e;
        Ok(())
    }

    fn check_len(buffer: &'static str, expected: usize, actual: usize) -> Result<(), WorkspaceError> {
        if expected == actual {
            Ok(())
        } else {
            Err(WorkspaceError::LengthMismatch {
                buffer,
                expected,
                actual,
            })
        }
    }

    /// Spectrum number
    #[inline]
    #[must_use]
    pub fn spectrum_number(&self) -> i32 {
        self.spectrum_number
    }

    /// Set spectrum number
    #[inline]
    pub fn set_spectrum_number(&mut self, number: i32) {
        self.spectrum_number = number;
    }

    /// Detector ids
    #[inline]
    #[must_use]
    pub fn detector_ids(&self) -> &[u32] {
        &self.detector_ids
    }

    /// Add a detector id if not already present
    pub fn add_detector_id(&mut self, id: u32) {
        if !self.detector_ids.contains(&id) {
            self.detector_ids.push(id);
        }
    }

    /// Replace the detector ids
    pub fn set_detector_ids(&mut self, ids: impl IntoIterator<Item = u32>) {
        self.detector_ids = ids.into_iter().collect();
    }

    /// Copy spectrum number and detector ids from `other`
    pub fn copy_spectrum_definition(&mut self, other: &Histogram) {
        self.spectrum_number = other.spectrum_number;
        self.detector_ids.clone_from(&other.detector_ids);
    }

    /// Whether x holds bin boundaries
    #[inline]
    #[must_use]
    pub fn is_histogram_data(&self) -> bool {
        self.x.len() == self.y.len() + 1
    }

    /// Bin widths, `None` for point data
    #[must_use]
    pub fn bin_widths(&self) -> Option<Vec<f64>> {
        if !self.is_histogram_data() {
            return None;
        }
        Some(self.x.windows(2).map(|w| w[1] - w[0]).collect())
    }

    /// Sum of y
    #[must_use]
    pub fn sum_y(&self) -> f64 {
        self.y.iter().sum()
    }

    /// Error of the y sum (quadrature)
    #[must_use]
    pub fn sum_e(&self) -> f64 {
        self.e.iter().map(|e| e * e).sum::<f64>().sqrt()
    }

    /// Approximate heap size in bytes
    #[must_use]
    pub fn memory_size(&self) -> usize {
        (self.x.len() + self.y.len() + self.e.len()) * std::mem::size_of::<f64>()
            + self.detector_ids.len() * std::mem::size_of::<u32>()
    }
}
