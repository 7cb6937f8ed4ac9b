/// The kind of comparison being performed,
/// so that tolerance models can use different thresholds for each.
///
/// For example when testing a conversion from degrees to metres,
/// a precision of 10 cm is a tolerance of 0.1 in the forward direction
/// but about 1e-6 in the inverse direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonMode {
    /// Bit-for-bit equality, ignoring any tolerance.
    Strict,
    /// Values produced by the transform under test.
    DirectTransform,
    /// Values produced by the inverse of the transform under test.
    InverseTransform,
    /// Elements of a derivative (Jacobian) matrix.
    Derivative,
}

/// Absolute threshold under which two ordinate values are considered equal.
pub trait Tolerance: std::fmt::Debug + Send + Sync {
    /// Threshold for comparing the given ordinate value,
    /// found at `dimension` within its point.
    fn threshold(&self, ordinate: f64, dimension: usize, mode: ComparisonMode) -> f64;
}

/// A plain number is an absolute threshold, used for every non-strict comparison.
impl Tolerance for f64 {
    fn threshold(&self, _ordinate: f64, _dimension: usize, mode: ComparisonMode) -> f64 {
        match mode {
            ComparisonMode::Strict => 0.0,
            _ => *self,
        }
    }
}

/// Threshold proportional to the magnitude of the ordinate being compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relative(pub f64);

impl Tolerance for Relative {
    fn threshold(&self, ordinate: f64, _dimension: usize, mode: ComparisonMode) -> f64 {
        match mode {
            ComparisonMode::Strict => 0.0,
            _ => self.0 * ordinate.abs(),
        }
    }
}

/// A different absolute threshold for each kind of comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerMode {
    pub direct: f64,
    pub inverse: f64,
    pub derivative: f64,
}

impl Tolerance for PerMode {
    fn threshold(&self, _ordinate: f64, _dimension: usize, mode: ComparisonMode) -> f64 {
        match mode {
            ComparisonMode::Strict => 0.0,
            ComparisonMode::DirectTransform => self.direct,
            ComparisonMode::InverseTransform => self.inverse,
            ComparisonMode::Derivative => self.derivative,
        }
    }
}
