use std::fmt;

use thiserror::Error;

use crate::{Matrix, Ordinate};

/// Alias for a `Result<T, VerifyError>`.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Every way a verification can fail.
///
/// Numeric failures ([VerifyError::Mismatch], [VerifyError::DerivativeMismatch])
/// mean a computed value is outside tolerance;
/// every other variant is structural: a precondition on the transform or its inputs was violated.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Structural failure: {0}")]
    Structural(String),

    #[error("{what}: expected {expected} dimensions but got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Transform is not invertible")]
    NotInvertible,

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Mismatch(Box<TransformFailure>),

    #[error("{0}")]
    DerivativeMismatch(Box<DerivativeFailure>),
}

impl VerifyError {
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            VerifyError::Mismatch(_) | VerifyError::DerivativeMismatch(_)
        )
    }

    pub fn transform_failure(&self) -> Option<&TransformFailure> {
        match self {
            VerifyError::Mismatch(f) => Some(f),
            _ => None,
        }
    }

    pub fn derivative_failure(&self) -> Option<&DerivativeFailure> {
        match self {
            VerifyError::DerivativeMismatch(f) => Some(f),
            _ => None,
        }
    }
}

impl From<TransformFailure> for VerifyError {
    fn from(value: TransformFailure) -> Self {
        VerifyError::Mismatch(Box::new(value))
    }
}

impl From<DerivativeFailure> for VerifyError {
    fn from(value: DerivativeFailure) -> Self {
        VerifyError::DerivativeMismatch(Box::new(value))
    }
}

/// A transformed ordinate which differs from the expected value by more than the tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformFailure {
    pub message: String,
    /// Number of ordinates per point.
    pub dimension: usize,
    pub point_index: usize,
    /// Index of the mismatched ordinate within its point.
    pub ordinate_index: usize,
    pub expected: f64,
    pub actual: f64,
    pub delta: f64,
    /// The whole expected point, formatted in its native precision.
    pub expected_point: String,
    /// The whole actual point, formatted in its native precision.
    pub actual_point: String,
}

fn format_point<O: Ordinate>(pt: &[O]) -> String {
    let values: Vec<String> = pt.iter().map(|v| v.to_string()).collect();
    format!("({})", values.join(", "))
}

impl TransformFailure {
    /// `expected_point` and `actual_point` are the whole points containing the mismatch.
    pub(crate) fn new<E: Ordinate, A: Ordinate>(
        message: &str,
        point_index: usize,
        ordinate_index: usize,
        expected_point: &[E],
        actual_point: &[A],
        delta: f64,
    ) -> Self {
        Self {
            message: message.to_string(),
            dimension: expected_point.len(),
            point_index,
            ordinate_index,
            expected: expected_point[ordinate_index].to_f64(),
            actual: actual_point[ordinate_index].to_f64(),
            delta,
            expected_point: format_point(expected_point),
            actual_point: format_point(actual_point),
        }
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(
            f,
            "DirectPosition{}D[{}]: Expected {} but got {}.",
            self.dimension, self.point_index, self.expected_point, self.actual_point
        )?;
        write!(
            f,
            "The delta at ordinate {} is {}",
            self.ordinate_index, self.delta
        )
    }
}

/// A derivative matrix element which differs from its finite-difference estimate
/// by more than the tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeFailure {
    pub message: String,
    pub row: usize,
    pub column: usize,
    pub expected: f64,
    pub actual: f64,
    pub delta: f64,
    /// The estimated matrix; may be approximate.
    pub expected_matrix: Matrix,
    pub actual_matrix: Matrix,
}

impl fmt::Display for DerivativeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(
            f,
            "Matrix({},{}): expected {} but got {} (a difference of {})",
            self.row, self.column, self.expected, self.actual, self.delta
        )?;
        writeln!(f, "Expected matrix (may be approximate):")?;
        writeln!(f, "{}", self.expected_matrix)?;
        writeln!(f, "Actual matrix:")?;
        write!(f, "{}", self.actual_matrix)
    }
}
