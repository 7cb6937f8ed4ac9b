use crate::VerifyError;

/// Which optional operations of a transform under test should be verified.
///
/// Every flag defaults to `true`.
/// Test authors may disable the operations a transform does not (yet) implement properly;
/// the corresponding checks are then skipped rather than failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// [crate::MathTransform::transform_f64]
    pub double_to_double: bool,
    /// [crate::MathTransform::transform_f32]
    pub float_to_float: bool,
    /// [crate::MathTransform::transform_f64_to_f32]
    pub double_to_float: bool,
    /// [crate::MathTransform::transform_f32_to_f64]
    pub float_to_double: bool,
    /// [crate::MathTransform::transform_within_f64] and [crate::MathTransform::transform_within_f32]
    pub overlapping_arrays: bool,
    /// [crate::MathTransform::invert]
    pub inverse: bool,
    /// [crate::MathTransform::derivative]
    pub derivative: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            double_to_double: true,
            float_to_float: true,
            double_to_float: true,
            float_to_double: true,
            overlapping_arrays: true,
            inverse: true,
            derivative: true,
        }
    }

    /// Only the mandatory single-point transform is verified.
    pub fn none() -> Self {
        Self {
            double_to_double: false,
            float_to_float: false,
            double_to_float: false,
            float_to_double: false,
            overlapping_arrays: false,
            inverse: false,
            derivative: false,
        }
    }

    fn flags(&self) -> [(&'static str, bool); 7] {
        [
            ("double_to_double", self.double_to_double),
            ("float_to_float", self.float_to_float),
            ("double_to_float", self.double_to_float),
            ("float_to_double", self.float_to_double),
            ("overlapping_arrays", self.overlapping_arrays),
            ("inverse", self.inverse),
            ("derivative", self.derivative),
        ]
    }

    /// Names of the disabled capabilities.
    pub fn disabled(&self) -> impl Iterator<Item = &'static str> {
        self.flags()
            .into_iter()
            .filter_map(|(name, enabled)| (!enabled).then_some(name))
    }

    /// Fail if any capability is disabled,
    /// for test suites which should exercise a transform completely.
    pub fn ensure_all_enabled(&self) -> Result<(), VerifyError> {
        let disabled: Vec<_> = self.disabled().collect();
        if disabled.is_empty() {
            Ok(())
        } else {
            Err(VerifyError::Structural(format!(
                "Capabilities disabled: {}",
                disabled.join(", ")
            )))
        }
    }
}
