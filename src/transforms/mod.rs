//! Simple transforms with exact inverses and derivatives,
//! useful as well-behaved transforms under test and as building blocks for test fixtures.
mod affine;
pub use affine::Affine;
mod bijection;
pub use bijection::Bijection;
mod identity;
pub use identity::Identity;
mod map_axis;
pub use map_axis::MapAxis;
mod scale;
pub use scale::Scale;
mod sequence;
pub use sequence::{Sequence, SequenceBuilder};
mod translate;
pub use translate::Translate;
