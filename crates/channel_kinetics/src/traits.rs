use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types the kinetics kernel can be evaluated over.
/// Implemented by `f64` for plain evaluation and by `Dual` for derivatives.
pub trait Scalar: Float + FromPrimitive + Debug + Send + Sync + 'static {
    /// Lifts an `f64` literal into the scalar type.
    /// Every scalar in this crate represents all finite and non-finite
    /// doubles, so the NaN fallback is unreachable in practice.
    fn lit(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + Send + Sync + 'static> Scalar for T {}

/// A continuous-time vector field dx/dt = f(t, x).
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}
