pub mod autodiff;
pub mod checked;
pub mod ensemble;
pub mod kinetics;
pub mod sensitivity;
/// The `channel_kinetics` crate evaluates the right-hand side of a four-state
/// Hodgkin-Huxley ion-channel model. It is the inner kernel an ODE integrator
/// (and, above it, an optimiser or sampler) calls millions of times.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction) and `DynamicalSystem` (the vector-field interface integrators consume).
/// - **Kinetics**: the raw `evaluate` kernel and the `KineticsModel` value type holding a parameter vector.
/// - **Checked**: `evaluate_checked`, which reports singular or overflowed outputs as a structured `KineticsError`.
/// - **Sensitivity**: state and parameter Jacobians computed with Dual numbers.
/// - **Ensemble**: parallel evaluation of many (t, x, p) points.
pub mod traits;

pub use checked::{evaluate_checked, KineticsError};
pub use kinetics::{
    evaluate, DerivativeVector, KineticsModel, ParameterVector, StateVector,
};
