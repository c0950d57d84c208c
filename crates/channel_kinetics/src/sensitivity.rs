//! Derivatives of the right-hand side by forward-mode automatic
//! differentiation.
//!
//! One dual pass is made per seeded input, so the state Jacobian costs four
//! kernel evaluations and the parameter sensitivities three.

use crate::autodiff::Dual;
use crate::kinetics::{
    evaluate, DerivativeVector, ParameterVector, StateVector, N_PARAMETERS, N_STATES,
};
use nalgebra::{Matrix4, SMatrix};

/// ∂g_i/∂p_k, rows indexed by derivative component.
pub type ParameterJacobian = SMatrix<f64, N_STATES, N_PARAMETERS>;

/// Seeds a unit tangent on entry `j`.
fn seeded<const N: usize>(values: &[f64; N], j: usize) -> [Dual; N] {
    std::array::from_fn(|i| Dual::new(values[i], if i == j { 1.0 } else { 0.0 }))
}

/// ∂g_i/∂x_j at (t, x, p).
pub fn state_jacobian(t: f64, x: &StateVector, p: &ParameterVector) -> Matrix4<f64> {
    let t_dual = Dual::constant(t);
    let p_dual = p.map(Dual::constant);

    let mut jacobian = Matrix4::zeros();
    for j in 0..N_STATES {
        let g = evaluate(t_dual, &seeded(x, j), &p_dual);
        for i in 0..N_STATES {
            jacobian[(i, j)] = g[i].eps;
        }
    }
    jacobian
}

/// ∂g_i/∂p_k at (t, x, p).
pub fn parameter_jacobian(t: f64, x: &StateVector, p: &ParameterVector) -> ParameterJacobian {
    evaluate_with_sensitivities(t, x, p).1
}

/// dx/dt together with its parameter sensitivities.
///
/// The derivative vector is bit-identical to [`evaluate`] over `f64`.
pub fn evaluate_with_sensitivities(
    t: f64,
    x: &StateVector,
    p: &ParameterVector,
) -> (DerivativeVector, ParameterJacobian) {
    let t_dual = Dual::constant(t);
    let x_dual = x.map(Dual::constant);

    let mut values = [0.0; N_STATES];
    let mut sensitivities = ParameterJacobian::zeros();
    for k in 0..N_PARAMETERS {
        let g = evaluate(t_dual, &x_dual, &seeded(p, k));
        for i in 0..N_STATES {
            values[i] = g[i].val;
            sensitivities[(i, k)] = g[i].eps;
        }
    }
    (values, sensitivities)
}
