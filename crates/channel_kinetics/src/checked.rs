//! Early detection of non-finite derivatives.
//!
//! [`evaluate_checked`] runs the raw kernel and, when any component comes back
//! NaN or infinite, reports which component failed and why instead of letting
//! the value flow into an integrator or a likelihood.

use crate::kinetics::{
    evaluate, rate_denominator, Component, DerivativeVector, ParameterVector, StateVector,
    MEMBRANE_POTENTIAL, POTASSIUM_ACTIVATION, SODIUM_ACTIVATION,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KineticsError {
    /// A rate denominator `exp(-x1/10 - c) - 1` evaluated to exactly zero.
    #[error(
        "{component} is singular at membrane potential {potential} \
         (state {state:?}, parameters {parameters:?})"
    )]
    Singularity {
        component: Component,
        potential: f64,
        state: StateVector,
        parameters: ParameterVector,
    },
    /// Finite inputs produced a non-finite component without a zero denominator.
    #[error("{component} overflowed (state {state:?}, parameters {parameters:?})")]
    Overflow {
        component: Component,
        state: StateVector,
        parameters: ParameterVector,
    },
    #[error("non-finite input (state {state:?}, parameters {parameters:?})")]
    NonFiniteInput {
        state: StateVector,
        parameters: ParameterVector,
    },
}

impl KineticsError {
    /// The derivative component that failed, if the inputs were finite.
    pub fn component(&self) -> Option<Component> {
        match self {
            KineticsError::Singularity { component, .. }
            | KineticsError::Overflow { component, .. } => Some(*component),
            KineticsError::NonFiniteInput { .. } => None,
        }
    }

    pub fn is_singularity(&self) -> bool {
        matches!(self, KineticsError::Singularity { .. })
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, KineticsError::Overflow { .. })
    }
}

/// Evaluates dx/dt and rejects non-finite output.
///
/// On success the vector is bit-identical to [`evaluate`].
pub fn evaluate_checked(
    t: f64,
    x: &StateVector,
    p: &ParameterVector,
) -> Result<DerivativeVector, KineticsError> {
    let g = evaluate(t, x, p);
    match classify(x, p, &g) {
        None => Ok(g),
        Some(error) => {
            tracing::debug!(%error, "kinetics evaluation produced a non-finite derivative");
            Err(error)
        }
    }
}

/// Names the first non-finite component of `g`, or `None` if all are finite.
pub fn classify(
    x: &StateVector,
    p: &ParameterVector,
    g: &DerivativeVector,
) -> Option<KineticsError> {
    let component = Component::ALL
        .into_iter()
        .find(|c| !g[c.index()].is_finite())?;

    let (state, parameters) = (*x, *p);
    if !x.iter().chain(p.iter()).all(|v| v.is_finite()) {
        return Some(KineticsError::NonFiniteInput { state, parameters });
    }

    let potential = x[MEMBRANE_POTENTIAL];
    let singular = component
        .rate_shift()
        .is_some_and(|shift| rate_denominator(potential, shift) == 0.0);

    Some(if singular {
        KineticsError::Singularity {
            component,
            potential,
            state,
            parameters,
        }
    } else {
        KineticsError::Overflow {
            component,
            state,
            parameters,
        }
    })
}

/// Limit of `component` as the membrane potential approaches its singular
/// potential, with the gating variables held at their values in `x`.
///
/// Both rate singularities are removable: the numerator vanishes with the
/// denominator. [`evaluate`] never substitutes this value; it is offered to
/// callers that choose to regularize.
pub fn removable_limit(component: Component, x: &StateVector) -> Option<f64> {
    let v = component.singular_potential()?;
    match component {
        Component::SodiumActivation => {
            let m = x[SODIUM_ACTIVATION];
            Some((1.0 - m) - 4.0 * (-v / 18.0 - 25.0 / 6.0).exp() * m)
        }
        Component::PotassiumActivation => {
            let n = x[POTASSIUM_ACTIVATION];
            Some(0.1 * (1.0 - n) - 0.125 * (-v / 80.0 - 0.9375).exp() * n)
        }
        Component::MembranePotential | Component::SodiumInactivation => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetics::{
        suggested_parameters, suggested_state, POTASSIUM_SINGULAR_POTENTIAL,
        SODIUM_SINGULAR_POTENTIAL,
    };

    fn at_potential(v: f64) -> StateVector {
        let mut x = suggested_state();
        x[MEMBRANE_POTENTIAL] = v;
        x
    }

    #[test]
    fn finite_output_passes_through_unchanged() {
        let x = suggested_state();
        let p = suggested_parameters();
        let checked = evaluate_checked(0.0, &x, &p).expect("resting state is regular");
        assert_eq!(checked.map(f64::to_bits), evaluate(0.0, &x, &p).map(f64::to_bits));
    }

    #[test]
    fn sodium_singularity_is_reported() {
        let x = at_potential(-50.0);
        let err = evaluate_checked(0.0, &x, &suggested_parameters()).unwrap_err();
        assert!(err.is_singularity());
        assert_eq!(err.component(), Some(Component::SodiumActivation));
        let message = err.to_string();
        assert!(message.contains("g2"), "{message}");
        assert!(message.contains("-50"), "{message}");
    }

    #[test]
    fn potassium_singularity_is_reported() {
        let x = at_potential(-65.0);
        let err = evaluate_checked(0.0, &x, &suggested_parameters()).unwrap_err();
        assert_eq!(
            err,
            KineticsError::Singularity {
                component: Component::PotassiumActivation,
                potential: -65.0,
                state: x,
                parameters: suggested_parameters(),
            }
        );
    }

    #[test]
    fn exponential_overflow_is_reported() {
        let x = at_potential(-2.0e4);
        let err = evaluate_checked(0.0, &x, &suggested_parameters()).unwrap_err();
        assert!(err.is_overflow());
        assert_eq!(err.component(), Some(Component::SodiumActivation));
    }

    #[test]
    fn product_overflow_in_membrane_rate_is_reported() {
        let x = [-75.0, 1.0, 1.0, 1.0];
        let err = evaluate_checked(0.0, &x, &[f64::MAX, 0.0, 0.0]).unwrap_err();
        assert!(err.is_overflow());
        assert_eq!(err.component(), Some(Component::MembranePotential));
    }

    #[test]
    fn non_finite_inputs_are_reported() {
        let x = [f64::NAN, 0.05, 0.6, 0.3];
        let err = evaluate_checked(0.0, &x, &suggested_parameters()).unwrap_err();
        assert!(matches!(err, KineticsError::NonFiniteInput { .. }));
        assert_eq!(err.component(), None);
    }

    #[test]
    fn removable_limits_match_nearby_evaluations() {
        let p = suggested_parameters();
        for (component, v) in [
            (Component::SodiumActivation, SODIUM_SINGULAR_POTENTIAL),
            (Component::PotassiumActivation, POTASSIUM_SINGULAR_POTENTIAL),
        ] {
            let limit = removable_limit(component, &at_potential(v)).unwrap();
            for offset in [-1e-6, 1e-6] {
                let g = evaluate(0.0, &at_potential(v + offset), &p);
                assert!(
                    (g[component.index()] - limit).abs() < 1e-6,
                    "{component} near {v}: {} vs {limit}",
                    g[component.index()]
                );
            }
        }
        assert_eq!(removable_limit(Component::SodiumInactivation, &suggested_state()), None);
    }
}
