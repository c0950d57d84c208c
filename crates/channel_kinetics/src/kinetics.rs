//! Right-hand side of the four-state Hodgkin-Huxley kinetics model.
//!
//! State ordering: membrane potential, sodium activation, sodium
//! inactivation, potassium activation. Parameter ordering: sodium, potassium
//! and leak conductance scales. The vector field is autonomous; the time
//! argument is accepted for the integrator interface and ignored.

use crate::traits::{DynamicalSystem, Scalar};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const N_STATES: usize = 4;
pub const N_PARAMETERS: usize = 3;

pub type StateVector<T = f64> = [T; N_STATES];
pub type ParameterVector<T = f64> = [T; N_PARAMETERS];
pub type DerivativeVector<T = f64> = [T; N_STATES];

pub const MEMBRANE_POTENTIAL: usize = 0;
pub const SODIUM_ACTIVATION: usize = 1;
pub const SODIUM_INACTIVATION: usize = 2;
pub const POTASSIUM_ACTIVATION: usize = 3;

pub const SODIUM_CONDUCTANCE: usize = 0;
pub const POTASSIUM_CONDUCTANCE: usize = 1;
pub const LEAK_CONDUCTANCE: usize = 2;

pub const SODIUM_REVERSAL: f64 = 40.0;
pub const POTASSIUM_REVERSAL: f64 = -87.0;
pub const LEAK_REVERSAL: f64 = -64.387;
pub const INJECTED_CURRENT: f64 = 20.0;

/// Potential at which the sodium activation rate term is 0/0.
pub const SODIUM_SINGULAR_POTENTIAL: f64 = -50.0;
/// Potential at which the potassium activation rate term is 0/0.
pub const POTASSIUM_SINGULAR_POTENTIAL: f64 = -65.0;

const SODIUM_RATE_SHIFT: f64 = 5.0;
const POTASSIUM_RATE_SHIFT: f64 = 6.5;

/// One component of the derivative vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    MembranePotential,
    SodiumActivation,
    SodiumInactivation,
    PotassiumActivation,
}

impl Component {
    pub const ALL: [Component; N_STATES] = [
        Component::MembranePotential,
        Component::SodiumActivation,
        Component::SodiumInactivation,
        Component::PotassiumActivation,
    ];

    /// Position of this component in the state and derivative vectors.
    pub fn index(self) -> usize {
        match self {
            Component::MembranePotential => MEMBRANE_POTENTIAL,
            Component::SodiumActivation => SODIUM_ACTIVATION,
            Component::SodiumInactivation => SODIUM_INACTIVATION,
            Component::PotassiumActivation => POTASSIUM_ACTIVATION,
        }
    }

    /// Shift `c` of this component's rational rate term
    /// `.. / (exp(-x1/10 - c) - 1)`, if it has one.
    pub fn rate_shift(self) -> Option<f64> {
        match self {
            Component::SodiumActivation => Some(SODIUM_RATE_SHIFT),
            Component::PotassiumActivation => Some(POTASSIUM_RATE_SHIFT),
            Component::MembranePotential | Component::SodiumInactivation => None,
        }
    }

    /// Potential where this component's rate denominator vanishes.
    pub fn singular_potential(self) -> Option<f64> {
        self.rate_shift().map(|shift| -10.0 * shift)
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.index() + 1)
    }
}

/// Evaluates dx/dt at (t, x, p).
///
/// Arithmetic follows IEEE semantics throughout: nothing is range-checked,
/// clamped, or substituted, so singular or overflowing inputs produce NaN or
/// infinite components. Use [`crate::checked::evaluate_checked`] to have those
/// reported instead.
pub fn evaluate<T: Scalar>(
    _t: T,
    x: &StateVector<T>,
    p: &ParameterVector<T>,
) -> DerivativeVector<T> {
    [
        membrane_potential_rate(x, p),
        sodium_activation_rate(x),
        sodium_inactivation_rate(x),
        potassium_activation_rate(x),
    ]
}

/// Evaluates a single component. Equal to `evaluate(t, x, p)[component.index()]`.
pub fn evaluate_component<T: Scalar>(
    component: Component,
    x: &StateVector<T>,
    p: &ParameterVector<T>,
) -> T {
    match component {
        Component::MembranePotential => membrane_potential_rate(x, p),
        Component::SodiumActivation => sodium_activation_rate(x),
        Component::SodiumInactivation => sodium_inactivation_rate(x),
        Component::PotassiumActivation => potassium_activation_rate(x),
    }
}

fn membrane_potential_rate<T: Scalar>(x: &StateVector<T>, p: &ParameterVector<T>) -> T {
    let [v, m, h, n] = *x;
    let [g_na, g_k, g_l] = *p;

    -(v - T::lit(SODIUM_REVERSAL)) * g_na * m.powf(T::lit(3.0)) * h
        - (v - T::lit(POTASSIUM_REVERSAL)) * g_k * n.powf(T::lit(4.0))
        - (v - T::lit(LEAK_REVERSAL)) * g_l
        + T::lit(INJECTED_CURRENT)
}

fn sodium_activation_rate<T: Scalar>(x: &StateVector<T>) -> T {
    let v = x[MEMBRANE_POTENTIAL];
    let m = x[SODIUM_ACTIVATION];

    rate_ratio(m, v, 0.1, 5.0, SODIUM_RATE_SHIFT)
        - T::lit(4.0) * (-v / T::lit(18.0) - T::lit(25.0 / 6.0)).exp() * m
}

fn sodium_inactivation_rate<T: Scalar>(x: &StateVector<T>) -> T {
    let v = x[MEMBRANE_POTENTIAL];
    let h = x[SODIUM_INACTIVATION];
    let one = T::one();

    T::lit(-0.07) * (-v / T::lit(20.0) - T::lit(15.0 / 4.0)).exp() * (h - one)
        - h / ((-v / T::lit(10.0) - T::lit(4.5)).exp() + one)
}

fn potassium_activation_rate<T: Scalar>(x: &StateVector<T>) -> T {
    let v = x[MEMBRANE_POTENTIAL];
    let n = x[POTASSIUM_ACTIVATION];

    rate_ratio(n, v, 0.01, 0.65, POTASSIUM_RATE_SHIFT)
        - T::lit(0.125) * (-v / T::lit(80.0) - T::lit(0.9375)).exp() * n
}

/// `((gate - 1) * (slope * v + offset)) / (exp(-v / 10 - shift) - 1)`
///
/// Shared by both activation gates so they round identically.
fn rate_ratio<T: Scalar>(gate: T, v: T, slope: f64, offset: f64, shift: f64) -> T {
    let one = T::one();
    ((gate - one) * (T::lit(slope) * v + T::lit(offset))) / rate_denominator(v, shift)
}

/// `exp(-v / 10 - shift) - 1`, zero at the singular potential.
pub(crate) fn rate_denominator<T: Scalar>(v: T, shift: f64) -> T {
    (-v / T::lit(10.0) - T::lit(shift)).exp() - T::one()
}

/// Parameter values giving a resting, physiologically plausible cell.
pub fn suggested_parameters() -> ParameterVector {
    [0.12, 0.036, 0.0003]
}

/// A state near rest for [`suggested_parameters`].
pub fn suggested_state() -> StateVector {
    [-75.0, 0.05, 0.6, 0.3]
}

/// Copies a dynamically sized state buffer into a [`StateVector`].
pub fn state_from_slice(x: &[f64]) -> Result<StateVector> {
    if x.len() != N_STATES {
        bail!(
            "State dimension mismatch. Expected {}, got {}.",
            N_STATES,
            x.len()
        );
    }
    Ok([x[0], x[1], x[2], x[3]])
}

/// Copies a dynamically sized parameter buffer into a [`ParameterVector`].
pub fn parameters_from_slice(p: &[f64]) -> Result<ParameterVector> {
    if p.len() != N_PARAMETERS {
        bail!(
            "Parameter dimension mismatch. Expected {}, got {}.",
            N_PARAMETERS,
            p.len()
        );
    }
    Ok([p[0], p[1], p[2]])
}

/// The kinetics model with a fixed parameter vector, as an integrator sees it
/// over one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticsModel {
    pub sodium_conductance: f64,
    pub potassium_conductance: f64,
    pub leak_conductance: f64,
}

impl Default for KineticsModel {
    fn default() -> Self {
        Self::new(suggested_parameters())
    }
}

impl KineticsModel {
    pub fn new(parameters: ParameterVector) -> Self {
        let [sodium_conductance, potassium_conductance, leak_conductance] = parameters;
        Self {
            sodium_conductance,
            potassium_conductance,
            leak_conductance,
        }
    }

    pub fn from_slice(parameters: &[f64]) -> Result<Self> {
        parameters_from_slice(parameters).map(Self::new)
    }

    pub fn parameters(&self) -> ParameterVector {
        [
            self.sodium_conductance,
            self.potassium_conductance,
            self.leak_conductance,
        ]
    }

    pub fn n_parameters(&self) -> usize {
        N_PARAMETERS
    }

    pub fn n_states(&self) -> usize {
        N_STATES
    }

    /// dx/dt at (t, x) under this model's parameters.
    pub fn derivative(&self, t: f64, x: &StateVector) -> DerivativeVector {
        evaluate(t, x, &self.parameters())
    }

    fn lifted_parameters<T: Scalar>(&self) -> ParameterVector<T> {
        self.parameters().map(T::lit)
    }
}

impl<T: Scalar> DynamicalSystem<T> for KineticsModel {
    fn dimension(&self) -> usize {
        N_STATES
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        let state = [x[0], x[1], x[2], x[3]];
        let g = evaluate(t, &state, &self.lifted_parameters());
        out[..N_STATES].copy_from_slice(&g);
    }
}
