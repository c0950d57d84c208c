use crate::checked::{evaluate_checked, KineticsError};
use crate::kinetics::{
    evaluate, suggested_parameters, suggested_state, DerivativeVector, ParameterVector,
    StateVector,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One (t, x, p) query, e.g. a member of an optimiser's candidate population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationPoint {
    pub t: f64,
    pub state: StateVector,
    pub parameters: ParameterVector,
}

impl Default for EvaluationPoint {
    fn default() -> Self {
        Self {
            t: 0.0,
            state: suggested_state(),
            parameters: suggested_parameters(),
        }
    }
}

/// Outcome of a checked ensemble evaluation.
#[derive(Debug, Clone)]
pub struct EnsembleReport {
    /// One entry per input point, in input order.
    pub results: Vec<Result<DerivativeVector, KineticsError>>,
    pub singular: usize,
    pub overflowed: usize,
    pub non_finite_inputs: usize,
}

impl EnsembleReport {
    pub fn faults(&self) -> usize {
        self.singular + self.overflowed + self.non_finite_inputs
    }

    pub fn all_finite(&self) -> bool {
        self.faults() == 0
    }
}

/// Evaluates every point in parallel. Output order matches input order.
pub fn evaluate_ensemble(points: &[EvaluationPoint]) -> Vec<DerivativeVector> {
    points
        .par_iter()
        .map(|point| evaluate(point.t, &point.state, &point.parameters))
        .collect()
}

/// Like [`evaluate_ensemble`], but reports non-finite points individually.
pub fn evaluate_ensemble_checked(points: &[EvaluationPoint]) -> EnsembleReport {
    let results: Vec<_> = points
        .par_iter()
        .map(|point| evaluate_checked(point.t, &point.state, &point.parameters))
        .collect();

    let mut report = EnsembleReport {
        results,
        singular: 0,
        overflowed: 0,
        non_finite_inputs: 0,
    };
    for error in report.results.iter().filter_map(|r| r.as_ref().err()) {
        match error {
            KineticsError::Singularity { .. } => report.singular += 1,
            KineticsError::Overflow { .. } => report.overflowed += 1,
            KineticsError::NonFiniteInput { .. } => report.non_finite_inputs += 1,
        }
    }

    if !report.all_finite() {
        tracing::warn!(
            points = points.len(),
            singular = report.singular,
            overflowed = report.overflowed,
            non_finite_inputs = report.non_finite_inputs,
            "ensemble evaluation produced non-finite derivatives"
        );
    }
    report
}
