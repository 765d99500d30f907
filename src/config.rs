use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Error;
use crate::problem::Cost;

/// The LP/MILP backend used to solve the models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Pure Rust simplex with branch and bound, always available
    #[default]
    Microlp,
    /// COIN-OR CBC, requires the `cbc` feature
    Cbc,
    /// HiGHS, requires the `highs` feature
    Highs,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Microlp => write!(f, "microlp"),
            SolverKind::Cbc => write!(f, "cbc"),
            SolverKind::Highs => write!(f, "highs"),
        }
    }
}

/// Policy parameters shared by the transportation and hub selection models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Unit cost charged on routes that can not be used
    pub penalty_cost: Cost,
    /// Upper bound on the through-flow of an open hub
    pub big_m: f64,
    /// The solver backend
    pub solver: SolverKind,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            penalty_cost: 500.0,
            big_m: 1e6,
            solver: SolverKind::default(),
        }
    }
}

impl ModelConfig {
    pub fn with_solver(self, solver: SolverKind) -> Self {
        ModelConfig { solver, ..self }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.penalty_cost.is_finite() || self.penalty_cost <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "penalty cost must be finite and positive, got {}",
                self.penalty_cost
            )));
        }
        if !self.big_m.is_finite() || self.big_m <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "big-M must be finite and positive, got {}",
                self.big_m
            )));
        }
        Ok(())
    }
}
