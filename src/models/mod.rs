pub mod hub_selection;
pub mod solver;
pub mod transportation_model;
pub mod utils;

use good_lp::ResolutionError;
use thiserror::Error;

use crate::config::SolverKind;
use crate::solution::SolutionStatus;

pub use hub_selection::model::HubSelectionSolver;
pub use transportation_model::model::TransportationSolver;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
    /// A hub selection refers to a hub that is not part of the network
    #[error("unknown hub `{0}`")]
    UnknownHub(String),
    /// The configured backend was not compiled into this build
    #[error("the {0} solver is not available in this build")]
    SolverUnavailable(SolverKind),
    #[error("the model is infeasible")]
    Infeasible,
    #[error("the model is unbounded")]
    Unbounded,
    #[error("the solver failed: {0}")]
    Solver(String),
}

impl Error {
    /// The solution status this error reports, if it stems from the solver's verdict on the model
    pub fn status(&self) -> Option<SolutionStatus> {
        match self {
            Error::Infeasible => Some(SolutionStatus::Infeasible),
            Error::Unbounded => Some(SolutionStatus::Unbounded),
            _ => None,
        }
    }
}

impl From<ResolutionError> for Error {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => Error::Infeasible,
            ResolutionError::Unbounded => Error::Unbounded,
            other => Error::Solver(other.to_string()),
        }
    }
}
