pub mod config;
pub mod models;
pub mod parse;
pub mod problem;
pub mod solution;
pub mod utils;

pub use config::{ModelConfig, SolverKind};
pub use models::hub_selection::sets_and_parameters::{HubSelection, OpenHubLimit, RentalIncome};
pub use models::{Error, HubSelectionSolver, TransportationSolver};
pub use parse::LoadError;
pub use problem::Problem;
pub use solution::{ClosureImpact, HubSelectionResult, SolutionStatus, TransportationResult};
