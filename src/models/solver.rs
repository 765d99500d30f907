use good_lp::solvers::Solver;
use good_lp::{ResolutionError, SolverModel};
use log::{debug, info, warn};

use super::utils::{ConvertVars, Formulation};
use super::Error;
use crate::config::SolverKind;

impl SolverKind {
    /// Whether this backend was compiled into the build
    pub fn is_available(self) -> bool {
        match self {
            SolverKind::Microlp => true,
            SolverKind::Cbc => cfg!(feature = "cbc"),
            SolverKind::Highs => cfg!(feature = "highs"),
        }
    }

    /// Hands `model` to the backend and reads the values of `vars` from the optimal solution.
    ///
    /// Values are only read when the solver proves optimality. Infeasible and unbounded models are
    /// reported as [`Error::Infeasible`] and [`Error::Unbounded`].
    pub fn solve<V: ConvertVars>(self, model: Formulation, vars: &V) -> Result<V::Out, Error> {
        match self {
            SolverKind::Microlp => run(model, vars, good_lp::microlp),
            #[cfg(feature = "cbc")]
            SolverKind::Cbc => run(model, vars, good_lp::coin_cbc),
            #[cfg(feature = "highs")]
            SolverKind::Highs => run(model, vars, good_lp::highs),
            #[allow(unreachable_patterns)]
            unavailable => Err(Error::SolverUnavailable(unavailable)),
        }
    }
}

fn run<S, V>(model: Formulation, vars: &V, solver: S) -> Result<V::Out, Error>
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError>,
    V: ConvertVars,
{
    let name = model.name().to_string();
    debug!(
        "{}: solving with {} variables and {} constraints",
        name,
        model.num_vars(),
        model.num_constrs()
    );

    let (variables, objective, constraints) = model.into_parts();
    let mut problem = variables.minimise(objective).using(solver);
    for (_, constraint) in constraints {
        problem = problem.with(constraint);
    }

    let solution = problem.solve().map_err(|err| {
        warn!("{}: no optimal solution: {}", name, err);
        Error::from(err)
    })?;

    info!("{}: solved to optimality", name);
    Ok(vars.convert(&solution))
}
