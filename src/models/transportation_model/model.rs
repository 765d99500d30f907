use derive_more::Constructor;
use good_lp::{constraint, Expression, Solution, Variable};
use itertools::iproduct;
use log::{debug, info};

use super::sets_and_parameters::{Parameters, Sets};
use crate::config::ModelConfig;
use crate::models::utils::{AddVars, ConvertVars, Formulation};
use crate::models::Error;
use crate::problem::{FactoryIndex, HubIndex, Problem, SinkIndex};
use crate::solution::TransportationResult;

pub struct TransportationSolver {}

impl TransportationSolver {
    /// builds the transportation model
    pub fn build(sets: &Sets, parameters: &Parameters) -> (Formulation, Variables) {
        info!("Building transportation model");

        let mut model = Formulation::new("transportation");
        let vars = Self::add_flows(&mut model, sets, parameters);

        // a hub can not forward more than its capacity
        for &w in &sets.W {
            let outflow = vars.outflow(w);
            model.add_constr(
                &format!("capacity_{}", *w),
                constraint!(outflow <= parameters.U[w]),
            );
        }

        model.set_objective(vars.transport_cost(sets, parameters));

        info!(
            "Successfully built transportation model with {} variables and {} constraints",
            model.num_vars(),
            model.num_constrs()
        );
        (model, vars)
    }

    /// Adds the shipment variables together with the supply, demand and flow balance constraints.
    /// Hub capacities are left to the caller.
    pub(crate) fn add_flows(
        model: &mut Formulation,
        sets: &Sets,
        parameters: &Parameters,
    ) -> Variables {
        let (f, w, k) = (sets.F.len(), sets.W.len(), sets.K.len());

        //*************CREATE VARIABLES*************//

        // quantity shipped from factory f to hub w
        let x_fw = (f, w).cont(model, "x_fw");
        // quantity shipped from factory f directly to sink k
        let x_fk = (f, k).cont(model, "x_fk");
        // quantity shipped from hub w to sink k
        let x_wk = (w, k).cont(model, "x_wk");

        let vars = Variables::new(x_fw, x_fk, x_wk);

        // ******************** ADD CONSTRAINTS ********************

        // a factory can not ship more than it produces
        for &f in &sets.F {
            let lhs = vars.outbound(f);
            model.add_constr(&format!("supply_{}", *f), constraint!(lhs <= parameters.S[f]));
        }

        // every sink receives at least its demand
        for &k in &sets.K {
            let lhs = vars.delivered(k);
            model.add_constr(&format!("demand_{}", *k), constraint!(lhs >= parameters.D[k]));
        }

        // everything that enters a hub leaves it again
        for &w in &sets.W {
            let inflow = vars.inflow(w);
            let outflow = vars.outflow(w);
            model.add_constr(&format!("balance_{}", *w), constraint!(inflow == outflow));
        }

        vars
    }

    /// Finds the cheapest shipment plan for `problem`
    pub fn solve(problem: &Problem, config: &ModelConfig) -> Result<TransportationResult, Error> {
        config.validate()?;

        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, config);
        let (model, vars) = TransportationSolver::build(&sets, &parameters);

        let flows = config.solver.solve(model, &vars)?;
        let result = TransportationResult::new(problem, &parameters, &flows);
        debug!("transportation cost: {}", result.total_cost());

        Ok(result)
    }
}

#[derive(Constructor)]
pub struct Variables {
    /// quantity shipped from factory f to hub w
    pub x_fw: Vec<Vec<Variable>>,
    /// quantity shipped from factory f directly to sink k
    pub x_fk: Vec<Vec<Variable>>,
    /// quantity shipped from hub w to sink k
    pub x_wk: Vec<Vec<Variable>>,
}

impl Variables {
    /// everything leaving factory f
    pub fn outbound(&self, f: FactoryIndex) -> Expression {
        self.x_fw[*f].iter().chain(&self.x_fk[*f]).copied().sum()
    }

    /// everything arriving at sink k
    pub fn delivered(&self, k: SinkIndex) -> Expression {
        let via_hubs = self.x_wk.iter().map(|row| row[*k]);
        let direct = self.x_fk.iter().map(|row| row[*k]);
        via_hubs.chain(direct).sum()
    }

    /// everything arriving at hub w
    pub fn inflow(&self, w: HubIndex) -> Expression {
        self.x_fw.iter().map(|row| row[*w]).sum()
    }

    /// everything leaving hub w
    pub fn outflow(&self, w: HubIndex) -> Expression {
        self.x_wk[*w].iter().copied().sum()
    }

    /// the cost of all shipments, including penalized routes
    pub fn transport_cost(&self, sets: &Sets, parameters: &Parameters) -> Expression {
        let fw = iproduct!(&sets.F, &sets.W)
            .map(|(&f, &w)| parameters.C_fw[f][w] * self.x_fw[*f][*w])
            .sum::<Expression>();
        let fk = iproduct!(&sets.F, &sets.K)
            .map(|(&f, &k)| parameters.C_fk[f][k] * self.x_fk[*f][*k])
            .sum::<Expression>();
        let wk = iproduct!(&sets.W, &sets.K)
            .map(|(&w, &k)| parameters.C_wk[w][k] * self.x_wk[*w][*k])
            .sum::<Expression>();

        fw + fk + wk
    }
}

/// Shipped quantities, indexed like [`Variables`]
#[derive(Debug, Clone)]
pub struct Flows {
    pub x_fw: Vec<Vec<f64>>,
    pub x_fk: Vec<Vec<f64>>,
    pub x_wk: Vec<Vec<f64>>,
}

impl ConvertVars for Variables {
    type Out = Flows;

    fn convert<S: Solution>(&self, solution: &S) -> Self::Out {
        Flows {
            x_fw: self.x_fw.convert(solution),
            x_fk: self.x_fk.convert(solution),
            x_wk: self.x_wk.convert(solution),
        }
    }
}
