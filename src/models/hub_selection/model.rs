use good_lp::{constraint, Expression, Solution, Variable};
use log::{debug, info};

use super::sets_and_parameters::{HubParameters, HubSelection, OpenHubLimit};
use crate::config::ModelConfig;
use crate::models::transportation_model::model::{self as transportation, Flows};
use crate::models::transportation_model::sets_and_parameters::{Parameters, Sets};
use crate::models::utils::{AddVars, ConvertVars, Formulation};
use crate::models::{Error, TransportationSolver};
use crate::problem::Problem;
use crate::solution::{HubSelectionResult, HubState, TransportationResult};

pub struct HubSelectionSolver {}

impl HubSelectionSolver {
    /// builds the transportation model extended with open/close decisions for the hubs
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hubs: &HubParameters,
    ) -> (Formulation, Variables) {
        info!("Building hub selection model");

        let mut model = Formulation::new("hub_selection");
        let flows = TransportationSolver::add_flows(&mut model, sets, parameters);

        // 1 if hub w is kept open, 0 otherwise
        let y = sets.W.len().binary(&mut model, "y");

        // a closed hub can not forward anything, an open one at most its capacity
        for &w in &sets.W {
            let outflow = flows.outflow(w);
            model.add_constr(
                &format!("capacity_{}", *w),
                constraint!(outflow <= parameters.U[w] * y[*w]),
            );
            let outflow = flows.outflow(w);
            model.add_constr(
                &format!("bigM_{}", *w),
                constraint!(outflow <= parameters.M * y[*w]),
            );
        }

        let open: Expression = y.iter().copied().sum();
        match hubs.limit {
            OpenHubLimit::AtMost(n) => {
                let n = n as f64;
                model.add_constr("open_hubs", constraint!(open <= n));
            }
            OpenHubLimit::Exactly(n) => {
                let n = n as f64;
                model.add_constr("open_hubs", constraint!(open == n));
            }
        }

        for &w in &hubs.closed {
            let y_w = y[*w];
            model.add_constr(&format!("closed_{}", *w), constraint!(y_w == 0.0));
        }
        for &w in &hubs.open {
            let y_w = y[*w];
            model.add_constr(&format!("open_{}", *w), constraint!(y_w == 1.0));
        }

        // transport cost minus the rent earned by closed hubs: sum_w R_w * (1 - y_w)
        let rent_total: f64 = sets.W.iter().map(|&w| hubs.R[w]).sum();
        let rent_kept: Expression = sets.W.iter().map(|&w| hubs.R[w] * y[*w]).sum();
        let objective = flows.transport_cost(sets, parameters) - rent_total + rent_kept;
        model.set_objective(objective);

        info!(
            "Successfully built hub selection model with {} variables and {} constraints",
            model.num_vars(),
            model.num_constrs()
        );
        (model, Variables { flows, y })
    }

    /// Finds the cheapest shipment plan when only some hubs may be kept open
    pub fn solve(
        problem: &Problem,
        config: &ModelConfig,
        selection: &HubSelection,
    ) -> Result<HubSelectionResult, Error> {
        config.validate()?;

        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, config);
        let hubs = HubParameters::new(problem, selection)?;
        let (model, vars) = HubSelectionSolver::build(&sets, &parameters, &hubs);

        let (flows, y) = config.solver.solve(model, &vars)?;
        let transport = TransportationResult::new(problem, &parameters, &flows);

        let states: Vec<HubState> = problem
            .hubs()
            .iter_enumerated()
            .map(|(w, hub)| HubState {
                name: hub.name().to_string(),
                open: y[*w] > 0.5,
                throughput: transport.shipped_from(hub.name()),
            })
            .collect();

        let rental_income = sets
            .W
            .iter()
            .zip(&states)
            .filter(|(_, state)| !state.open)
            .map(|(&w, _)| hubs.R[w])
            .sum();

        let result = HubSelectionResult::new(transport, states, rental_income);
        debug!(
            "hub selection: open = {:?}, net cost = {}",
            result.open_hubs().collect::<Vec<_>>(),
            result.net_cost()
        );
        Ok(result)
    }
}

pub struct Variables {
    /// shipment variables, as in the transportation model
    pub flows: transportation::Variables,
    /// 1 if hub w is kept open
    pub y: Vec<Variable>,
}

impl ConvertVars for Variables {
    type Out = (Flows, Vec<f64>);

    fn convert<S: Solution>(&self, solution: &S) -> Self::Out {
        (self.flows.convert(solution), self.y.convert(solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Node, NodeType, Route, RouteCost};
    use crate::solution::ClosureImpact;
    use rstest::rstest;

    const BASELINE: f64 = 4_937_000.0;

    fn paint() -> Problem {
        Problem::paint_network().unwrap()
    }

    fn solve(selection: &HubSelection) -> Result<HubSelectionResult, Error> {
        HubSelectionSolver::solve(&paint(), &ModelConfig::default(), selection)
    }

    #[test]
    fn model_adds_indicators_and_coupling() {
        let problem = paint();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &ModelConfig::default());
        let selection = HubSelection::at_most(2).force_closed("Glasgow");
        let hubs = HubParameters::new(&problem, &selection).unwrap();
        let (model, vars) = HubSelectionSolver::build(&sets, &parameters, &hubs);

        assert_eq!(vars.y.len(), 3);
        assert_eq!(model.num_vars(), 2 * 3 + 2 * 5 + 3 * 5 + 3);
        // supply + demand + balance + capacity + big-M + cardinality + forced closure
        assert_eq!(model.num_constrs(), 2 + 5 + 3 + 3 + 3 + 1 + 1);
        assert!(model.constraint_names().any(|name| name == "bigM_0"));
        assert!(model.constraint_names().any(|name| name == "closed_2"));
    }

    #[rstest]
    #[case(HubSelection::at_most(2))]
    #[case(HubSelection::exactly(2))]
    fn two_hubs_close_glasgow(#[case] selection: HubSelection) {
        let result = solve(&selection).unwrap();

        assert_eq!(
            result.open_hubs().collect::<Vec<_>>(),
            vec!["London", "Birmingham"]
        );
        assert!((result.transport().total_cost() - 5_191_000.0).abs() < 1.0);
        assert_eq!(result.rental_income(), 0.0);
        assert!(result.transport().total_cost() >= BASELINE);
    }

    #[test]
    fn forcing_glasgow_closed_costs_more() {
        let result = solve(&HubSelection::at_most(3).force_closed("Glasgow")).unwrap();

        assert_eq!(result.closed_hubs().collect::<Vec<_>>(), vec!["Glasgow"]);
        assert!(result.transport().total_cost() > BASELINE + 1.0);
        assert!((result.transport().total_cost() - 5_191_000.0).abs() < 1.0);

        let glasgow = result.hubs().iter().find(|h| h.name == "Glasgow").unwrap();
        assert!(glasgow.throughput < 1e-3);
        assert!(result.transport().shipped_to("Glasgow") < 1e-3);
    }

    #[test]
    fn unrestricted_selection_matches_baseline() {
        let result = solve(&HubSelection::at_most(3)).unwrap();
        assert!((result.transport().total_cost() - BASELINE).abs() < 1.0);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn open_hubs_never_exceed_the_cap(#[case] cap: usize) {
        let result = solve(&HubSelection::at_most(cap)).unwrap();
        assert!(result.open_hubs().count() <= cap);
        assert!(result.transport().total_cost() >= BASELINE - 1.0);
        for hub in result.hubs().iter().filter(|h| !h.open) {
            assert!(hub.throughput < 1e-3, "{} is closed but used", hub.name);
        }
        for hub in result.hubs() {
            let inflow = result.transport().shipped_to(&hub.name);
            assert!(
                (inflow - hub.throughput).abs() < 1e-3,
                "{} receives {} but forwards {}",
                hub.name,
                inflow,
                hub.throughput
            );
        }
    }

    #[test]
    fn birmingham_rent_outweighs_transport() {
        let selection = HubSelection::at_most(2).with_rental("Birmingham", 21_000.0);
        let result = solve(&selection).unwrap();

        assert_eq!(result.closed_hubs().collect::<Vec<_>>(), vec!["Birmingham"]);
        assert!((result.transport().total_cost() - 5_240_000.0).abs() < 1.0);
        assert!((result.rental_income() - 315_000.0).abs() < 1e-6);
        assert!((result.net_cost() - 4_925_000.0).abs() < 1.0);

        let baseline = TransportationSolver::solve(&paint(), &ModelConfig::default()).unwrap();
        let impact = ClosureImpact::new(&baseline, &result);
        assert!((impact.transport_increase() - 303_000.0).abs() < 1.0);
        assert!((impact.net_impact() + 12_000.0).abs() < 1.0);
    }

    #[test]
    fn forcing_a_hub_open_is_respected() {
        let result = solve(&HubSelection::exactly(1).force_open("Glasgow")).unwrap();
        assert_eq!(result.open_hubs().collect::<Vec<_>>(), vec!["Glasgow"]);
    }

    #[test]
    fn impossible_cardinality_is_rejected() {
        let err = solve(&HubSelection::exactly(4)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn insufficient_supply_is_infeasible() {
        let nodes = vec![
            Node::new("F", NodeType::Factory, 10.0),
            Node::new("W", NodeType::Hub, 100.0),
            Node::new("K", NodeType::Sink, 25.0),
        ];
        let routes = vec![
            Route::new("F", "W", RouteCost::Unit(1.0)),
            Route::new("F", "K", RouteCost::Unit(5.0)),
            Route::new("W", "K", RouteCost::Unit(1.0)),
        ];
        let problem = Problem::new(nodes, routes).unwrap();

        let selection = HubSelection::at_most(1);
        let err = HubSelectionSolver::solve(&problem, &ModelConfig::default(), &selection)
            .unwrap_err();
        assert!(matches!(err, Error::Infeasible));
    }

    #[test]
    fn too_many_forced_hubs_fail_before_solving() {
        let selection = HubSelection::at_most(1)
            .force_open("London")
            .force_open("Glasgow");
        assert!(matches!(solve(&selection), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn unknown_hub_fails_before_solving() {
        assert!(matches!(
            solve(&HubSelection::at_most(2).force_closed("Cardiff")),
            Err(Error::UnknownHub(_))
        ));
    }
}
