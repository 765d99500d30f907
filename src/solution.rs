use std::fmt;

use itertools::iproduct;
use log::warn;

use crate::models::transportation_model::model::Flows;
use crate::models::transportation_model::sets_and_parameters::Parameters;
use crate::problem::{
    Cost, FactoryIndex, HubIndex, Problem, Quantity, RouteCost, SinkIndex, Stage,
};
use crate::utils::{signed_pounds, thousands};

/// Quantities at or below this are treated as not shipped when reporting
pub const EPSILON: Quantity = 1e-6;

/// The verdict of the solver on a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
        }
    }
}

/// The quantity shipped along a single route
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub from: String,
    pub to: String,
    pub stage: Stage,
    /// Tons per week
    pub quantity: Quantity,
    /// The cost per ton charged by the model, the penalty cost for infeasible routes
    pub unit_cost: Cost,
    /// Whether the route can actually be used
    pub feasible: bool,
}

impl Shipment {
    pub fn cost(&self) -> Cost {
        self.quantity * self.unit_cost
    }
}

/// The optimal shipment plan of a network
#[derive(Debug, Clone)]
pub struct TransportationResult {
    /// every route of the network, in stage order, including unused ones
    shipments: Vec<Shipment>,
    total_cost: Cost,
}

impl TransportationResult {
    pub fn new(problem: &Problem, parameters: &Parameters, flows: &Flows) -> TransportationResult {
        let factories = problem.factories();
        let hubs = problem.hubs();
        let sinks = problem.sinks();
        let (fs, ws, ks): (Vec<FactoryIndex>, Vec<HubIndex>, Vec<SinkIndex>) =
            (factories.keys().collect(), hubs.keys().collect(), sinks.keys().collect());

        let shipment = |from: &str, to: &str, stage, quantity: f64, unit_cost, cost: RouteCost| {
            Shipment {
                from: from.to_string(),
                to: to.to_string(),
                stage,
                // solvers may report tiny negative values for variables at their bound
                quantity: quantity.max(0.0),
                unit_cost,
                feasible: cost.is_feasible(),
            }
        };

        let fw = iproduct!(&fs, &ws).map(|(&f, &w)| {
            shipment(
                factories[f].name(),
                hubs[w].name(),
                Stage::FactoryToHub,
                flows.x_fw[*f][*w],
                parameters.C_fw[f][w],
                problem.factory_hub(f, w),
            )
        });
        let fk = iproduct!(&fs, &ks).map(|(&f, &k)| {
            shipment(
                factories[f].name(),
                sinks[k].name(),
                Stage::FactoryToSink,
                flows.x_fk[*f][*k],
                parameters.C_fk[f][k],
                problem.factory_sink(f, k),
            )
        });
        let wk = iproduct!(&ws, &ks).map(|(&w, &k)| {
            shipment(
                hubs[w].name(),
                sinks[k].name(),
                Stage::HubToSink,
                flows.x_wk[*w][*k],
                parameters.C_wk[w][k],
                problem.hub_sink(w, k),
            )
        });

        let shipments: Vec<Shipment> = fw.chain(fk).chain(wk).collect();
        let total_cost = shipments.iter().map(Shipment::cost).sum();

        let result = TransportationResult {
            shipments,
            total_cost,
        };
        for s in result.infeasible_shipments() {
            warn!(
                "{} t shipped on unusable route {} -> {}, charged at the penalty cost {}",
                s.quantity, s.from, s.to, s.unit_cost
            );
        }
        result
    }

    /// Values are only ever read from optimal solutions
    pub fn status(&self) -> SolutionStatus {
        SolutionStatus::Optimal
    }

    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    /// The shipments that actually carry something
    pub fn active(&self) -> impl Iterator<Item = &Shipment> {
        self.shipments.iter().filter(|s| s.quantity > EPSILON)
    }

    /// Active shipments on routes that can not be used. The penalty cost was not high enough to keep
    /// them empty, so the plan is not a valid one.
    pub fn infeasible_shipments(&self) -> impl Iterator<Item = &Shipment> {
        self.active().filter(|s| !s.feasible)
    }

    pub fn uses_infeasible_routes(&self) -> bool {
        self.infeasible_shipments().next().is_some()
    }

    /// The total weekly transport cost
    pub fn total_cost(&self) -> Cost {
        self.total_cost
    }

    /// The quantity shipped from `from` to `to`, if there is such a route
    pub fn quantity(&self, from: &str, to: &str) -> Option<Quantity> {
        self.shipments
            .iter()
            .find(|s| s.from == from && s.to == to)
            .map(|s| s.quantity)
    }

    /// Everything leaving the node `name`
    pub fn shipped_from(&self, name: &str) -> Quantity {
        self.shipments
            .iter()
            .filter(|s| s.from == name)
            .map(|s| s.quantity)
            .sum()
    }

    /// Everything arriving at the node `name`
    pub fn shipped_to(&self, name: &str) -> Quantity {
        self.shipments
            .iter()
            .filter(|s| s.to == name)
            .map(|s| s.quantity)
            .sum()
    }
}

impl fmt::Display for TransportationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in [Stage::FactoryToHub, Stage::FactoryToSink, Stage::HubToSink] {
            writeln!(f, "\n{}", stage)?;
            for s in self.active().filter(|s| s.stage == stage) {
                write!(
                    f,
                    "{} → {}: {} t @ £{}/t",
                    s.from,
                    s.to,
                    thousands(s.quantity),
                    s.unit_cost
                )?;
                if !s.feasible {
                    write!(f, " [UNUSABLE ROUTE, penalty cost]")?;
                }
                writeln!(f)?;
            }
        }
        if self.uses_infeasible_routes() {
            writeln!(
                f,
                "\nWARNING: {} shipment(s) use unusable routes, the plan can not be carried out",
                self.infeasible_shipments().count()
            )?;
        }
        write!(f, "\nTotal transport cost: £{}", thousands(self.total_cost))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HubState {
    pub name: String,
    pub open: bool,
    /// Tons per week forwarded by the hub
    pub throughput: Quantity,
}

/// The optimal shipment plan when hubs may be closed
#[derive(Debug, Clone)]
pub struct HubSelectionResult {
    transport: TransportationResult,
    hubs: Vec<HubState>,
    /// rent earned by the closed hubs
    rental_income: Cost,
}

impl HubSelectionResult {
    pub fn new(
        transport: TransportationResult,
        hubs: Vec<HubState>,
        rental_income: Cost,
    ) -> HubSelectionResult {
        HubSelectionResult {
            transport,
            hubs,
            rental_income,
        }
    }

    pub fn transport(&self) -> &TransportationResult {
        &self.transport
    }

    pub fn hubs(&self) -> &[HubState] {
        &self.hubs
    }

    pub fn open_hubs(&self) -> impl Iterator<Item = &str> {
        self.hubs
            .iter()
            .filter(|h| h.open)
            .map(|h| h.name.as_str())
    }

    pub fn closed_hubs(&self) -> impl Iterator<Item = &str> {
        self.hubs
            .iter()
            .filter(|h| !h.open)
            .map(|h| h.name.as_str())
    }

    pub fn rental_income(&self) -> Cost {
        self.rental_income
    }

    /// Transport cost minus rental income, the value the solver minimised
    pub fn net_cost(&self) -> Cost {
        self.transport.total_cost() - self.rental_income
    }
}

impl fmt::Display for HubSelectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open: Vec<&str> = self.open_hubs().collect();
        writeln!(f, "Hubs kept open: {}", open.join(", "))?;
        write!(f, "{}", self.transport)?;
        if self.rental_income > 0.0 {
            write!(
                f,
                "\nRental income: £{}\nNet cost (transport - rent): £{}",
                thousands(self.rental_income),
                thousands(self.net_cost())
            )?;
        }
        Ok(())
    }
}

/// The economic effect of closing hubs, measured against the plan with every hub available
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureImpact {
    pub baseline_cost: Cost,
    pub transport_cost: Cost,
    pub rental_income: Cost,
}

impl ClosureImpact {
    pub fn new(baseline: &TransportationResult, selection: &HubSelectionResult) -> ClosureImpact {
        ClosureImpact {
            baseline_cost: baseline.total_cost(),
            transport_cost: selection.transport().total_cost(),
            rental_income: selection.rental_income(),
        }
    }

    /// Extra weekly transport cost caused by the closures
    pub fn transport_increase(&self) -> Cost {
        self.transport_cost - self.baseline_cost
    }

    /// Extra weekly cost after rental income; negative when closing pays off
    pub fn net_impact(&self) -> Cost {
        self.transport_increase() - self.rental_income
    }
}

impl fmt::Display for ClosureImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Baseline: £{}, with closures: £{} ({} transport), net change after rent: {}",
            thousands(self.baseline_cost),
            thousands(self.transport_cost),
            signed_pounds(self.transport_increase()),
            signed_pounds(self.net_impact())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::models::TransportationSolver;
    use crate::problem::{Node, NodeType, Route};

    fn baseline() -> TransportationResult {
        let problem = Problem::paint_network().unwrap();
        TransportationSolver::solve(&problem, &ModelConfig::default()).unwrap()
    }

    #[test]
    fn total_cost_is_sum_of_shipments() {
        let result = baseline();
        let sum: Cost = result.active().map(Shipment::cost).sum();
        assert!((result.total_cost() - sum).abs() < 1e-6);
        assert_eq!(result.shipments().len(), 31);
        assert_eq!(result.status(), SolutionStatus::Optimal);
    }

    #[test]
    fn looks_up_routes_by_name() {
        let result = baseline();
        assert!(result.quantity("Bristol", "London").is_some());
        assert_eq!(result.quantity("London", "Bristol"), None);
        assert!((result.shipped_to("Wholesaler 5") - 16_000.0).abs() < 1e-3);
    }

    #[test]
    fn prints_flows_like_a_report() {
        let report = baseline().to_string();
        assert!(report.contains("Factory -> Hub"));
        assert!(report.contains("Hub -> Sink"));
        assert!(report.contains("t @ £"));
        assert!(report.ends_with("Total transport cost: £4,937,000"));
        assert!(!report.contains("UNUSABLE"));
    }

    #[test]
    fn closure_impact_accounts_for_rent() {
        let selection = HubSelectionResult::new(
            baseline(),
            vec![HubState {
                name: "Birmingham".into(),
                open: false,
                throughput: 0.0,
            }],
            1_000.0,
        );
        let impact = ClosureImpact {
            baseline_cost: 100.0,
            transport_cost: 600.0,
            rental_income: selection.rental_income(),
        };
        assert_eq!(impact.transport_increase(), 500.0);
        assert_eq!(impact.net_impact(), -500.0);
        assert_eq!(selection.closed_hubs().collect::<Vec<_>>(), vec!["Birmingham"]);
        assert_eq!(selection.open_hubs().count(), 0);
        assert!((selection.net_cost() - (4_937_000.0 - 1_000.0)).abs() < 1.0);
        assert!(selection.to_string().contains("Rental income: £1,000"));
    }

    #[test]
    fn closure_impact_shows_signed_changes() {
        let impact = ClosureImpact {
            baseline_cost: 4_937_000.0,
            transport_cost: 5_240_000.0,
            rental_income: 315_000.0,
        };
        assert_eq!(
            impact.to_string(),
            "Baseline: £4,937,000, with closures: £5,240,000 (+£303,000 transport), \
             net change after rent: -£12,000"
        );
    }

    #[test]
    fn flags_shipments_on_unusable_routes() {
        let nodes = vec![
            Node::new("F", NodeType::Factory, 10.0),
            Node::new("W", NodeType::Hub, 10.0),
            Node::new("K", NodeType::Sink, 5.0),
        ];
        let routes = vec![
            Route::new("F", "W", RouteCost::Infeasible),
            Route::new("F", "K", RouteCost::Infeasible),
            Route::new("W", "K", RouteCost::Unit(1.0)),
        ];
        let problem = Problem::new(nodes, routes).unwrap();
        let result = TransportationSolver::solve(&problem, &ModelConfig::default()).unwrap();

        assert!(result.uses_infeasible_routes());
        let flagged: Vec<(&str, &str)> = result
            .infeasible_shipments()
            .map(|s| (s.from.as_str(), s.to.as_str()))
            .collect();
        assert_eq!(flagged, vec![("F", "K")]);
        assert!((result.total_cost() - 2_500.0).abs() < 1e-6);

        let report = result.to_string();
        assert!(report.contains("F → K: 5 t @ £500/t [UNUSABLE ROUTE, penalty cost]"));
        assert!(report.contains("WARNING: 1 shipment(s) use unusable routes"));
    }

    #[test]
    fn paint_plan_uses_only_usable_routes() {
        assert!(!baseline().uses_infeasible_routes());
    }
}
