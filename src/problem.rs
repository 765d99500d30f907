use std::collections::HashMap;
use std::fmt;

use derive_more::{Deref, From, Into};
use float_ord::FloatOrd;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_index_collections::{TiSlice, TiVec};

/// The type used for shipped quantities and node capacities/demands, in tons per week
pub type Quantity = f64;
/// The type used for cost, in pounds
pub type Cost = f64;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct FactoryIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct HubIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct SinkIndex(usize);

/// The role a node plays in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A source with a weekly production capacity
    Factory,
    /// An intermediate transfer point (warehouse) with a weekly throughput capacity
    Hub,
    /// A demand point (wholesaler) with a weekly demand
    Sink,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Factory => write!(f, "factory"),
            NodeType::Hub => write!(f, "hub"),
            NodeType::Sink => write!(f, "sink"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The name of the node, unique within a network
    name: String,
    /// The type of node
    kind: NodeType,
    /// Capacity for factories and hubs, demand for sinks
    quantity: Quantity,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeType, quantity: Quantity) -> Node {
        Node {
            name: name.into(),
            kind,
            quantity,
        }
    }

    /// The name of the node
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
    /// The type of node
    pub fn r#type(&self) -> NodeType {
        self.kind
    }
    /// Capacity for factories and hubs, demand for sinks
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }
}

/// The unit cost of shipping along a route
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteCost {
    /// The route can be used at the given cost per ton
    Unit(Cost),
    /// The route can not be used. It is still part of the model, at a penalty cost.
    Infeasible,
}

impl RouteCost {
    /// The cost per ton, where infeasible routes are charged `penalty`
    pub fn or_penalty(self, penalty: Cost) -> Cost {
        match self {
            RouteCost::Unit(cost) => cost,
            RouteCost::Infeasible => penalty,
        }
    }

    pub fn is_feasible(self) -> bool {
        matches!(self, RouteCost::Unit(_))
    }
}

/// A directed route between two named nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub from: String,
    pub to: String,
    pub cost: RouteCost,
}

impl Route {
    pub fn new(from: impl Into<String>, to: impl Into<String>, cost: RouteCost) -> Route {
        Route {
            from: from.into(),
            to: to.into(),
            cost,
        }
    }
}

/// The shipment stages of the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    FactoryToHub,
    FactoryToSink,
    HubToSink,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FactoryToHub => write!(f, "Factory -> Hub"),
            Stage::FactoryToSink => write!(f, "Factory -> Sink (direct)"),
            Stage::HubToSink => write!(f, "Hub -> Sink"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Problem {
    /// The factories of the network, ordered by index
    factories: TiVec<FactoryIndex, Node>,
    /// The hubs of the network, ordered by index
    hubs: TiVec<HubIndex, Node>,
    /// The sinks of the network, ordered by index
    sinks: TiVec<SinkIndex, Node>,
    /// Unit cost from every factory to every hub
    factory_hub: TiVec<FactoryIndex, TiVec<HubIndex, RouteCost>>,
    /// Unit cost from every factory directly to every sink
    factory_sink: TiVec<FactoryIndex, TiVec<SinkIndex, RouteCost>>,
    /// Unit cost from every hub to every sink
    hub_sink: TiVec<HubIndex, TiVec<SinkIndex, RouteCost>>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProblemConstructionError {
    /// There must be at least one node of every type
    #[error("the network has no {0} nodes")]
    NoNodes(NodeType),
    /// Node names identify nodes in routes and must be unique
    #[error("the node name `{0}` is used more than once")]
    DuplicateName(String),
    /// Capacities and demands must be finite and non-negative
    #[error("node `{name}` has invalid quantity {quantity}")]
    InvalidQuantity { name: String, quantity: Quantity },
    /// A route refers to a node that does not exist
    #[error("route {from} -> {to} refers to the unknown node `{node}`")]
    UnknownNode {
        from: String,
        to: String,
        node: String,
    },
    /// Routes must go factory -> hub, factory -> sink or hub -> sink
    #[error("route {from} -> {to} does not connect two consecutive stages")]
    InvalidStage { from: String, to: String },
    /// The same route is given twice
    #[error("route {from} -> {to} is given more than once")]
    DuplicateRoute { from: String, to: String },
    /// Every stage must be a full cross product. Infeasible routes must be given explicitly.
    #[error("no cost is given for route {from} -> {to}")]
    MissingRoute { from: String, to: String },
    /// Unit costs must be finite and non-negative
    #[error("route {from} -> {to} has invalid cost {cost}")]
    InvalidCost {
        from: String,
        to: String,
        cost: Cost,
    },
}

#[derive(Debug, Clone, Copy)]
enum Location {
    Factory(FactoryIndex),
    Hub(HubIndex),
    Sink(SinkIndex),
}

type CostMatrix = Vec<Vec<Option<RouteCost>>>;

impl Problem {
    /// Validates and assembles a network from its nodes and routes.
    ///
    /// The routes of every stage must cover the full cross product of the two node sets involved.
    pub fn new(nodes: Vec<Node>, routes: Vec<Route>) -> Result<Problem, ProblemConstructionError> {
        let mut factories = Vec::new();
        let mut hubs = Vec::new();
        let mut sinks = Vec::new();
        let mut locations: HashMap<String, Location> = HashMap::new();

        for node in nodes {
            if !node.quantity.is_finite() || node.quantity < 0.0 {
                return Err(ProblemConstructionError::InvalidQuantity {
                    name: node.name,
                    quantity: node.quantity,
                });
            }
            if locations.contains_key(&node.name) {
                return Err(ProblemConstructionError::DuplicateName(node.name));
            }

            let location = match node.kind {
                NodeType::Factory => Location::Factory(FactoryIndex(factories.len())),
                NodeType::Hub => Location::Hub(HubIndex(hubs.len())),
                NodeType::Sink => Location::Sink(SinkIndex(sinks.len())),
            };
            locations.insert(node.name.clone(), location);

            match node.kind {
                NodeType::Factory => factories.push(node),
                NodeType::Hub => hubs.push(node),
                NodeType::Sink => sinks.push(node),
            }
        }

        for (kind, set) in [
            (NodeType::Factory, &factories),
            (NodeType::Hub, &hubs),
            (NodeType::Sink, &sinks),
        ] {
            if set.is_empty() {
                return Err(ProblemConstructionError::NoNodes(kind));
            }
        }

        let mut factory_hub: CostMatrix = vec![vec![None; hubs.len()]; factories.len()];
        let mut factory_sink: CostMatrix = vec![vec![None; sinks.len()]; factories.len()];
        let mut hub_sink: CostMatrix = vec![vec![None; sinks.len()]; hubs.len()];

        for route in routes {
            let locate = |node: &str| {
                locations
                    .get(node)
                    .copied()
                    .ok_or_else(|| ProblemConstructionError::UnknownNode {
                        from: route.from.clone(),
                        to: route.to.clone(),
                        node: node.to_string(),
                    })
            };
            let origin = locate(&route.from)?;
            let destination = locate(&route.to)?;

            if let RouteCost::Unit(cost) = route.cost {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(ProblemConstructionError::InvalidCost {
                        from: route.from,
                        to: route.to,
                        cost,
                    });
                }
            }

            let slot = match (origin, destination) {
                (Location::Factory(f), Location::Hub(w)) => &mut factory_hub[*f][*w],
                (Location::Factory(f), Location::Sink(k)) => &mut factory_sink[*f][*k],
                (Location::Hub(w), Location::Sink(k)) => &mut hub_sink[*w][*k],
                _ => {
                    return Err(ProblemConstructionError::InvalidStage {
                        from: route.from,
                        to: route.to,
                    })
                }
            };

            if slot.is_some() {
                return Err(ProblemConstructionError::DuplicateRoute {
                    from: route.from,
                    to: route.to,
                });
            }
            *slot = Some(route.cost);
        }

        Ok(Problem {
            factory_hub: Self::complete(factory_hub, &factories, &hubs)?,
            factory_sink: Self::complete(factory_sink, &factories, &sinks)?,
            hub_sink: Self::complete(hub_sink, &hubs, &sinks)?,
            factories: factories.into(),
            hubs: hubs.into(),
            sinks: sinks.into(),
        })
    }

    /// Checks that every route of a stage has a cost
    fn complete<R, C>(
        matrix: CostMatrix,
        origins: &[Node],
        destinations: &[Node],
    ) -> Result<TiVec<R, TiVec<C, RouteCost>>, ProblemConstructionError> {
        matrix
            .into_iter()
            .zip(origins)
            .map(|(row, origin)| {
                row.into_iter()
                    .zip(destinations)
                    .map(|(cost, destination)| {
                        cost.ok_or_else(|| ProblemConstructionError::MissingRoute {
                            from: origin.name.clone(),
                            to: destination.name.clone(),
                        })
                    })
                    .collect::<Result<TiVec<C, RouteCost>, _>>()
            })
            .collect()
    }

    /// The factories of the network
    pub fn factories(&self) -> &TiSlice<FactoryIndex, Node> {
        &self.factories
    }

    /// The hubs of the network
    pub fn hubs(&self) -> &TiSlice<HubIndex, Node> {
        &self.hubs
    }

    /// The sinks of the network
    pub fn sinks(&self) -> &TiSlice<SinkIndex, Node> {
        &self.sinks
    }

    pub fn factory_hub(&self, factory: FactoryIndex, hub: HubIndex) -> RouteCost {
        self.factory_hub[factory][hub]
    }

    pub fn factory_sink(&self, factory: FactoryIndex, sink: SinkIndex) -> RouteCost {
        self.factory_sink[factory][sink]
    }

    pub fn hub_sink(&self, hub: HubIndex, sink: SinkIndex) -> RouteCost {
        self.hub_sink[hub][sink]
    }

    /// Looks up a hub by name
    pub fn hub_index(&self, name: &str) -> Option<HubIndex> {
        self.hubs
            .iter_enumerated()
            .find(|(_, hub)| hub.name() == name)
            .map(|(w, _)| w)
    }

    /// The total production capacity of all factories
    pub fn total_supply(&self) -> Quantity {
        self.factories.iter().map(Node::quantity).sum()
    }

    /// The total demand of all sinks
    pub fn total_demand(&self) -> Quantity {
        self.sinks.iter().map(Node::quantity).sum()
    }

    /// All route costs of the network, in stage order
    pub fn route_costs(&self) -> impl Iterator<Item = RouteCost> + '_ {
        let fw = self.factory_hub.iter().flat_map(|row| row.iter().copied());
        let fk = self.factory_sink.iter().flat_map(|row| row.iter().copied());
        let wk = self.hub_sink.iter().flat_map(|row| row.iter().copied());
        fw.chain(fk).chain(wk)
    }

    /// The most expensive route that is actually usable, if any
    pub fn max_feasible_cost(&self) -> Option<Cost> {
        self.route_costs()
            .filter_map(|cost| match cost {
                RouteCost::Unit(cost) => Some(FloatOrd(cost)),
                RouteCost::Infeasible => None,
            })
            .max()
            .map(|cost| cost.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes() -> Vec<Node> {
        vec![
            Node::new("F", NodeType::Factory, 10.0),
            Node::new("W", NodeType::Hub, 5.0),
            Node::new("K", NodeType::Sink, 8.0),
        ]
    }

    fn routes() -> Vec<Route> {
        vec![
            Route::new("F", "W", RouteCost::Unit(1.0)),
            Route::new("F", "K", RouteCost::Infeasible),
            Route::new("W", "K", RouteCost::Unit(2.0)),
        ]
    }

    #[test]
    fn builds_full_cross_product() {
        let problem = Problem::new(nodes(), routes()).unwrap();
        let (f, w, k) = (FactoryIndex(0), HubIndex(0), SinkIndex(0));

        assert_eq!(problem.factories().len(), 1);
        assert_eq!(problem.factory_hub(f, w), RouteCost::Unit(1.0));
        assert_eq!(problem.factory_sink(f, k), RouteCost::Infeasible);
        assert_eq!(problem.hub_sink(w, k), RouteCost::Unit(2.0));
        assert_eq!(problem.hub_index("W"), Some(w));
        assert_eq!(problem.hub_index("K"), None);
        assert_eq!(problem.max_feasible_cost(), Some(2.0));
        assert_eq!(problem.total_supply(), 10.0);
        assert_eq!(problem.total_demand(), 8.0);
    }

    #[test]
    fn missing_route_fails_fast() {
        let mut routes = routes();
        routes.pop();
        assert_eq!(
            Problem::new(nodes(), routes).unwrap_err(),
            ProblemConstructionError::MissingRoute {
                from: "W".into(),
                to: "K".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_routes() {
        let mut duplicate = routes();
        duplicate.push(Route::new("F", "W", RouteCost::Unit(3.0)));
        assert!(matches!(
            Problem::new(nodes(), duplicate),
            Err(ProblemConstructionError::DuplicateRoute { .. })
        ));

        let mut backwards = routes();
        backwards.push(Route::new("K", "F", RouteCost::Unit(3.0)));
        assert!(matches!(
            Problem::new(nodes(), backwards),
            Err(ProblemConstructionError::InvalidStage { .. })
        ));

        let mut unknown = routes();
        unknown.push(Route::new("F", "Nowhere", RouteCost::Unit(3.0)));
        assert!(matches!(
            Problem::new(nodes(), unknown),
            Err(ProblemConstructionError::UnknownNode { node, .. }) if node == "Nowhere"
        ));

        let mut negative = routes();
        negative[0].cost = RouteCost::Unit(-1.0);
        assert!(matches!(
            Problem::new(nodes(), negative),
            Err(ProblemConstructionError::InvalidCost { .. })
        ));
    }

    #[test]
    fn rejects_malformed_nodes() {
        let mut nodes_ = nodes();
        nodes_.push(Node::new("W", NodeType::Hub, 1.0));
        assert_eq!(
            Problem::new(nodes_, routes()).unwrap_err(),
            ProblemConstructionError::DuplicateName("W".into())
        );

        let mut nodes_ = nodes();
        nodes_[2] = Node::new("K", NodeType::Sink, f64::NAN);
        assert!(matches!(
            Problem::new(nodes_, routes()),
            Err(ProblemConstructionError::InvalidQuantity { .. })
        ));

        let nodes_ = nodes().into_iter().filter(|n| n.r#type() != NodeType::Hub).collect();
        assert_eq!(
            Problem::new(nodes_, vec![]).unwrap_err(),
            ProblemConstructionError::NoNodes(NodeType::Hub)
        );
    }
}
