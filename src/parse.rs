use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::problem::{
    Cost, Node, NodeType, Problem, ProblemConstructionError, Quantity, Route, RouteCost,
};

/// The paint distribution network: two factories, three warehouses and five wholesalers
const PAINT_NETWORK: &str = include_str!("../data/paint_network.json");

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read network description: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse network description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed network: {0}")]
    Construction(#[from] ProblemConstructionError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSupplyNode {
    pub name: String,
    pub capacity: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDemandNode {
    pub name: String,
    pub demand: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoute {
    pub from: String,
    pub to: String,
    /// Unit cost in £/t, `null` for a route that can not be used
    pub cost: Option<Cost>,
}

/// The JSON description of a network, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNetwork {
    pub factories: Vec<RawSupplyNode>,
    pub hubs: Vec<RawSupplyNode>,
    pub sinks: Vec<RawDemandNode>,
    pub routes: Vec<RawRoute>,
}

impl TryFrom<RawNetwork> for Problem {
    type Error = ProblemConstructionError;

    fn try_from(raw: RawNetwork) -> Result<Self, Self::Error> {
        let factories = raw
            .factories
            .into_iter()
            .map(|n| Node::new(n.name, NodeType::Factory, n.capacity));
        let hubs = raw
            .hubs
            .into_iter()
            .map(|n| Node::new(n.name, NodeType::Hub, n.capacity));
        let sinks = raw
            .sinks
            .into_iter()
            .map(|n| Node::new(n.name, NodeType::Sink, n.demand));

        let routes = raw
            .routes
            .into_iter()
            .map(|r| {
                let cost = r.cost.map_or(RouteCost::Infeasible, RouteCost::Unit);
                Route::new(r.from, r.to, cost)
            })
            .collect();

        Problem::new(factories.chain(hubs).chain(sinks).collect(), routes)
    }
}

impl Problem {
    /// Parses and validates a JSON network description
    pub fn from_json(string: &str) -> Result<Problem, LoadError> {
        let raw: RawNetwork = serde_json::from_str(string)?;
        debug!(
            "Parsed network with {} factories, {} hubs, {} sinks and {} routes",
            raw.factories.len(),
            raw.hubs.len(),
            raw.sinks.len(),
            raw.routes.len()
        );
        Ok(Problem::try_from(raw)?)
    }

    /// Reads a JSON network description from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Problem, LoadError> {
        let path = path.as_ref();
        debug!("Reading network from {}", path.display());
        let string = std::fs::read_to_string(path)?;
        Problem::from_json(&string)
    }

    /// The bundled paint distribution network
    pub fn paint_network() -> Result<Problem, LoadError> {
        Problem::from_json(PAINT_NETWORK)
    }
}
