use log::{trace, warn};
use typed_index_collections::TiVec;

use crate::config::ModelConfig;
use crate::problem::{Cost, FactoryIndex, HubIndex, Problem, Quantity, SinkIndex};

/// sets for the transportation model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of factories
    pub F: Vec<FactoryIndex>,
    /// Set of hubs
    pub W: Vec<HubIndex>,
    /// Set of sinks
    pub K: Vec<SinkIndex>,
}

/// parameters for the transportation model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Parameters {
    /// production capacity of factory f
    pub S: TiVec<FactoryIndex, Quantity>,
    /// throughput capacity of hub w
    pub U: TiVec<HubIndex, Quantity>,
    /// demand of sink k
    pub D: TiVec<SinkIndex, Quantity>,
    /// unit cost from factory f to hub w, penalty cost if the route can not be used
    pub C_fw: TiVec<FactoryIndex, TiVec<HubIndex, Cost>>,
    /// unit cost from factory f directly to sink k
    pub C_fk: TiVec<FactoryIndex, TiVec<SinkIndex, Cost>>,
    /// unit cost from hub w to sink k
    pub C_wk: TiVec<HubIndex, TiVec<SinkIndex, Cost>>,
    /// bound on the through-flow of an open hub
    pub M: f64,
}

impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        Sets {
            F: problem.factories().keys().collect(),
            W: problem.hubs().keys().collect(),
            K: problem.sinks().keys().collect(),
        }
    }
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(problem: &Problem, config: &ModelConfig) -> Parameters {
        let penalty = config.penalty_cost;
        if let Some(max) = problem.max_feasible_cost() {
            if penalty <= max {
                warn!(
                    "Penalty cost {} does not exceed the most expensive feasible route ({}), infeasible routes may be used",
                    penalty, max
                );
            }
        }

        let S = problem.factories().iter().map(|n| n.quantity()).collect();
        let U = problem.hubs().iter().map(|n| n.quantity()).collect();
        let D = problem.sinks().iter().map(|n| n.quantity()).collect();

        let C_fw = problem
            .factories()
            .keys()
            .map(|f| {
                problem
                    .hubs()
                    .keys()
                    .map(|w| problem.factory_hub(f, w).or_penalty(penalty))
                    .collect()
            })
            .collect();

        let C_fk = problem
            .factories()
            .keys()
            .map(|f| {
                problem
                    .sinks()
                    .keys()
                    .map(|k| problem.factory_sink(f, k).or_penalty(penalty))
                    .collect()
            })
            .collect();

        let C_wk = problem
            .hubs()
            .keys()
            .map(|w| {
                problem
                    .sinks()
                    .keys()
                    .map(|k| problem.hub_sink(w, k).or_penalty(penalty))
                    .collect()
            })
            .collect();

        let parameters = Parameters {
            S,
            U,
            D,
            C_fw,
            C_fk,
            C_wk,
            M: config.big_m,
        };
        trace!("transportation parameters: {:?}", parameters);
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_routes_get_the_penalty() {
        let problem = Problem::paint_network().unwrap();
        let config = ModelConfig {
            penalty_cost: 999.0,
            ..Default::default()
        };
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &config);

        assert_eq!((sets.F.len(), sets.W.len(), sets.K.len()), (2, 3, 5));

        let bristol = FactoryIndex::from(0);
        let glasgow = problem.hub_index("Glasgow").unwrap();
        let london = problem.hub_index("London").unwrap();
        assert_eq!(parameters.C_fw[bristol][glasgow], 999.0);
        assert_eq!(parameters.C_fw[bristol][london], 25.0);
        assert_eq!(parameters.C_wk[london][SinkIndex::from(2)], 999.0);
        assert_eq!(parameters.U[glasgow], 12_000.0);
        assert_eq!(parameters.S[bristol], 40_000.0);
        assert_eq!(parameters.D[SinkIndex::from(4)], 16_000.0);
        assert_eq!(parameters.M, 1e6);
    }
}
