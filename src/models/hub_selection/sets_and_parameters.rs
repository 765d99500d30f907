use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::models::Error;
use crate::problem::{Cost, HubIndex, Problem, Quantity};

/// Restriction on the number of hubs kept open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenHubLimit {
    AtMost(usize),
    Exactly(usize),
}

/// Income from letting out a hub that is closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalIncome {
    /// The name of the hub
    pub hub: String,
    /// Weekly rent per 1000 tons/week of hub capacity
    pub rate_per_kiloton: Cost,
}

impl RentalIncome {
    /// The weekly income from letting a hub with the given capacity
    pub fn income(&self, capacity: Quantity) -> Cost {
        self.rate_per_kiloton * capacity / 1000.0
    }
}

/// The decisions open to the hub selection model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSelection {
    pub open_hubs: OpenHubLimit,
    /// Hubs that must be closed
    #[serde(default)]
    pub forced_closed: Vec<String>,
    /// Hubs that must stay open
    #[serde(default)]
    pub forced_open: Vec<String>,
    /// Rental income earned by hubs that are closed
    #[serde(default)]
    pub rentals: Vec<RentalIncome>,
}

impl HubSelection {
    pub fn at_most(n: usize) -> Self {
        Self::new(OpenHubLimit::AtMost(n))
    }

    pub fn exactly(n: usize) -> Self {
        Self::new(OpenHubLimit::Exactly(n))
    }

    fn new(open_hubs: OpenHubLimit) -> Self {
        HubSelection {
            open_hubs,
            forced_closed: Vec::new(),
            forced_open: Vec::new(),
            rentals: Vec::new(),
        }
    }

    pub fn force_closed(mut self, hub: impl Into<String>) -> Self {
        self.forced_closed.push(hub.into());
        self
    }

    pub fn force_open(mut self, hub: impl Into<String>) -> Self {
        self.forced_open.push(hub.into());
        self
    }

    pub fn with_rental(mut self, hub: impl Into<String>, rate_per_kiloton: Cost) -> Self {
        self.rentals.push(RentalIncome {
            hub: hub.into(),
            rate_per_kiloton,
        });
        self
    }
}

/// parameters for the hub selection model, on top of the transportation parameters
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct HubParameters {
    /// restriction on the number of open hubs
    pub limit: OpenHubLimit,
    /// hubs whose indicator is fixed to 0
    pub closed: Vec<HubIndex>,
    /// hubs whose indicator is fixed to 1
    pub open: Vec<HubIndex>,
    /// weekly rental income of hub w if it is closed
    pub R: TiVec<HubIndex, Cost>,
}

#[allow(non_snake_case)]
impl HubParameters {
    pub fn new(problem: &Problem, selection: &HubSelection) -> Result<HubParameters, Error> {
        let resolve = |names: &[String]| -> Result<Vec<HubIndex>, Error> {
            names
                .iter()
                .map(|name| {
                    problem
                        .hub_index(name)
                        .ok_or_else(|| Error::UnknownHub(name.clone()))
                })
                .collect()
        };

        let closed = resolve(&selection.forced_closed)?;
        let open = resolve(&selection.forced_open)?;

        let closed_set: HashSet<_> = closed.iter().collect();
        if let Some(w) = open.iter().find(|w| closed_set.contains(w)) {
            return Err(Error::InvalidConfig(format!(
                "hub `{}` is forced both open and closed",
                problem.hubs()[*w].name()
            )));
        }

        let hub_count = problem.hubs().len();
        let forced_open = open.iter().collect::<HashSet<_>>().len();
        let forced_closed = closed_set.len();
        let (fits, bound) = match selection.open_hubs {
            OpenHubLimit::AtMost(n) => (forced_open <= n, format!("at most {}", n)),
            OpenHubLimit::Exactly(n) => (
                forced_open <= n && forced_closed + n <= hub_count,
                format!("exactly {}", n),
            ),
        };
        if !fits {
            return Err(Error::InvalidConfig(format!(
                "{} hubs forced open and {} forced closed out of {} can not leave {} open",
                forced_open, forced_closed, hub_count, bound
            )));
        }

        let mut R: TiVec<HubIndex, Cost> = problem.hubs().iter().map(|_| 0.0).collect();
        let mut rented = HashSet::new();
        for rental in &selection.rentals {
            let w = problem
                .hub_index(&rental.hub)
                .ok_or_else(|| Error::UnknownHub(rental.hub.clone()))?;
            if !rental.rate_per_kiloton.is_finite() || rental.rate_per_kiloton < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "rental rate for `{}` must be finite and non-negative, got {}",
                    rental.hub, rental.rate_per_kiloton
                )));
            }
            if !rented.insert(w) {
                return Err(Error::InvalidConfig(format!(
                    "rental income for `{}` is given more than once",
                    rental.hub
                )));
            }
            R[w] = rental.income(problem.hubs()[w].quantity());
            debug!("Closing {} earns {} per week", rental.hub, R[w]);
        }

        Ok(HubParameters {
            limit: selection.open_hubs,
            closed,
            open,
            R,
        })
    }
}
