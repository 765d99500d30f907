use std::process::ExitCode;

use log::{error, info};
use paint_transport::utils::thousands;
use paint_transport::{
    ClosureImpact, Error, HubSelection, HubSelectionSolver, LoadError, ModelConfig, Problem,
    TransportationSolver,
};

/// Environment variable pointing to an alternative network description
const NETWORK_VAR: &str = "PAINT_NETWORK";
/// The hub that can be let out if it is closed, and its weekly rent per 1000 t/week of capacity
const RENTED_HUB: &str = "Birmingham";
const RENT_PER_KILOTON: f64 = 21_000.0;

fn load() -> Result<Problem, LoadError> {
    match std::env::var_os(NETWORK_VAR) {
        Some(path) => Problem::from_path(path),
        None => Problem::paint_network(),
    }
}

/// Prints the solver's verdict before the error is propagated
fn report(label: &str, err: Error) -> Error {
    if let Some(status) = err.status() {
        println!("Status ({}): {}", label, status);
    }
    err
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let problem = load()?;
    let config = ModelConfig::default();
    info!(
        "Loaded network with {} factories, {} hubs and {} sinks",
        problem.factories().len(),
        problem.hubs().len(),
        problem.sinks().len()
    );

    let baseline = TransportationSolver::solve(&problem, &config)
        .map_err(|err| report("all hubs available", err))?;
    println!("Status (all hubs available): {}", baseline.status());
    println!(
        "Minimum transport cost (all hubs available): £{}",
        thousands(baseline.total_cost())
    );
    println!("{}", baseline);

    let keep = problem.hubs().len().saturating_sub(1);
    let selection = HubSelection::at_most(keep);
    let closure = HubSelectionSolver::solve(&problem, &config, &selection)
        .map_err(|err| report("transport cost only", err))?;
    println!("\nStatus (transport cost only): {}", closure.transport().status());
    println!(
        "Minimum transport cost (at most {} hubs open): £{}",
        keep,
        thousands(closure.transport().total_cost())
    );
    println!("{}", closure);
    println!("{}", ClosureImpact::new(&baseline, &closure));

    if problem.hub_index(RENTED_HUB).is_none() {
        info!("No hub named {}, skipping the rental variant", RENTED_HUB);
        return Ok(());
    }

    let selection = selection.with_rental(RENTED_HUB, RENT_PER_KILOTON);
    let rented = HubSelectionSolver::solve(&problem, &config, &selection)
        .map_err(|err| report("with rent", err))?;
    println!("\nStatus (with {} rent): {}", RENTED_HUB, rented.transport().status());
    println!(
        "Minimum net cost (transport - rent): £{}",
        thousands(rented.net_cost())
    );
    println!("{}", rented);
    println!("{}", ClosureImpact::new(&baseline, &rented));

    Ok(())
}

pub fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
