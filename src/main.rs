//! Command line entry point: solve a CVRPTW instance given as node and link csv files.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use cvrptw_milp::config::Config;
use cvrptw_milp::output::{format_duration, print_routes, save_arcs, save_summary};
use cvrptw_milp::problem::Problem;
use cvrptw_milp::CvrptwSolver;

#[derive(Debug, Parser)]
#[command(name = "cvrptw", version, about = "Solve a CVRPTW instance to optimality as a MILP")]
struct Args {
    /// Node csv: id,demand,start_time,end_time,service_time (first row is the depot)
    #[arg(long)]
    nodes: PathBuf,

    /// Link csv: from_node_id,to_node_id,travel_time,link_cost
    #[arg(long)]
    links: PathBuf,

    /// Result csv: from_node_id,to_node_id,vehicle,Ti,Tj
    #[arg(long, short, default_value = "result.csv")]
    output: PathBuf,

    /// JSON file with run parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vehicle capacity
    #[arg(long)]
    capacity: Option<f64>,

    /// Number of vehicles
    #[arg(long)]
    vehicles: Option<usize>,

    /// Big-M constant, derived from the time data when omitted
    #[arg(long)]
    big_m: Option<f64>,

    /// Wall-clock limit for the solve in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Minimum arc-use value treated as travelled
    #[arg(long)]
    arc_threshold: Option<f64>,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Only log warnings and skip the route report
    #[arg(long, short)]
    quiet: bool,
}

impl Args {
    fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(capacity) = self.capacity {
            config = config.with_vehicle_capacity(capacity);
        }
        if let Some(vehicles) = self.vehicles {
            config = config.with_fleet_size(vehicles);
        }
        if let Some(big_m) = self.big_m {
            config = config.with_big_m(big_m);
        }
        if let Some(seconds) = self.time_limit {
            let limit = Duration::try_from_secs_f64(seconds).context("invalid time limit")?;
            config = config.with_time_limit(limit);
        }
        if let Some(threshold) = self.arc_threshold {
            config = config.with_arc_threshold(threshold);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = args.to_config()?;

    info!("loading nodes from {} and links from {}", args.nodes.display(), args.links.display());
    let problem = Problem::from_files(&args.nodes, &args.links).context("loading problem")?;
    info!(
        "loaded {} customers and {} links",
        problem.customer_count(),
        problem.arc_count()
    );

    let solver = CvrptwSolver::new(problem, config)?;
    let solution = solver.solve();
    info!("solve finished in {}", format_duration(solution.run_time));

    if solution.is_optimal() {
        if let Err(violation) = solution.verify(&solver.problem, &solver.params) {
            warn!("solution violates the model: {}", violation);
        }
        save_arcs(&solution, &solver.problem, &args.output)
            .with_context(|| format!("writing {}", args.output.display()))?;
        info!("{} arcs written to {}", solution.arcs.len(), args.output.display());
    } else {
        println!("no solution ({})", solution.status);
    }

    if let Some(path) = &args.summary {
        save_summary(&solution, &solver.problem, &solver.params, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if !args.quiet {
        print_routes(&solution, &solver.problem, &solver.params);
    }

    Ok(())
}
