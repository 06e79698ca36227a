//! # CVRPTW-MILP
//!
//! An exact formulation of the Capacitated Vehicle Routing Problem with Time
//! Windows (CVRPTW) as a mixed integer linear program.
//!
//! Nodes and links are read from csv, the model is declared with `good_lp` and
//! handed to its MILP backend, and the travelled arcs of the optimal plan are
//! written back to csv:
//!
//! ```no_run
//! use cvrptw_milp::config::Config;
//! use cvrptw_milp::problem::Problem;
//! use cvrptw_milp::CvrptwSolver;
//!
//! let problem = Problem::from_files("node.csv", "link.csv")?;
//! let config = Config::new().with_vehicle_capacity(80.0).with_fleet_size(15);
//! let solver = CvrptwSolver::new(problem, config)?;
//! let solution = solver.solve();
//! cvrptw_milp::output::save_arcs(&solution, &solver.problem, "result.csv")?;
//! # Ok::<(), cvrptw_milp::error::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod problem;
pub mod solution;
pub mod solver;

use crate::config::Config;
use crate::error::Result;
use crate::model::ModelParameters;
use crate::problem::Problem;
use crate::solution::Solution;

use log::info;

/// Ties a problem instance to the run parameters and solves it.
pub struct CvrptwSolver {
    pub problem: Problem,
    pub config: Config,
    pub params: ModelParameters,
}

impl CvrptwSolver {
    /// Create a solver for the given problem and configuration.
    pub fn new(problem: Problem, config: Config) -> Result<Self> {
        config.validate()?;
        let params = ModelParameters::new(&problem, &config);

        Ok(CvrptwSolver {
            problem,
            config,
            params,
        })
    }

    /// Solve the model. Infeasibility and other solver outcomes are reported
    /// through the status of the returned solution.
    pub fn solve(&self) -> Solution {
        info!(
            "solving {} customers with {} vehicles of capacity {} (big-M {})",
            self.problem.customer_count(),
            self.params.fleet_size,
            self.params.vehicle_capacity,
            self.params.big_m
        );

        let solution = solver::solve_with_limit(
            &self.problem,
            self.params,
            self.config.arc_threshold,
            self.config.time_limit,
        );

        match solution.objective {
            Some(objective) => info!("obj={}", objective),
            None => info!("no solution: {}", solution.status),
        }

        solution
    }
}
