//! Submitting a formulation to the MILP backend and reading back its values.

use good_lp::{default_solver, ProblemVariables, ResolutionError, SolverModel};
use itertools::Itertools;
use log::{debug, info};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::model::{Formulation, ModelParameters};
use crate::problem::Problem;
use crate::solution::{RouteArc, Solution, SolveStatus};

/// Build the model, solve it and collect every arc whose use is at least `threshold`.
pub fn solve_model(problem: &Problem, params: ModelParameters, threshold: f64) -> Solution {
    let start_time = Instant::now();

    let mut vars = ProblemVariables::new();
    let formulation = Formulation::declare(problem, params, &mut vars);
    let constraints = formulation.constraints();

    info!(
        "model has {} variables and {} constraints",
        formulation.variable_count(),
        constraints.len()
    );
    for (family, count) in constraints.iter().map(|(family, _)| *family).counts().into_iter().sorted() {
        debug!("  {}: {}", family, count);
    }

    let mut model = vars.minimise(formulation.objective()).using(default_solver);
    for (_, constraint) in constraints {
        model.add_constraint(constraint);
    }

    let mut solution = match model.solve() {
        Ok(values) => read_values(&formulation, &values, threshold),
        Err(err) => Solution::without_plan(status_of(err)),
    };
    solution.run_time = start_time.elapsed();

    solution
}

/// Like [`solve_model`], but gives up waiting once `time_limit` has passed.
///
/// The backend cannot be interrupted, so an expired solve keeps running on a
/// detached worker thread until the process exits.
pub fn solve_with_limit(
    problem: &Problem,
    params: ModelParameters,
    threshold: f64,
    time_limit: Option<Duration>,
) -> Solution {
    let time_limit = match time_limit {
        Some(limit) => limit,
        None => return solve_model(problem, params, threshold),
    };

    let start_time = Instant::now();
    let (sender, receiver) = mpsc::channel();
    let problem = problem.clone();
    thread::spawn(move || {
        // the receiver is gone once the limit expired
        let _ = sender.send(solve_model(&problem, params, threshold));
    });

    let mut solution = match receiver.recv_timeout(time_limit) {
        Ok(solution) => return solution,
        Err(RecvTimeoutError::Timeout) => Solution::without_plan(SolveStatus::TimeLimit),
        Err(RecvTimeoutError::Disconnected) => {
            Solution::without_plan(SolveStatus::Other("solver thread terminated".to_string()))
        }
    };
    solution.run_time = start_time.elapsed();

    solution
}

fn status_of(err: ResolutionError) -> SolveStatus {
    match err {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        ResolutionError::Unbounded => SolveStatus::Unbounded,
        other => SolveStatus::Other(other.to_string()),
    }
}

fn read_values(formulation: &Formulation, values: &impl good_lp::Solution, threshold: f64) -> Solution {
    let problem = formulation.problem();
    let node_count = problem.nodes.len();

    let mut objective = 0.0;
    let mut arcs = Vec::new();

    for k in 0..formulation.params().fleet_size {
        for i in 0..node_count {
            for j in 0..node_count {
                let x = match formulation.arc_use(i, j, k) {
                    Some(x) => values.value(x),
                    None => continue,
                };
                objective += problem.cost(i, j).unwrap_or_default() * x;

                if x >= threshold {
                    arcs.push(RouteArc {
                        from: i,
                        to: j,
                        vehicle: k,
                        ti: values.value(formulation.service_start(i, k)),
                        tj: values.value(formulation.service_start(j, k)),
                    });
                }
            }
        }
    }

    Solution {
        status: SolveStatus::Optimal,
        objective: Some(objective),
        arcs,
        run_time: Duration::from_secs(0),
    }
}
