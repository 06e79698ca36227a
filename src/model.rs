//! MILP formulation of the CVRPTW.
//!
//! Decision variables:
//! - `x[i][j][k]`: binary, vehicle `k` travels the arc `i -> j`. Declared only
//!   for arcs present in the problem.
//! - `idle[k]`: binary, vehicle `k` stays at the depot.
//! - `t[i][k]`: continuous, time vehicle `k` starts service at node `i`.
//!
//! The objective is the total cost of travelled arcs. Sub-tours are excluded by
//! the big-M time propagation constraints, which force service starts to grow
//! strictly along every travelled arc between customers.

use good_lp::constraint::{self, Constraint};
use good_lp::{variable, Expression, ProblemVariables, Variable};
use itertools::iproduct;
use log::warn;
use std::collections::HashMap;
use std::fmt;

use crate::config::Config;
use crate::problem::Problem;

/// Constants of the formulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParameters {
    pub vehicle_capacity: f64,
    pub fleet_size: usize,
    pub big_m: f64,
}

impl ModelParameters {
    /// Take capacity and fleet size from the configuration. The big-M is the
    /// configured one, or derived from the time data of the problem.
    pub fn new(problem: &Problem, config: &Config) -> Self {
        let derived = derive_big_m(problem);
        let big_m = match config.big_m {
            Some(big_m) => {
                if big_m < derived {
                    warn!(
                        "big-M {} is below the time span bound {}, feasible schedules may be cut off",
                        big_m, derived
                    );
                }
                big_m
            }
            None => derived,
        };

        ModelParameters {
            vehicle_capacity: config.vehicle_capacity,
            fleet_size: config.fleet_size,
            big_m,
        }
    }
}

/// Smallest big-M which never tightens a time propagation constraint:
/// `max(end) - min(start) + max(service) + max(travel) + 1`.
///
/// The depot is only ever the origin of a propagation constraint, so its
/// latest end does not bound anything and its start time stands in for it.
/// Non-finite values are ignored.
pub fn derive_big_m(problem: &Problem) -> f64 {
    let nodes = &problem.nodes;
    let depot_start = problem.depot().start_time;
    let latest_end = problem
        .customers()
        .map(|i| nodes[i].end_time)
        .filter(|end| end.is_finite())
        .fold(depot_start, f64::max);
    let earliest_start = nodes
        .iter()
        .map(|n| n.start_time)
        .filter(|start| start.is_finite())
        .fold(depot_start, f64::min);
    let service = nodes.iter().map(|n| n.service_time).filter(|s| s.is_finite()).fold(0.0, f64::max);
    let travel = problem
        .arcs()
        .map(|(_, _, arc)| arc.travel_time)
        .filter(|tt| tt.is_finite())
        .fold(0.0, f64::max);

    (latest_end - earliest_start).max(0.0) + service + travel + 1.0
}

/// Constraint families of the formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintFamily {
    DepotDeparture,
    FlowConservation,
    DepotReturn,
    Coverage,
    Capacity,
    TimePropagation,
    TimeWindow,
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintFamily::DepotDeparture => "depot departure",
            ConstraintFamily::FlowConservation => "flow conservation",
            ConstraintFamily::DepotReturn => "depot return",
            ConstraintFamily::Coverage => "coverage",
            ConstraintFamily::Capacity => "capacity",
            ConstraintFamily::TimePropagation => "time propagation",
            ConstraintFamily::TimeWindow => "time window",
        };
        f.write_str(name)
    }
}

/// Variables of a declared model together with the data they range over.
pub struct Formulation<'a> {
    problem: &'a Problem,
    params: ModelParameters,
    arc_use: HashMap<(usize, usize, usize), Variable>,
    idle: Vec<Variable>,
    service_start: Vec<Vec<Variable>>,
}

impl<'a> Formulation<'a> {
    /// Declare all decision variables in `vars`.
    pub fn declare(problem: &'a Problem, params: ModelParameters, vars: &mut ProblemVariables) -> Self {
        let fleet = 0..params.fleet_size;

        let mut arc_use = HashMap::with_capacity(problem.arc_count() * params.fleet_size);
        for k in fleet.clone() {
            for (i, j, _) in problem.arcs() {
                arc_use.insert((i, j, k), vars.add(variable().binary()));
            }
        }

        let idle = fleet.clone().map(|_| vars.add(variable().binary())).collect();

        let service_start = fleet
            .map(|_| {
                (0..problem.nodes.len())
                    .map(|_| vars.add(variable().min(0.0)))
                    .collect::<Vec<_>>()
            })
            .collect();

        Formulation {
            problem,
            params,
            arc_use,
            idle,
            service_start,
        }
    }

    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Arc-use variable of vehicle `k` on `i -> j`, absent when there is no such arc.
    pub fn arc_use(&self, i: usize, j: usize, k: usize) -> Option<Variable> {
        self.arc_use.get(&(i, j, k)).copied()
    }

    pub fn idle(&self, k: usize) -> Variable {
        self.idle[k]
    }

    pub fn service_start(&self, i: usize, k: usize) -> Variable {
        self.service_start[k][i]
    }

    /// Number of declared decision variables.
    pub fn variable_count(&self) -> usize {
        self.arc_use.len() + self.idle.len() + self.service_start.iter().map(Vec::len).sum::<usize>()
    }

    /// Total cost of all travelled arcs.
    pub fn objective(&self) -> Expression {
        let mut objective = Expression::from(0.0);
        for k in 0..self.params.fleet_size {
            for (i, j, arc) in self.problem.arcs() {
                if let Some(x) = self.arc_use(i, j, k) {
                    objective += arc.cost * x;
                }
            }
        }
        objective
    }

    /// Sum of arc-use variables leaving `i` for vehicle `k`.
    fn outflow(&self, i: usize, k: usize) -> Expression {
        let mut flow = Expression::from(0.0);
        for j in 0..self.problem.nodes.len() {
            if let Some(x) = self.arc_use(i, j, k) {
                flow += x;
            }
        }
        flow
    }

    /// Sum of arc-use variables entering `i` for vehicle `k`.
    fn inflow(&self, i: usize, k: usize) -> Expression {
        let mut flow = Expression::from(0.0);
        for j in 0..self.problem.nodes.len() {
            if let Some(x) = self.arc_use(j, i, k) {
                flow += x;
            }
        }
        flow
    }

    /// All constraints, grouped by family in declaration order.
    pub fn constraints(&self) -> Vec<(ConstraintFamily, Constraint)> {
        use ConstraintFamily::*;

        let depot = Problem::DEPOT;
        let fleet = 0..self.params.fleet_size;
        let nodes = &self.problem.nodes;
        let mut constraints = Vec::new();

        for k in fleet.clone() {
            let departure = self.outflow(depot, k) + self.idle(k);
            constraints.push((DepotDeparture, constraint::eq(departure, 1.0)));
        }

        for (i, k) in iproduct!(self.problem.customers(), fleet.clone()) {
            constraints.push((FlowConservation, constraint::eq(self.outflow(i, k), self.inflow(i, k))));
        }

        for k in fleet.clone() {
            let arrival = self.inflow(depot, k) + self.idle(k);
            constraints.push((DepotReturn, constraint::eq(arrival, 1.0)));
        }

        for i in self.problem.customers() {
            let mut served = Expression::from(0.0);
            for k in fleet.clone() {
                served += self.outflow(i, k);
            }
            constraints.push((Coverage, constraint::eq(served, 1.0)));
        }

        for k in fleet.clone() {
            let mut load = Expression::from(0.0);
            for i in self.problem.customers() {
                load += self.outflow(i, k) * nodes[i].demand;
            }
            constraints.push((Capacity, constraint::leq(load, self.params.vehicle_capacity)));
        }

        // t[i][k] + s[i] + tt[i][j] - (1 - x[i][j][k]) * M <= t[j][k], arcs into the depot excluded
        let big_m = self.params.big_m;
        for k in fleet.clone() {
            for (i, j, arc) in self.problem.arcs() {
                if j == depot {
                    continue;
                }
                if let Some(x) = self.arc_use(i, j, k) {
                    let lhs = self.service_start(i, k) - self.service_start(j, k) + big_m * x;
                    let rhs = big_m - nodes[i].service_time - arc.travel_time;
                    constraints.push((TimePropagation, constraint::leq(lhs, rhs)));
                }
            }
        }

        for (k, (i, node)) in iproduct!(fleet, nodes.iter().enumerate()) {
            let t = self.service_start(i, k);
            constraints.push((TimeWindow, constraint::geq(t, node.start_time)));
            // an open window has no upper bound
            if node.end_time.is_finite() {
                constraints.push((TimeWindow, constraint::leq(t, node.end_time)));
            }
        }

        constraints
    }
}
