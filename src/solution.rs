//! Solved state of a CVRPTW model: status, travelled arcs and decoded routes.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use crate::model::ModelParameters;
use crate::problem::Problem;

/// Absolute slack allowed when checking solver values.
pub const TOLERANCE: f64 = 1e-6;

/// Terminal status of a solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimeLimit,
    Other(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::TimeLimit => write!(f, "time limit reached"),
            SolveStatus::Other(message) => write!(f, "solver failure: {}", message),
        }
    }
}

/// A travelled arc with the service starts at both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteArc {
    pub from: usize,
    pub to: usize,
    pub vehicle: usize,
    /// Service start at `from`
    pub ti: f64,
    /// Service start at `to`
    pub tj: f64,
}

/// A vehicle route decoded from its arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub vehicle: usize,
    /// Node sequence starting and ending at the depot
    pub stops: Vec<usize>,
    /// Service start at each stop but the final depot visit
    pub service_starts: Vec<f64>,
    pub load: f64,
    pub cost: f64,
    pub travel_time: f64,
}

impl Route {
    /// Customers served by this route.
    pub fn customers(&self) -> &[usize] {
        &self.stops[1..self.stops.len() - 1]
    }
}

/// Reasons a set of arcs is not a valid routing plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A customer is not served by any route.
    MissingCustomer(usize),
    /// A customer is served more than once.
    RepeatedCustomer(usize),
    /// A vehicle's arcs do not form one depot-to-depot path.
    BrokenRoute { vehicle: usize, node: usize },
    /// An arc which is not part of the problem.
    UnknownArc { from: usize, to: usize },
    Capacity { vehicle: usize, load: f64 },
    /// Service at `to` starts before service at `from` plus travel has finished.
    Timing { vehicle: usize, from: usize, to: usize },
    TimeWindow { vehicle: usize, node: usize, time: f64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingCustomer(node) => write!(f, "customer #{} is not served", node),
            Violation::RepeatedCustomer(node) => write!(f, "customer #{} is served more than once", node),
            Violation::BrokenRoute { vehicle, node } => {
                write!(f, "route of vehicle {} is not a single depot path at node #{}", vehicle, node)
            }
            Violation::UnknownArc { from, to } => write!(f, "arc #{} -> #{} does not exist", from, to),
            Violation::Capacity { vehicle, load } => write!(f, "vehicle {} carries {:.2}", vehicle, load),
            Violation::Timing { vehicle, from, to } => {
                write!(f, "vehicle {} starts #{} too early after #{}", vehicle, to, from)
            }
            Violation::TimeWindow { vehicle, node, time } => {
                write!(f, "vehicle {} serves #{} at {:.2}, outside its window", vehicle, node, time)
            }
        }
    }
}

impl StdError for Violation {}

/// Represents the outcome of a solve.
#[derive(Clone)]
pub struct Solution {
    pub status: SolveStatus,
    /// Total travel cost, present only for an optimal solve
    pub objective: Option<f64>,
    /// Travelled arcs grouped by vehicle, then origin and destination in node order
    pub arcs: Vec<RouteArc>,
    pub run_time: Duration,
}

impl Solution {
    /// Create a solution carrying only a status.
    pub fn without_plan(status: SolveStatus) -> Self {
        Solution {
            status,
            objective: None,
            arcs: Vec::new(),
            run_time: Duration::from_secs(0),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// Number of distinct vehicles with at least one travelled arc.
    pub fn used_vehicle_count(&self) -> usize {
        let mut vehicles: Vec<usize> = self.arcs.iter().map(|arc| arc.vehicle).collect();
        vehicles.dedup();
        vehicles.len()
    }

    /// Chain the arcs of each vehicle into a route from the depot back to it.
    pub fn routes(&self, problem: &Problem) -> Result<Vec<Route>, Violation> {
        let mut by_vehicle: BTreeMap<usize, Vec<&RouteArc>> = BTreeMap::new();
        for arc in &self.arcs {
            by_vehicle.entry(arc.vehicle).or_default().push(arc);
        }

        by_vehicle
            .into_iter()
            .map(|(vehicle, arcs)| decode_route(problem, vehicle, &arcs))
            .collect()
    }

    /// Check the routing plan against the model's constraints.
    ///
    /// A solution without plan has nothing to check and passes.
    pub fn verify(&self, problem: &Problem, params: &ModelParameters) -> Result<(), Violation> {
        if !self.is_optimal() {
            return Ok(());
        }

        let routes = self.routes(problem)?;

        let mut visits = vec![0usize; problem.nodes.len()];
        for route in &routes {
            for &customer in route.customers() {
                visits[customer] += 1;
            }
            if route.load > params.vehicle_capacity + TOLERANCE {
                return Err(Violation::Capacity {
                    vehicle: route.vehicle,
                    load: route.load,
                });
            }
        }
        for customer in problem.customers() {
            match visits[customer] {
                0 => return Err(Violation::MissingCustomer(customer)),
                1 => {}
                _ => return Err(Violation::RepeatedCustomer(customer)),
            }
        }

        for arc in &self.arcs {
            let node = &problem.nodes[arc.from];
            let travel_time = problem
                .travel_time(arc.from, arc.to)
                .ok_or(Violation::UnknownArc { from: arc.from, to: arc.to })?;

            if arc.to != Problem::DEPOT && arc.tj + TOLERANCE < arc.ti + node.service_time + travel_time {
                return Err(Violation::Timing {
                    vehicle: arc.vehicle,
                    from: arc.from,
                    to: arc.to,
                });
            }

            for (index, time) in [(arc.from, arc.ti), (arc.to, arc.tj)] {
                let window = &problem.nodes[index];
                if time + TOLERANCE < window.start_time || time > window.end_time + TOLERANCE {
                    return Err(Violation::TimeWindow {
                        vehicle: arc.vehicle,
                        node: index,
                        time,
                    });
                }
            }
        }

        Ok(())
    }
}

fn decode_route(problem: &Problem, vehicle: usize, arcs: &[&RouteArc]) -> Result<Route, Violation> {
    let depot = Problem::DEPOT;

    let mut successors: HashMap<usize, &RouteArc> = HashMap::with_capacity(arcs.len());
    for &arc in arcs {
        if successors.insert(arc.from, arc).is_some() {
            return Err(Violation::BrokenRoute { vehicle, node: arc.from });
        }
    }

    let mut route = Route {
        vehicle,
        stops: vec![depot],
        service_starts: Vec::with_capacity(arcs.len()),
        load: 0.0,
        cost: 0.0,
        travel_time: 0.0,
    };

    let mut current = depot;
    loop {
        let arc = successors.remove(&current).ok_or(Violation::BrokenRoute { vehicle, node: current })?;
        let data = problem
            .arc(arc.from, arc.to)
            .ok_or(Violation::UnknownArc { from: arc.from, to: arc.to })?;

        route.service_starts.push(arc.ti);
        route.cost += data.cost;
        route.travel_time += data.travel_time;
        route.stops.push(arc.to);

        if arc.to == depot {
            break;
        }
        route.load += problem.nodes[arc.to].demand;
        current = arc.to;
    }

    // leftover arcs form a cycle detached from the depot
    if let Some(&node) = successors.keys().min() {
        return Err(Violation::BrokenRoute { vehicle, node });
    }

    Ok(route)
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        writeln!(f, "  Status: {}", self.status)?;
        match self.objective {
            Some(objective) => writeln!(f, "  Objective: {:.2}", objective)?,
            None => writeln!(f, "  Objective: -")?,
        }
        writeln!(f, "  Arcs: {}", self.arcs.len())?;

        for arc in &self.arcs {
            writeln!(
                f,
                "  X[{},{},{}] = 1 (Ti: {:.2}, Tj: {:.2})",
                arc.from, arc.to, arc.vehicle, arc.ti, arc.tj
            )?;
        }

        Ok(())
    }
}
