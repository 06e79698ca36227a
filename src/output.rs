//! Writing solved routing plans: result csv, json summary and console report.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::config::vehicle_id;
use crate::error::{Error, Result};
use crate::model::ModelParameters;
use crate::problem::Problem;
use crate::solution::{Solution, SolveStatus};

const RESULT_HEADER: [&str; 5] = ["from_node_id", "to_node_id", "vehicle", "Ti", "Tj"];

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    from_node_id: &'a str,
    to_node_id: &'a str,
    vehicle: String,
    #[serde(rename = "Ti")]
    ti: f64,
    #[serde(rename = "Tj")]
    tj: f64,
}

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    format!("{}h {:02}m {:02}.{:03}s", hours, minutes, seconds, millis)
}

/// Write the travelled arcs of an optimal solution as csv.
///
/// Returns the number of records written. Nothing, not even the header, is
/// written for a solution without plan.
pub fn write_arcs<W: Write>(solution: &Solution, problem: &Problem, writer: W) -> Result<usize> {
    if !solution.is_optimal() {
        return Ok(0);
    }

    // header written by hand so that a plan without arcs still gets one
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer
        .write_record(RESULT_HEADER)
        .map_err(|err| Error::Output(err.to_string()))?;
    for arc in &solution.arcs {
        writer
            .serialize(ResultRecord {
                from_node_id: &problem.nodes[arc.from].id,
                to_node_id: &problem.nodes[arc.to].id,
                vehicle: vehicle_id(arc.vehicle),
                ti: arc.ti,
                tj: arc.tj,
            })
            .map_err(|err| Error::Output(err.to_string()))?;
    }
    writer.flush().map_err(|err| Error::Output(err.to_string()))?;

    Ok(solution.arcs.len())
}

/// Save the travelled arcs to a csv file. The file is only created when
/// there is a plan to write; returns whether it was.
pub fn save_arcs<P: AsRef<Path>>(solution: &Solution, problem: &Problem, path: P) -> Result<bool> {
    if !solution.is_optimal() {
        return Ok(false);
    }

    let path = path.as_ref();
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    write_arcs(solution, problem, BufWriter::new(file))?;

    Ok(true)
}

#[derive(Debug, Serialize)]
struct RouteSummary {
    vehicle: String,
    stops: Vec<String>,
    service_starts: Vec<f64>,
    load: f64,
    cost: f64,
    travel_time: f64,
}

#[derive(Debug, Serialize)]
struct Summary {
    status: SolveStatus,
    objective: Option<f64>,
    run_time_secs: f64,
    big_m: f64,
    vehicle_capacity: f64,
    fleet_size: usize,
    used_vehicles: usize,
    routes: Vec<RouteSummary>,
}

/// Write a json summary of the run: status, objective and decoded routes.
pub fn write_summary<W: Write>(
    solution: &Solution,
    problem: &Problem,
    params: &ModelParameters,
    writer: W,
) -> Result<()> {
    let routes = solution
        .routes(problem)
        .map_err(|violation| Error::Output(format!("cannot decode routes: {}", violation)))?
        .into_iter()
        .map(|route| RouteSummary {
            vehicle: vehicle_id(route.vehicle),
            stops: route.stops.iter().map(|&stop| problem.nodes[stop].id.clone()).collect(),
            service_starts: route.service_starts,
            load: route.load,
            cost: route.cost,
            travel_time: route.travel_time,
        })
        .collect();

    let summary = Summary {
        status: solution.status.clone(),
        objective: solution.objective,
        run_time_secs: solution.run_time.as_secs_f64(),
        big_m: params.big_m,
        vehicle_capacity: params.vehicle_capacity,
        fleet_size: params.fleet_size,
        used_vehicles: solution.used_vehicle_count(),
        routes,
    };

    serde_json::to_writer_pretty(writer, &summary).map_err(|err| Error::Output(err.to_string()))
}

/// Save the json summary to a file.
pub fn save_summary<P: AsRef<Path>>(
    solution: &Solution,
    problem: &Problem,
    params: &ModelParameters,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let mut writer = BufWriter::new(file);
    write_summary(solution, problem, params, &mut writer)?;
    writer.flush().map_err(|err| Error::io(path, err))
}

/// Print the routes of an optimal solution to the console.
pub fn print_routes(solution: &Solution, problem: &Problem, params: &ModelParameters) {
    let objective = match solution.objective {
        Some(objective) => objective,
        None => return,
    };
    println!("Status: {}", solution.status);
    println!("Objective: {:.2}", objective);

    let routes = match solution.routes(problem) {
        Ok(routes) => routes,
        Err(violation) => {
            println!("Routes cannot be decoded: {}", violation);
            return;
        }
    };
    println!("Vehicles used: {} / {}", routes.len(), params.fleet_size);
    println!();

    for route in &routes {
        let stops: Vec<&str> = route.stops.iter().map(|&stop| problem.nodes[stop].id.as_str()).collect();
        println!("Route {}: {}", vehicle_id(route.vehicle), stops.join(" -> "));
        println!(
            "  Load: {:.2} / {:.2}  Cost: {:.2}  Travel time: {:.2}",
            route.load, params.vehicle_capacity, route.cost, route.travel_time
        );
    }
}
