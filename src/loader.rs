//! Reading node and link sources in csv format.

use log::{debug, warn};
use serde::Deserialize;
use std::io::Read;

use crate::error::{Error, Result};
use crate::problem::{ArcData, Node, Problem};

#[derive(Debug, Deserialize)]
struct CsvNode {
    id: String,
    demand: f64,
    start_time: f64,
    end_time: f64,
    service_time: f64,
}

#[derive(Debug, Deserialize)]
struct CsvLink {
    from_node_id: String,
    to_node_id: String,
    travel_time: f64,
    link_cost: f64,
}

fn read_csv_entries<T, R: Read>(reader: R, entity: &'static str) -> Result<Vec<T>>
where
    for<'de> T: Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = vec![];

    for entry in reader.deserialize() {
        entries.push(entry.map_err(|err| Error::input(entity, err))?);
    }

    Ok(entries)
}

/// Rejects `NaN` and infinite values of a numeric field.
fn finite(entity: &'static str, row: usize, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::input(entity, format!("row {}: {} must be a finite number, got {}", row + 1, field, value)))
    }
}

/// Reads nodes in source order. The first row is the depot.
///
/// All fields must be finite, except that the depot may have an unbounded
/// latest end (`inf`).
pub fn read_nodes<R: Read>(reader: R) -> Result<Vec<Node>> {
    read_csv_entries::<CsvNode, _>(reader, "nodes")?
        .into_iter()
        .enumerate()
        .map(|(row, node)| {
            let end_time = if row == Problem::DEPOT && node.end_time == f64::INFINITY {
                node.end_time
            } else {
                finite("nodes", row, "end_time", node.end_time)?
            };

            Ok(Node {
                demand: finite("nodes", row, "demand", node.demand)?,
                start_time: finite("nodes", row, "start_time", node.start_time)?,
                end_time,
                service_time: finite("nodes", row, "service_time", node.service_time)?,
                id: node.id,
            })
        })
        .collect()
}

/// Reads directed links as `(from, to, attributes)` triples.
pub fn read_arcs<R: Read>(reader: R) -> Result<Vec<(String, String, ArcData)>> {
    read_csv_entries::<CsvLink, _>(reader, "links")?
        .into_iter()
        .enumerate()
        .map(|(row, link)| {
            let data = ArcData {
                travel_time: finite("links", row, "travel_time", link.travel_time)?,
                cost: finite("links", row, "link_cost", link.link_cost)?,
            };
            Ok((link.from_node_id, link.to_node_id, data))
        })
        .collect()
}

/// Reads a problem from a node source and a link source.
pub fn load_problem<R1: Read, R2: Read>(node_reader: R1, link_reader: R2) -> Result<Problem> {
    let mut problem = Problem::new(read_nodes(node_reader)?)?;

    let mut skipped = 0;
    for (from, to, data) in read_arcs(link_reader)? {
        if !problem.add_arc(&from, &to, data) {
            warn!("skipping link {} -> {}: self-loop or unknown node", from, to);
            skipped += 1;
        }
    }

    debug!(
        "loaded {} nodes and {} links ({} skipped)",
        problem.nodes.len(),
        problem.arc_count(),
        skipped
    );

    Ok(problem)
}
