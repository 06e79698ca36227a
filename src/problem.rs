//! Problem definition and lookup tables for the CVRPTW.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::loader;

/// Represents a node (customer or depot) of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub demand: f64,
    /// Earliest service start
    pub start_time: f64,
    /// Latest service start
    pub end_time: f64,
    pub service_time: f64,
}

impl Node {
    /// Create a new node.
    pub fn new(id: &str, demand: f64, start_time: f64, end_time: f64, service_time: f64) -> Self {
        Node {
            id: id.to_string(),
            demand,
            start_time,
            end_time,
            service_time,
        }
    }
}

/// Attributes of a directed arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcData {
    pub travel_time: f64,
    pub cost: f64,
}

/// Represents a CVRPTW instance. Node 0 is the depot.
#[derive(Debug, Clone)]
pub struct Problem {
    pub nodes: Vec<Node>,
    arcs: HashMap<(usize, usize), ArcData>,
    index: HashMap<String, usize>,
}

impl Problem {
    /// Index of the depot node.
    pub const DEPOT: usize = 0;

    /// Create a problem from nodes in source order; the first node is the depot.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::input("nodes", "node source is empty, a depot is required"));
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), idx).is_some() {
                return Err(Error::input("nodes", format!("duplicate node id '{}'", node.id)));
            }
        }

        Ok(Problem {
            nodes,
            arcs: HashMap::new(),
            index,
        })
    }

    /// Load a problem from a node file and a link file.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(node_path: P, link_path: Q) -> Result<Self> {
        let node_path = node_path.as_ref();
        let link_path = link_path.as_ref();
        let node_file = File::open(node_path).map_err(|err| Error::io(node_path, err))?;
        let link_file = File::open(link_path).map_err(|err| Error::io(link_path, err))?;

        loader::load_problem(BufReader::new(node_file), BufReader::new(link_file))
    }

    /// Register a directed arc. Returns false when it can never be used:
    /// an unknown endpoint or a self-loop.
    pub fn add_arc(&mut self, from: &str, to: &str, data: ArcData) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(i), Some(j)) if i != j => {
                self.arcs.insert((i, j), data);
                true
            }
            _ => false,
        }
    }

    /// Dense index of a node id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Get the depot node.
    pub fn depot(&self) -> &Node {
        &self.nodes[Self::DEPOT]
    }

    /// Indices of all customers, in source order.
    pub fn customers(&self) -> std::ops::Range<usize> {
        1..self.nodes.len()
    }

    /// Get the number of customers (excluding the depot).
    pub fn customer_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Arc attributes, if a direct arc exists.
    pub fn arc(&self, from: usize, to: usize) -> Option<&ArcData> {
        self.arcs.get(&(from, to))
    }

    pub fn travel_time(&self, from: usize, to: usize) -> Option<f64> {
        self.arc(from, to).map(|arc| arc.travel_time)
    }

    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.arc(from, to).map(|arc| arc.cost)
    }

    /// Number of usable arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Iterate over all arcs in node order of origin, then destination.
    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize, &ArcData)> + '_ {
        let n = self.nodes.len();
        (0..n)
            .flat_map(move |i| (0..n).map(move |j| (i, j)))
            .filter_map(move |(i, j)| self.arc(i, j).map(|arc| (i, j, arc)))
    }

    /// Total demand of all customers.
    pub fn total_demand(&self) -> f64 {
        self.customers().map(|i| self.nodes[i].demand).sum()
    }
}
