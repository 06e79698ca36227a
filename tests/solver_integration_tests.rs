//! Integration tests solving small CVRPTW instances end to end.

use cvrptw_milp::config::Config;
use cvrptw_milp::loader::load_problem;
use cvrptw_milp::problem::{ArcData, Node, Problem};
use cvrptw_milp::solution::SolveStatus;
use cvrptw_milp::CvrptwSolver;
use std::time::Duration;

/// Adds arcs given as `(from, to, travel_time, cost)`.
fn add_arcs(problem: &mut Problem, arcs: &[(&str, &str, f64, f64)]) {
    for &(from, to, travel_time, cost) in arcs {
        assert!(problem.add_arc(from, to, ArcData { travel_time, cost }));
    }
}

/// A depot and two customers where D -> A -> B -> D is by far the cheapest tour.
fn create_two_customer_problem(demand: f64, window_a: (f64, f64), window_b: (f64, f64)) -> Problem {
    let nodes = vec![
        Node::new("D", 0.0, 0.0, 100.0, 0.0),
        Node::new("A", demand, window_a.0, window_a.1, 1.0),
        Node::new("B", demand, window_b.0, window_b.1, 1.0),
    ];
    let mut problem = Problem::new(nodes).unwrap();
    add_arcs(
        &mut problem,
        &[
            ("D", "A", 1.0, 1.0),
            ("A", "B", 1.0, 1.0),
            ("B", "D", 1.0, 1.0),
            ("D", "B", 1.0, 5.0),
            ("B", "A", 1.0, 5.0),
            ("A", "D", 1.0, 5.0),
        ],
    );
    problem
}

/// A depot and four customers on a line, each pair connected both ways.
/// Cost and travel time equal the distance between positions.
fn create_line_problem() -> Problem {
    let positions = [0.0, 2.0, 4.0, 6.0, 8.0];
    let mut nodes = vec![Node::new("0", 0.0, 0.0, 1000.0, 0.0)];
    for i in 1..positions.len() {
        nodes.push(Node::new(&i.to_string(), 30.0, 0.0, 1000.0, 1.0));
    }
    let mut problem = Problem::new(nodes).unwrap();

    for i in 0..positions.len() {
        for j in 0..positions.len() {
            if i != j {
                let distance = f64::abs(positions[i] - positions[j]);
                problem.add_arc(&i.to_string(), &j.to_string(), ArcData { travel_time: distance, cost: distance });
            }
        }
    }
    problem
}

fn stop_ids(problem: &Problem, stops: &[usize]) -> Vec<String> {
    stops.iter().map(|&stop| problem.nodes[stop].id.clone()).collect()
}

#[test]
fn test_single_route_for_two_customers() {
    let problem = create_two_customer_problem(10.0, (0.0, 100.0), (0.0, 100.0));
    let config = Config::new().with_vehicle_capacity(80.0).with_fleet_size(2);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert!((solution.objective.unwrap() - 3.0).abs() < 1e-6);
    assert_eq!(solution.arcs.len(), 3);
    assert_eq!(solution.used_vehicle_count(), 1);

    let routes = solution.routes(&solver.problem).unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(stop_ids(&solver.problem, &routes[0].stops), vec!["D", "A", "B", "D"]);

    assert_eq!(solution.verify(&solver.problem, &solver.params), Ok(()));
}

#[test]
fn test_time_windows_decide_the_order() {
    // Visiting A first would push B past its latest start
    let problem = create_two_customer_problem(10.0, (10.0, 20.0), (0.0, 5.0));
    let config = Config::new().with_fleet_size(1);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert!(solution.is_optimal());
    assert!((solution.objective.unwrap() - 15.0).abs() < 1e-6);

    let routes = solution.routes(&solver.problem).unwrap();
    assert_eq!(stop_ids(&solver.problem, &routes[0].stops), vec!["D", "B", "A", "D"]);

    // A cannot be served before its window opens
    let into_a = solution.arcs.iter().find(|arc| arc.to == 1).unwrap();
    assert!(into_a.tj >= 10.0 - 1e-6);

    assert_eq!(solution.verify(&solver.problem, &solver.params), Ok(()));
}

#[test]
fn test_missing_arc_splits_the_route() {
    let nodes = vec![
        Node::new("D", 0.0, 0.0, 100.0, 0.0),
        Node::new("A", 10.0, 0.0, 100.0, 1.0),
        Node::new("B", 10.0, 0.0, 100.0, 1.0),
    ];
    let mut problem = Problem::new(nodes).unwrap();
    add_arcs(
        &mut problem,
        &[
            ("D", "A", 1.0, 1.0),
            ("B", "D", 1.0, 1.0),
            ("D", "B", 1.0, 5.0),
            ("B", "A", 1.0, 5.0),
            ("A", "D", 1.0, 5.0),
        ],
    );
    let config = Config::new().with_fleet_size(2);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert!(solution.is_optimal());
    // D-A-D and D-B-D beat D-B-A-D
    assert!((solution.objective.unwrap() - 12.0).abs() < 1e-6);
    assert_eq!(solution.used_vehicle_count(), 2);
    assert!(solution.arcs.iter().all(|arc| !(arc.from == 1 && arc.to == 2)));
    assert_eq!(solution.verify(&solver.problem, &solver.params), Ok(()));
}

#[test]
fn test_demand_above_fleet_capacity_is_infeasible() {
    let problem = create_two_customer_problem(50.0, (0.0, 100.0), (0.0, 100.0));
    let config = Config::new().with_vehicle_capacity(80.0).with_fleet_size(1);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert!(solution.objective.is_none());
    assert!(solution.arcs.is_empty());
}

#[test]
fn test_unreachable_window_is_infeasible() {
    let nodes = vec![
        Node::new("D", 0.0, 0.0, 1000.0, 0.0),
        Node::new("A", 1.0, 0.0, 10.0, 1.0),
    ];
    let mut problem = Problem::new(nodes).unwrap();
    add_arcs(&mut problem, &[("D", "A", 50.0, 1.0), ("A", "D", 50.0, 1.0)]);
    let config = Config::new().with_fleet_size(1);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert!(solution.arcs.is_empty());
}

#[test]
fn test_capacity_forces_several_routes() {
    let problem = create_line_problem();
    let config = Config::new().with_vehicle_capacity(60.0).with_fleet_size(2);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert!(solution.is_optimal());
    assert_eq!(solution.verify(&solver.problem, &solver.params), Ok(()));

    // 120 units of demand need two full vehicles
    let routes = solution.routes(&solver.problem).unwrap();
    assert_eq!(routes.len(), 2);
    for route in &routes {
        assert!(route.load <= 60.0 + 1e-6);
    }

    // {1, 2} out to 4 and back, {3, 4} out to 8 and back
    assert!((solution.objective.unwrap() - 24.0).abs() < 1e-6);

    let mut visited: Vec<usize> = routes.iter().flat_map(|route| route.customers().to_vec()).collect();
    visited.sort();
    assert_eq!(visited, vec![1, 2, 3, 4]);
}

#[test]
fn test_arcs_are_grouped_by_vehicle() {
    let problem = create_line_problem();
    let config = Config::new().with_vehicle_capacity(60.0).with_fleet_size(2);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    let vehicles: Vec<usize> = solution.arcs.iter().map(|arc| arc.vehicle).collect();
    let mut sorted = vehicles.clone();
    sorted.sort();
    assert_eq!(vehicles, sorted);

    for pair in solution.arcs.windows(2) {
        if pair[0].vehicle == pair[1].vehicle {
            assert!((pair[0].from, pair[0].to) < (pair[1].from, pair[1].to));
        }
    }
}

#[test]
fn test_repeated_runs_agree() {
    let problem = create_line_problem();
    let config = Config::new().with_vehicle_capacity(60.0).with_fleet_size(2);

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let first = solver.solve();
    let second = solver.solve();

    assert!((first.objective.unwrap() - second.objective.unwrap()).abs() < 1e-6);
}

#[test]
fn test_time_limit_leaves_enough_room() {
    let problem = create_two_customer_problem(10.0, (0.0, 100.0), (0.0, 100.0));
    let config = Config::new().with_fleet_size(1).with_time_limit(Duration::from_secs(60));

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert!(solution.is_optimal());
    assert!((solution.objective.unwrap() - 3.0).abs() < 1e-6);
}

#[test]
fn test_zero_time_limit_reports_time_limit() {
    let problem = create_line_problem();
    let config = Config::new()
        .with_vehicle_capacity(60.0)
        .with_fleet_size(2)
        .with_time_limit(Duration::from_secs(0));

    let solver = CvrptwSolver::new(problem, config).unwrap();
    let solution = solver.solve();

    assert_eq!(solution.status, SolveStatus::TimeLimit);
    assert!(solution.arcs.is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let problem = create_two_customer_problem(10.0, (0.0, 100.0), (0.0, 100.0));

    assert!(CvrptwSolver::new(problem, Config::new().with_fleet_size(0)).is_err());
}

#[test]
fn test_solve_from_csv_sources() {
    let nodes = "id,demand,start_time,end_time,service_time
0,0,0,100,0
1,10,0,100,1
2,10,0,100,1
";
    let links = "from_node_id,to_node_id,travel_time,link_cost
0,1,1,1
1,2,1,1
2,0,1,1
0,2,1,5
2,1,1,5
1,0,1,5
";
    let problem = load_problem(nodes.as_bytes(), links.as_bytes()).unwrap();

    let solver = CvrptwSolver::new(problem, Config::new().with_fleet_size(3)).unwrap();
    let solution = solver.solve();

    assert!(solution.is_optimal());
    assert!((solution.objective.unwrap() - 3.0).abs() < 1e-6);
    assert_eq!(solution.arcs.len(), 3);
}

#[test]
fn test_open_depot_window_solves() {
    let nodes = "id,demand,start_time,end_time,service_time
0,0,0,inf,0
1,10,0,50,1
";
    let links = "from_node_id,to_node_id,travel_time,link_cost
0,1,1,1
1,0,1,1
";
    let problem = load_problem(nodes.as_bytes(), links.as_bytes()).unwrap();

    let solver = CvrptwSolver::new(problem, Config::new().with_fleet_size(2)).unwrap();
    assert!(solver.params.big_m.is_finite());

    let solution = solver.solve();

    assert!(solution.is_optimal());
    assert!((solution.objective.unwrap() - 2.0).abs() < 1e-6);
    assert_eq!(solution.used_vehicle_count(), 1);
    assert_eq!(solution.verify(&solver.problem, &solver.params), Ok(()));
}
