use crate::algorithms::{format_walk, GraphAlgorithm};
use crate::error::AlgorithmError;
use crate::graph::Graph;

/// Does the graph admit an Euler circuit, and if so which one.
pub struct EulerCircuit;

impl GraphAlgorithm for EulerCircuit {
    fn name(&self) -> &'static str {
        "Euler Circuit"
    }

    fn run(&self, graph: &Graph) -> Result<String, AlgorithmError> {
        if !graph.has_euler_circuit() {
            return Ok("NO".to_string());
        }

        let circuit = graph.euler_circuit();
        if circuit.is_empty() || circuit.len() > 15 {
            Ok("YES".to_string())
        } else {
            Ok(format!("YES - Circuit: {}", format_walk(&circuit)))
        }
    }
}
