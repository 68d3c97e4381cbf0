use crate::algorithms::{format_walk, GraphAlgorithm};
use crate::error::AlgorithmError;
use crate::graph::Graph;

const MAX_VERTICES: usize = 10;

/// Hamiltonian circuit by backtracking from vertex 0.
pub struct HamiltonCircuit;

impl GraphAlgorithm for HamiltonCircuit {
    fn name(&self) -> &'static str {
        "Hamilton Circuit"
    }

    fn run(&self, graph: &Graph) -> Result<String, AlgorithmError> {
        let n = graph.vertex_count();
        if n > MAX_VERTICES {
            return Err(AlgorithmError::TooLarge {
                algorithm: "Hamilton circuit",
                max: MAX_VERTICES,
            });
        }

        let mut path = vec![0usize; n];
        let mut visited = vec![false; n];
        visited[0] = true;

        let found = extend(graph, &mut path, &mut visited, 1);
        if !found {
            return Ok("NO".to_string());
        }

        if n <= 8 {
            let mut closed = path.clone();
            closed.push(path[0]);
            Ok(format!("YES - Circuit: {}", format_walk(&closed)))
        } else {
            Ok(format!("YES - Circuit found (length: {})", n))
        }
    }
}

fn extend(graph: &Graph, path: &mut [usize], visited: &mut [bool], pos: usize) -> bool {
    let n = graph.vertex_count();
    if pos == n {
        return graph.has_edge(path[pos - 1], path[0]);
    }

    for v in 1..n {
        if !visited[v] && graph.has_edge(path[pos - 1], v) {
            path[pos] = v;
            visited[v] = true;
            if extend(graph, path, visited, pos + 1) {
                return true;
            }
            visited[v] = false;
        }
    }
    false
}
