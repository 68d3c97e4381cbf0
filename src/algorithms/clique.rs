use crate::algorithms::GraphAlgorithm;
use crate::error::AlgorithmError;
use crate::graph::Graph;

const MAX_VERTICES: usize = 10;

/// Exact maximum clique by branch and bound. Only worth running on the
/// small graphs this server accepts, hence the hard vertex cap.
pub struct MaxClique;

impl GraphAlgorithm for MaxClique {
    fn name(&self) -> &'static str {
        "Max Clique"
    }

    fn run(&self, graph: &Graph) -> Result<String, AlgorithmError> {
        if graph.is_directed() {
            return Err(AlgorithmError::DirectedUnsupported { algorithm: "max clique" });
        }
        if graph.vertex_count() > MAX_VERTICES {
            return Err(AlgorithmError::TooLarge { algorithm: "max clique", max: MAX_VERTICES });
        }

        let candidates: Vec<usize> = (0..graph.vertex_count()).collect();
        let mut current = Vec::new();
        let mut best = Vec::new();
        search(graph, &mut current, candidates, &mut best);

        let mut out = format!("Size: {}", best.len());
        if !best.is_empty() && best.len() <= 8 {
            let members: Vec<String> = best.iter().map(|v| v.to_string()).collect();
            out.push_str(&format!(" - Vertices: {{{}}}", members.join(",")));
        }
        Ok(out)
    }
}

fn search(graph: &Graph, current: &mut Vec<usize>, candidates: Vec<usize>, best: &mut Vec<usize>) {
    if candidates.is_empty() {
        if current.len() > best.len() {
            *best = current.clone();
        }
        return;
    }
    // Bound: even taking every candidate cannot beat the best so far.
    if current.len() + candidates.len() <= best.len() {
        return;
    }

    let vertex = candidates[0];
    let rest = candidates[1..].to_vec();

    current.push(vertex);
    let narrowed: Vec<usize> = rest
        .iter()
        .copied()
        .filter(|&c| current.iter().all(|&member| graph.has_edge(c, member)))
        .collect();
    search(graph, current, narrowed, best);
    current.pop();

    search(graph, current, rest, best);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_is_its_own_max_clique() {
        let mut g = Graph::new(3, false).unwrap();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 0).unwrap();

        let out = MaxClique.run(&g).unwrap();
        assert!(out.starts_with("Size: 3"), "{}", out);
        assert!(out.contains("{0,1,2}"), "{}", out);
    }

    #[test]
    fn finds_embedded_clique() {
        // 4-clique {0,1,2,3} plus a pendant vertex.
        let mut g = Graph::new(5, false).unwrap();
        for u in 0..4 {
            for v in (u + 1)..4 {
                g.add_edge(u, v).unwrap();
            }
        }
        g.add_edge(3, 4).unwrap();

        let out = MaxClique.run(&g).unwrap();
        assert!(out.starts_with("Size: 4"), "{}", out);
    }

    #[test]
    fn rejects_directed_graphs() {
        let g = Graph::new(3, true).unwrap();
        assert!(matches!(
            MaxClique.run(&g),
            Err(AlgorithmError::DirectedUnsupported { .. })
        ));
    }

    #[test]
    fn rejects_oversized_graphs() {
        let g = Graph::new(11, false).unwrap();
        assert!(matches!(MaxClique.run(&g), Err(AlgorithmError::TooLarge { max: 10, .. })));
    }

    #[test]
    fn edgeless_graph_has_singleton_clique() {
        let g = Graph::new(3, false).unwrap();
        let out = MaxClique.run(&g).unwrap();
        assert!(out.starts_with("Size: 1"), "{}", out);
    }
}
