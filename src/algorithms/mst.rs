use crate::algorithms::GraphAlgorithm;
use crate::error::AlgorithmError;
use crate::graph::Graph;

/// Minimum-spanning-tree weight via Kruskal over unit edge weights.
pub struct MstWeight;

impl GraphAlgorithm for MstWeight {
    fn name(&self) -> &'static str {
        "MST Weight"
    }

    fn run(&self, graph: &Graph) -> Result<String, AlgorithmError> {
        if graph.is_directed() {
            return Err(AlgorithmError::DirectedUnsupported { algorithm: "MST" });
        }
        if !graph.is_connected() {
            return Err(AlgorithmError::NotConnected);
        }

        let n = graph.vertex_count();
        if n <= 1 {
            return Ok("Weight: 0 (trivial case)".to_string());
        }

        // Unit weights make sorting a no-op; union-find does the rest.
        let mut forest = UnionFind::new(n);
        let mut weight = 0usize;
        let mut picked = Vec::new();

        for (u, v) in graph.edges() {
            if forest.unite(u, v) {
                weight += 1;
                picked.push((u, v));
                if picked.len() == n - 1 {
                    break;
                }
            }
        }

        let mut out = format!("Weight: {} (Edges: {})", weight, picked.len());
        if picked.len() <= 8 {
            let rendered: Vec<String> =
                picked.iter().map(|(u, v)| format!("{}-{}", u, v)).collect();
            out.push_str(&format!(" - MST edges: {}", rendered.join(",")));
        }
        Ok(out)
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    /// Join the two sets; false when already joined.
    fn unite(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return false;
        }
        if self.rank[rx] < self.rank[ry] {
            self.parent[rx] = ry;
        } else if self.rank[rx] > self.rank[ry] {
            self.parent[ry] = rx;
        } else {
            self.parent[ry] = rx;
            self.rank[rx] += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_weighs_two() {
        let mut g = Graph::new(3, false).unwrap();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 0).unwrap();

        let out = MstWeight.run(&g).unwrap();
        assert!(out.starts_with("Weight: 2 (Edges: 2)"), "{}", out);
    }

    #[test]
    fn disconnected_graph_is_rejected() {
        let mut g = Graph::new(4, false).unwrap();
        g.add_edge(0, 1).unwrap();
        assert_eq!(MstWeight.run(&g), Err(AlgorithmError::NotConnected));
    }

    #[test]
    fn single_vertex_is_trivial() {
        let g = Graph::new(1, false).unwrap();
        assert_eq!(MstWeight.run(&g).unwrap(), "Weight: 0 (trivial case)");
    }

    #[test]
    fn spanning_tree_covers_all_vertices() {
        let mut g = Graph::new(5, false).unwrap();
        for u in 0..5 {
            for v in (u + 1)..5 {
                g.add_edge(u, v).unwrap();
            }
        }
        let out = MstWeight.run(&g).unwrap();
        assert!(out.starts_with("Weight: 4 (Edges: 4)"), "{}", out);
    }
}
