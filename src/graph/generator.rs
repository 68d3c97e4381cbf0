//! Seeded graph shapes for tests, demos and stress runs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::GraphError;
use crate::graph::Graph;

/// Deterministic generator: the same seed always yields the same graphs.
#[derive(Debug)]
pub struct GraphGenerator {
    rng: StdRng,
}

impl GraphGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Maximum number of distinct edges (self-loops excluded).
    pub fn max_edges(vertices: usize, directed: bool) -> usize {
        if vertices <= 1 {
            return 0;
        }
        if directed {
            vertices * (vertices - 1)
        } else {
            vertices * (vertices - 1) / 2
        }
    }

    /// Uniformly random graph with exactly `edges` edges.
    pub fn random(&mut self, vertices: usize, edges: usize, directed: bool) -> Result<Graph, GraphError> {
        let max = Self::max_edges(vertices, directed);
        if edges > max {
            return Err(GraphError::TooManyEdges { requested: edges, max });
        }

        let mut graph = Graph::new(vertices, directed)?;
        let mut candidates = all_edges(vertices, directed);
        candidates.shuffle(&mut self.rng);

        for (u, v) in candidates.into_iter().take(edges) {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    /// Connected graph: a random spanning tree plus random extra edges.
    pub fn connected(&mut self, vertices: usize, edges: usize, directed: bool) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(vertices, directed)?;
        if vertices == 1 {
            return Ok(graph);
        }
        if edges + 1 < vertices {
            return Err(GraphError::NotEnoughEdges { vertices, edges });
        }

        let mut order: Vec<usize> = (0..vertices).collect();
        order.shuffle(&mut self.rng);

        for i in 1..vertices {
            let parent = order[self.rng.gen_range(0..i)];
            graph.add_edge(parent, order[i])?;
        }

        let mut extra: Vec<(usize, usize)> = all_edges(vertices, directed)
            .into_iter()
            .filter(|&(u, v)| !graph.has_edge(u, v))
            .collect();
        extra.shuffle(&mut self.rng);

        for (u, v) in extra.into_iter().take(edges.saturating_sub(vertices - 1)) {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    pub fn complete(&mut self, vertices: usize, directed: bool) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(vertices, directed)?;
        for (u, v) in all_edges(vertices, directed) {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    pub fn cycle(&mut self, vertices: usize, directed: bool) -> Result<Graph, GraphError> {
        if vertices < 3 {
            return Err(GraphError::TooFewVertices { shape: "cycle", min: 3 });
        }
        let mut graph = Graph::new(vertices, directed)?;
        for i in 0..vertices {
            graph.add_edge(i, (i + 1) % vertices)?;
        }
        Ok(graph)
    }

    pub fn path(&mut self, vertices: usize, directed: bool) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(vertices, directed)?;
        for i in 0..vertices.saturating_sub(1) {
            graph.add_edge(i, i + 1)?;
        }
        Ok(graph)
    }

    pub fn star(&mut self, vertices: usize, directed: bool) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(vertices, directed)?;
        for i in 1..vertices {
            graph.add_edge(0, i)?;
        }
        Ok(graph)
    }

    /// Undirected graph guaranteed to contain an Euler circuit: a full
    /// cycle plus degree-preserving triangles until at least `edges`
    /// edges exist (best effort, never fewer than the cycle).
    pub fn eulerian(&mut self, vertices: usize, edges: usize) -> Result<Graph, GraphError> {
        if vertices < 3 {
            return Err(GraphError::TooFewVertices { shape: "eulerian", min: 3 });
        }

        let mut graph = self.cycle(vertices, false)?;

        let mut triples: Vec<(usize, usize, usize)> = Vec::new();
        for a in 0..vertices {
            for b in (a + 1)..vertices {
                for c in (b + 1)..vertices {
                    triples.push((a, b, c));
                }
            }
        }
        triples.shuffle(&mut self.rng);

        for (a, b, c) in triples {
            if graph.edge_count() >= edges {
                break;
            }
            // A whole triangle keeps every degree even.
            if !graph.has_edge(a, b) && !graph.has_edge(b, c) && !graph.has_edge(a, c) {
                graph.add_edge(a, b)?;
                graph.add_edge(b, c)?;
                graph.add_edge(a, c)?;
            }
        }
        Ok(graph)
    }
}

fn all_edges(vertices: usize, directed: bool) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for u in 0..vertices {
        for v in 0..vertices {
            if u == v {
                continue;
            }
            if directed || u < v {
                edges.push((u, v));
            }
        }
    }
    edges
}
