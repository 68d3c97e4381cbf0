//! # Wire Text
//!
//! Parsing and rendering for the line protocol: one newline-terminated
//! request per line, `vertices edges u1-v1 u2-v2 ...`, answered with a
//! multi-line result block. Parsing is split in two so the pipeline can
//! run the syntactic and semantic halves in different stages; the
//! leader-follower engine runs both back to back.

use crate::algorithms::ComputeReport;
use crate::concurrency::{RequestId, StatsSnapshot};
use crate::error::{GraphError, ProtocolError};
use crate::graph::Graph;

/// Syntactically parsed request: counts plus raw edge pairs. Vertex
/// ranges are not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSpec {
    pub vertices: usize,
    pub edges: Vec<(usize, usize)>,
}

/// Tokenize one request line: leading `vertices edges` counts followed by
/// exactly `edges` `u-v` tokens.
pub fn parse_spec(input: &str) -> Result<GraphSpec, ProtocolError> {
    let mut tokens = input.split_whitespace();

    let vertices: usize = tokens
        .next()
        .ok_or(ProtocolError::MissingCounts)?
        .parse()
        .map_err(|_| ProtocolError::MissingCounts)?;
    let edge_count: usize = tokens
        .next()
        .ok_or(ProtocolError::MissingCounts)?
        .parse()
        .map_err(|_| ProtocolError::MissingCounts)?;

    if vertices == 0 {
        return Err(ProtocolError::InvalidCounts);
    }

    let mut edges = Vec::with_capacity(edge_count);
    for found in 0..edge_count {
        let token = tokens
            .next()
            .ok_or(ProtocolError::MissingEdges { expected: edge_count, found })?;
        let (u, v) = token
            .split_once('-')
            .ok_or_else(|| ProtocolError::BadEdge { token: token.to_string() })?;
        let u: usize = u.parse().map_err(|_| ProtocolError::BadEdge { token: token.to_string() })?;
        let v: usize = v.parse().map_err(|_| ProtocolError::BadEdge { token: token.to_string() })?;
        edges.push((u, v));
    }

    Ok(GraphSpec { vertices, edges })
}

/// Semantic half: range-check every endpoint and build the graph.
pub fn build_graph(spec: &GraphSpec) -> Result<Graph, ProtocolError> {
    let mut graph = Graph::new(spec.vertices, false).map_err(|_| ProtocolError::InvalidCounts)?;
    for &(u, v) in &spec.edges {
        graph.add_edge(u, v).map_err(|e| match e {
            GraphError::InvalidVertex { vertex, vertices } => {
                ProtocolError::VertexOutOfRange { vertex, max: vertices.saturating_sub(1) }
            }
            _ => ProtocolError::InvalidCounts,
        })?;
    }
    Ok(graph)
}

/// Both halves back to back.
pub fn parse_request(input: &str) -> Result<Graph, ProtocolError> {
    build_graph(&parse_spec(input)?)
}

/// The aggregated result block for one request.
pub fn format_report(graph: &Graph, report: &ComputeReport) -> String {
    let mut out = String::new();
    out.push_str("\n=== GRAPH ANALYSIS RESULTS ===\n");
    out.push_str(&format!(
        "Graph: {} vertices, {} edges\n\n",
        graph.vertex_count(),
        graph.edge_count()
    ));

    for (position, run) in report.runs.iter().enumerate() {
        out.push_str(&format!("{}. {}: ", position + 1, run.name.to_uppercase()));
        match &run.outcome {
            Ok(result) => out.push_str(&format!("{} ({}us)\n", result, run.elapsed_micros)),
            Err(error) => out.push_str(&format!("ERROR - {}\n", error)),
        }
    }

    out.push_str(&format!("\nTotal execution time: {}us", report.total_micros));
    out.push_str("\n==============================");
    out
}

/// The error block for a request that never reached the compute stage.
pub fn format_error(request_id: RequestId, message: &str) -> String {
    format!(
        "\n=== REQUEST ERROR (Request {}) ===\n{}\n==============================",
        request_id, message
    )
}

/// The `stats` command answer.
pub fn format_stats(snapshot: &StatsSnapshot, connections: u64) -> String {
    let mut out = String::new();
    out.push_str("\n=== SERVER STATISTICS ===\n");
    out.push_str(&format!("Engine: {}\n", snapshot.engine));
    out.push_str(&format!("Connections: {}\n", connections));
    out.push_str(&format!("Submitted: {}\n", snapshot.submitted));
    out.push_str(&format!("Completed: {}\n", snapshot.completed));
    out.push_str(&format!("Errors: {}\n", snapshot.errors));
    out.push_str(&format!("Queued: {}\n", snapshot.queued));

    if !snapshot.workers.is_empty() {
        out.push_str(&format!("Leader promotions: {}\n", snapshot.leader_promotions));
        for worker in &snapshot.workers {
            out.push_str(&format!("Worker {}: {} processed\n", worker.worker, worker.processed));
        }
    }
    for stage in &snapshot.stages {
        out.push_str(&format!(
            "Stage {}: {} processed, {} queued\n",
            stage.stage, stage.processed, stage.queued
        ));
    }
    out.push_str("=========================");
    out
}

/// Greeting sent once per connection.
pub fn banner() -> String {
    "=== graphserve ===\n\
     Format: vertices edges edge1 edge2 ...\n\
     Example: 3 3 0-1 1-2 2-0\n\
     Every request runs all 4 algorithms:\n\
     - Euler Circuit\n\
     - Max Clique\n\
     - MST Weight\n\
     - Hamilton Circuit\n\
     Commands: help, stats, quit"
        .to_string()
}
