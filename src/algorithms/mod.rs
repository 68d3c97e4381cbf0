//! # Graph Algorithms
//!
//! The compute capability consumed by both execution engines: four
//! independent analyses behind one trait, registered in an
//! [`AlgorithmSuite`] and always run together against one graph.

mod clique;
mod euler;
mod hamilton;
mod mst;

pub use clique::MaxClique;
pub use euler::EulerCircuit;
pub use hamilton::HamiltonCircuit;
pub use mst::MstWeight;

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::error;

use crate::error::AlgorithmError;
use crate::graph::Graph;

/// One graph analysis. Expected failures (wrong graph kind, size limits)
/// come back as `Err`; panics are the caller's concern and are caught at
/// the suite boundary.
pub trait GraphAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, graph: &Graph) -> Result<String, AlgorithmError>;
}

/// Outcome of a single timed run.
#[derive(Debug, Clone)]
pub struct AlgorithmRun {
    pub name: &'static str,
    pub outcome: Result<String, AlgorithmError>,
    pub elapsed_micros: u64,
}

/// All runs for one request plus the wall-clock total.
#[derive(Debug, Clone)]
pub struct ComputeReport {
    pub runs: Vec<AlgorithmRun>,
    pub total_micros: u64,
}

/// Registry of the analyses applied to every request. Runs are mutually
/// independent: a failing algorithm never aborts its siblings.
pub struct AlgorithmSuite {
    algorithms: Vec<Box<dyn GraphAlgorithm>>,
}

impl AlgorithmSuite {
    /// The standard four: Euler circuit, max clique, MST weight, Hamilton
    /// circuit.
    pub fn standard() -> Self {
        Self {
            algorithms: vec![
                Box::new(EulerCircuit),
                Box::new(MaxClique),
                Box::new(MstWeight),
                Box::new(HamiltonCircuit),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    /// Run every registered algorithm against `graph`, timing each one.
    /// A panicking algorithm is caught here, logged, and reported as a
    /// fault outcome so its siblings still complete.
    pub fn compute(&self, graph: &Graph) -> ComputeReport {
        let started = Instant::now();
        let mut runs = Vec::with_capacity(self.algorithms.len());

        for algorithm in &self.algorithms {
            let name = algorithm.name();
            let run_started = Instant::now();
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| algorithm.run(graph))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("{} panicked: {}", name, message);
                    Err(AlgorithmError::Fault(message))
                }
            };
            runs.push(AlgorithmRun {
                name,
                outcome,
                elapsed_micros: run_started.elapsed().as_micros() as u64,
            });
        }

        ComputeReport { runs, total_micros: started.elapsed().as_micros() as u64 }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Render a circuit as `a->b->c`.
pub(crate) fn format_walk(walk: &[usize]) -> String {
    walk.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("->")
}
