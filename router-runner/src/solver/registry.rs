//! Name-based solver lookup

use router_core::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Solver;

/// Solvers available to the manager, keyed by [`Solver::name`]
#[derive(Default, Clone)]
pub struct SolverRegistry {
    solvers: HashMap<String, Arc<dyn Solver>>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solver, replacing any solver registered under the same name
    pub fn register(&mut self, solver: Arc<dyn Solver>) {
        self.solvers.insert(solver.name().to_string(), solver);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, solver: Arc<dyn Solver>) -> Self {
        self.register(solver);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Solver>> {
        self.solvers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("solver {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.solvers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.solvers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverRegistry")
            .field("solvers", &self.names())
            .finish()
    }
}
