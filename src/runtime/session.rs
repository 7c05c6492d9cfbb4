//! Configuration and state shared by every context of one evaluator

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::packages::Package;
use crate::parallel::WorkerPool;

/// Default number of elements staged ahead by the concurrent iterators
pub const DEFAULT_LOOKAHEAD: usize = 16;

/// Configuration for an evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Worker threads for `thread` and the prefetching iterators (default: num_cpus)
    pub worker_threads: usize,
    /// Elements staged ahead of the consumer by `prefetch`, `merge` and joined sequences
    pub lookahead: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

impl EvaluatorConfig {
    /// Default configuration overridden by `ITREX_WORKERS` and `ITREX_LOOKAHEAD`
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with("ITREX_"))
            .collect();
        Self::default().with_overrides(&vars)
    }

    /// Applies `ITREX_WORKERS` / `ITREX_LOOKAHEAD` from `vars`; values that are not
    /// positive integers are ignored
    pub fn with_overrides(mut self, vars: &HashMap<String, String>) -> Self {
        let positive = |key: &str| {
            vars.get(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
        };
        if let Some(n) = positive("ITREX_WORKERS") {
            self.worker_threads = n;
        }
        if let Some(n) = positive("ITREX_LOOKAHEAD") {
            self.lookahead = n;
        }
        self
    }
}

/// Worker pool, configuration and importable packages of one evaluator
pub struct Session {
    pool: WorkerPool,
    config: EvaluatorConfig,
    packages: DashMap<String, Arc<dyn Package>>,
}

impl Session {
    /// Session on the process-wide shared pool
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::with_pool(
            WorkerPool::shared(),
            EvaluatorConfig::default(),
        ))
    }

    /// Session with a dedicated pool built from `config`
    pub fn new(config: EvaluatorConfig) -> Result<Arc<Self>> {
        let pool = WorkerPool::new(config.worker_threads)?;
        Ok(Arc::new(Self::with_pool(pool, config)))
    }

    /// Session on an existing pool
    pub fn with_pool(pool: WorkerPool, config: EvaluatorConfig) -> Self {
        Session {
            pool,
            config,
            packages: DashMap::new(),
        }
    }

    /// Worker pool for background evaluation
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Evaluator configuration
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Makes a package importable under its name, replacing any previous one
    pub fn add_package(&self, package: Arc<dyn Package>) {
        debug!(package = package.name(), "package available");
        self.packages.insert(package.name().to_string(), package);
    }

    /// Looks up an importable package
    pub fn package(&self, name: &str) -> Option<Arc<dyn Package>> {
        self.packages.get(name).map(|p| Arc::clone(p.value()))
    }

    /// Names of all importable packages, sorted
    pub fn package_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.packages.iter().map(|p| p.key().clone()).collect();
        names.sort();
        names
    }
}
