//! Harness and usecase configuration.
//!
//! Every field has a default so partial JSON documents load:
//!
//! ```json
//! {
//!   "coordinator": 0,
//!   "perf": false,
//!   "tolerance": { "absolute": 1e-6, "relative": 0.0 },
//!   "mode": "Diagnostic",
//!   "gather_timeout_ms": 5000
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algs::equivalence::{Tolerance, ValidationMode};
use crate::algs::gather::GatherPolicy;
use crate::graph::compressed::Orientation;
use crate::graph::container::GraphProperties;
use crate::graph_error::GraphError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Rank that gathers results and runs the reference.
    pub coordinator: usize,
    /// Barrier before each timed phase and log phase durations.
    pub perf: bool,
    pub tolerance: Tolerance,
    pub mode: ValidationMode,
    /// Total wait bound for each gather, shared by all peers; `None` waits forever.
    pub gather_timeout_ms: Option<u64>,
    /// Verify declared symmetry / multigraph flags on the reference graph.
    pub expensive_check: bool,
    pub orientation: Orientation,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            coordinator: 0,
            perf: false,
            tolerance: Tolerance::default(),
            mode: ValidationMode::default(),
            gather_timeout_ms: None,
            expensive_check: false,
            orientation: Orientation::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json(text: &str) -> Result<Self, GraphError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        let t = self.tolerance;
        if !(t.absolute >= 0.0 && t.relative >= 0.0) {
            return Err(GraphError::Config(format!(
                "tolerance must be non-negative, got {t:?}"
            )));
        }
        if self.gather_timeout_ms == Some(0) {
            return Err(GraphError::Config("gather_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn gather_policy(&self) -> GatherPolicy {
        match self.gather_timeout_ms {
            Some(ms) => GatherPolicy::Bounded(Duration::from_millis(ms)),
            None => GatherPolicy::Unbounded,
        }
    }
}

/// Shape of the input graph under test.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphUsecase {
    pub test_weighted: bool,
    pub symmetric: bool,
    pub multigraph: bool,
    pub check_correctness: bool,
}

impl Default for GraphUsecase {
    fn default() -> Self {
        Self {
            test_weighted: false,
            symmetric: false,
            multigraph: true,
            check_correctness: true,
        }
    }
}

impl GraphUsecase {
    pub fn properties(&self) -> GraphProperties {
        GraphProperties {
            is_symmetric: self.symmetric,
            is_multigraph: self.multigraph,
        }
    }
}

/// Parameters forwarded to a [`VertexMetric`](super::VertexMetric).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricParams {
    pub normalized: bool,
    pub include_endpoints: bool,
}

/// One vertex-metric reconciliation run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricUsecase {
    /// Total seeds over all ranks; `None` runs the metric unseeded.
    pub num_seeds: Option<usize>,
    pub params: MetricParams,
    pub check_correctness: bool,
}

impl Default for MetricUsecase {
    fn default() -> Self {
        Self {
            num_seeds: None,
            params: MetricParams::default(),
            check_correctness: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = HarnessConfig::from_json(
            r#"{ "coordinator": 1, "tolerance": { "absolute": 1e-4 }, "gather_timeout_ms": 250 }"#,
        )
        .unwrap();
        assert_eq!(cfg.coordinator, 1);
        assert_eq!(cfg.tolerance, Tolerance::absolute(1e-4));
        assert_eq!(cfg.mode, ValidationMode::Diagnostic);
        assert_eq!(cfg.gather_policy(), GatherPolicy::Bounded(Duration::from_millis(250)));
        assert_eq!(HarnessConfig::default().gather_policy(), GatherPolicy::Unbounded);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(matches!(
            HarnessConfig::from_json("{ \"coordinator\": -1 }"),
            Err(GraphError::Config(_))
        ));
        assert!(matches!(
            HarnessConfig::from_json(r#"{ "tolerance": { "relative": -1.0 } }"#),
            Err(GraphError::Config(_))
        ));
    }

    #[test]
    fn usecase_properties() {
        let u: GraphUsecase = serde_json::from_str(r#"{ "symmetric": true }"#).unwrap();
        assert!(u.properties().is_symmetric);
        assert!(u.properties().is_multigraph);
        assert!(u.check_correctness);
    }
}
