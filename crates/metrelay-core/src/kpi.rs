//! KPI catalog: the immutable list of measurement definitions.
//!
//! The catalog is parsed once from a caller-supplied JSON source at startup
//! and held immutably by the framework. Each entry declares the metric kind
//! and the label keys a mutation must carry.

use serde::Deserialize;

use crate::capability::MetricKind;
use crate::error::{MetrelayError, Result};
use crate::normalize::normalize_metric_name;

/// A single KPI definition.
///
/// Wire names follow the catalog file format: camelCase `displayName`,
/// snake_case `nf_type`. The kind key is `metric_kind`, with
/// `prometheus_type` accepted as a legacy alias.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Kpi {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, rename = "type")]
    pub kpi_type: String,
    /// Required label keys, in declaration order.
    #[serde(default)]
    pub object: Vec<String>,
    #[serde(rename = "metric_kind", alias = "prometheus_type")]
    pub kind: MetricKind,
    #[serde(default)]
    pub nf_type: String,
    #[serde(default)]
    pub increment: bool,
    #[serde(default)]
    pub decrement: bool,
}

impl Kpi {
    /// The canonical registry key for this definition.
    pub fn metric_name(&self) -> String {
        normalize_metric_name(&self.display_name)
    }
}

/// Ordered, validated collection of KPI definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kpis: Vec<Kpi>,
}

impl std::str::FromStr for Catalog {
    type Err = MetrelayError;

    /// Parse a catalog from a JSON string and validate it.
    fn from_str(s: &str) -> Result<Self> {
        let kpis: Vec<Kpi> = serde_json::from_str(s)
            .map_err(|e| MetrelayError::Catalog(format!("invalid catalog json: {e}")))?;
        Self::from_kpis(kpis)
    }
}

impl Catalog {
    /// Read and parse a catalog file. The path is always caller-supplied.
    pub fn from_file(path: &str) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| MetrelayError::Catalog(format!("read {path} failed: {e}")))?;
        s.parse()
    }

    /// Build from already-parsed definitions, enforcing the uniqueness
    /// invariant: `normalize(displayName)` must not collide across entries.
    pub fn from_kpis(kpis: Vec<Kpi>) -> Result<Self> {
        let mut seen: Vec<String> = Vec::with_capacity(kpis.len());
        for kpi in &kpis {
            let name = kpi.metric_name();
            if name.is_empty() {
                return Err(MetrelayError::Catalog(format!(
                    "KPI '{}' normalizes to an empty metric name",
                    kpi.display_name
                )));
            }
            if seen.contains(&name) {
                return Err(MetrelayError::Catalog(format!(
                    "duplicate normalized metric name: {name}"
                )));
            }
            seen.push(name);
        }
        Ok(Self { kpis })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Kpi> {
        self.kpis.iter()
    }

    pub fn len(&self) -> usize {
        self.kpis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty()
    }

    /// Look up the definition owning a normalized metric name.
    pub fn find(&self, metric_name: &str) -> Option<&Kpi> {
        self.kpis.iter().find(|k| k.metric_name() == metric_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "name": "cpu_usage",
            "displayName": "CPU Usage (Percent)",
            "description": "CPU usage of the node",
            "unit": "percent",
            "object": ["node"],
            "metric_kind": "Gauge"
        },
        {
            "name": "sessions_5g",
            "displayName": "5G Sessions",
            "description": "Active 5G sessions",
            "object": ["node", "cell"],
            "prometheus_type": "Counter",
            "increment": true
        }
    ]"#;

    #[test]
    fn parses_sample_catalog() {
        let cat = SAMPLE.parse::<Catalog>().expect("must parse");
        assert_eq!(cat.len(), 2);

        let cpu = cat.find("cpu_usage_percent").expect("cpu kpi");
        assert_eq!(cpu.kind, MetricKind::Gauge);
        assert_eq!(cpu.object, vec!["node"]);

        // legacy alias for the kind key
        let sessions = cat.find("g5g_sessions").expect("sessions kpi");
        assert_eq!(sessions.kind, MetricKind::Counter);
        assert!(sessions.increment);
    }

    #[test]
    fn rejects_duplicate_normalized_names() {
        let dup = r#"[
            {"name": "a", "displayName": "CPU Usage", "metric_kind": "Gauge"},
            {"name": "b", "displayName": "cpu-usage", "metric_kind": "Counter"}
        ]"#;
        let err = dup.parse::<Catalog>().expect_err("must collide");
        assert!(matches!(err, MetrelayError::Catalog(_)));
    }

    #[test]
    fn rejects_unknown_kind() {
        let bad = r#"[{"name": "a", "displayName": "X", "metric_kind": "Summary"}]"#;
        assert!(bad.parse::<Catalog>().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!("{ not json".parse::<Catalog>().is_err());
    }
}
