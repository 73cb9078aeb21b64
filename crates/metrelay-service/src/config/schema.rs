use serde::Deserialize;
use std::str::FromStr;

use metrelay_backends::BackendKind;
use metrelay_core::error::{MetrelayError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub service: ServiceSection,

    pub metrics: MetricsSection,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetrelayError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.metrics.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// KPI catalog path. Always explicit; there is no built-in default.
    pub catalog: String,
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        // fail at load time, not at first use
        BackendKind::from_str(&self.backend)?;
        if self.catalog.is_empty() {
            return Err(MetrelayError::BadRequest(
                "metrics.catalog must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn backend_kind(&self) -> Result<BackendKind> {
        BackendKind::from_str(&self.backend)
    }
}

fn default_listen() -> String {
    "0.0.0.0:9600".into()
}
fn default_backend() -> String {
    "prometheus".into()
}
fn default_namespace() -> String {
    "metrelay".into()
}
