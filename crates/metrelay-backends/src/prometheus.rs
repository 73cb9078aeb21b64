//! Pull-style backend over the `prometheus` client crate.
//!
//! Metric state lives in-process inside a private `prometheus::Registry`;
//! mutation is an in-memory update. `push_to_gateway` is the only network
//! path: it encodes the registry in text exposition format and POSTs it to a
//! Pushgateway, bounded by a 5-second timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

use metrelay_core::capability::{Backend, LabelSet, Metric, MetricKind};
use metrelay_core::error::{MetrelayError, Result};

const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Project the supplied label set onto the declared keys, erroring on a
/// missing key. Extra keys in `labels` are ignored.
fn label_view<'a>(
    keys: &'a [String],
    labels: &'a LabelSet,
) -> Result<HashMap<&'a str, &'a str>> {
    let mut view = HashMap::with_capacity(keys.len());
    for key in keys {
        let value = labels
            .get(key)
            .ok_or_else(|| MetrelayError::MissingLabel(key.clone()))?;
        view.insert(key.as_str(), value.as_str());
    }
    Ok(view)
}

struct PrometheusCounter {
    counter: CounterVec,
    label_keys: Vec<String>,
}

impl Metric for PrometheusCounter {
    fn inc(&self, labels: &LabelSet) -> Result<()> {
        let view = label_view(&self.label_keys, labels)?;
        self.counter
            .get_metric_with(&view)
            .map_err(|e| MetrelayError::InvalidLabel(e.to_string()))?
            .inc();
        Ok(())
    }

    fn dec(&self, _labels: &LabelSet) -> Result<()> {
        Err(MetrelayError::InvalidOperation("dec on Counter".into()))
    }

    fn add(&self, value: f64, labels: &LabelSet) -> Result<()> {
        if value < 0.0 {
            return Err(MetrelayError::InvalidOperation(
                "negative add on Counter".into(),
            ));
        }
        let view = label_view(&self.label_keys, labels)?;
        self.counter
            .get_metric_with(&view)
            .map_err(|e| MetrelayError::InvalidLabel(e.to_string()))?
            .inc_by(value);
        Ok(())
    }

    fn set(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
        Err(MetrelayError::InvalidOperation("set on Counter".into()))
    }

    fn observe(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
        Err(MetrelayError::InvalidOperation("observe on Counter".into()))
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Counter
    }
}

struct PrometheusGauge {
    gauge: GaugeVec,
    label_keys: Vec<String>,
}

impl PrometheusGauge {
    fn with(&self, labels: &LabelSet) -> Result<prometheus::Gauge> {
        let view = label_view(&self.label_keys, labels)?;
        self.gauge
            .get_metric_with(&view)
            .map_err(|e| MetrelayError::InvalidLabel(e.to_string()))
    }
}

impl Metric for PrometheusGauge {
    fn inc(&self, labels: &LabelSet) -> Result<()> {
        self.with(labels)?.inc();
        Ok(())
    }

    fn dec(&self, labels: &LabelSet) -> Result<()> {
        self.with(labels)?.dec();
        Ok(())
    }

    fn add(&self, value: f64, labels: &LabelSet) -> Result<()> {
        self.with(labels)?.add(value);
        Ok(())
    }

    fn set(&self, value: f64, labels: &LabelSet) -> Result<()> {
        self.with(labels)?.set(value);
        Ok(())
    }

    fn observe(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
        Err(MetrelayError::InvalidOperation("observe on Gauge".into()))
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
}

/// In-process collector with explicit Pushgateway flush.
#[derive(Default)]
pub struct PrometheusBackend {
    registry: Registry,
}

impl PrometheusBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the internal registry.
    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    fn encode_text(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| MetrelayError::Backend(format!("encode: {e}")))?;
        Ok(buf)
    }
}

/// The vec constructors race only when two bulk registrations run
/// concurrently; the name registry resolves the winner, so a collector that
/// is already present is returned as-is rather than surfaced as an error.
fn register_collector<C: prometheus::core::Collector + Clone + 'static>(
    registry: &Registry,
    collector: C,
) -> Result<C> {
    match registry.register(Box::new(collector.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(collector),
        Err(e) => Err(MetrelayError::Backend(e.to_string())),
    }
}

/// `prometheus` rejects empty help strings; fall back to the metric name.
fn help_or_name<'a>(description: &'a str, name: &'a str) -> &'a str {
    if description.is_empty() {
        name
    } else {
        description
    }
}

impl Backend for PrometheusBackend {
    fn new_counter(
        &self,
        name: &str,
        description: &str,
        label_keys: &[String],
    ) -> Result<Arc<dyn Metric>> {
        let refs: Vec<&str> = label_keys.iter().map(String::as_str).collect();
        let vec = CounterVec::new(Opts::new(name, help_or_name(description, name)), &refs)
            .map_err(|e| MetrelayError::Backend(e.to_string()))?;
        let counter = register_collector(&self.registry, vec)?;
        Ok(Arc::new(PrometheusCounter {
            counter,
            label_keys: label_keys.to_vec(),
        }))
    }

    fn new_gauge(
        &self,
        name: &str,
        description: &str,
        label_keys: &[String],
    ) -> Result<Arc<dyn Metric>> {
        let refs: Vec<&str> = label_keys.iter().map(String::as_str).collect();
        let vec = GaugeVec::new(Opts::new(name, help_or_name(description, name)), &refs)
            .map_err(|e| MetrelayError::Backend(e.to_string()))?;
        let gauge = register_collector(&self.registry, vec)?;
        Ok(Arc::new(PrometheusGauge {
            gauge,
            label_keys: label_keys.to_vec(),
        }))
    }

    fn new_histogram(
        &self,
        _name: &str,
        _description: &str,
        _label_keys: &[String],
        _buckets: &[f64],
    ) -> Result<Arc<dyn Metric>> {
        Err(MetrelayError::BackendNotSupported("histogram".into()))
    }

    fn push_to_gateway(&self, gateway_url: &str, job_name: &str) -> Result<()> {
        let base = gateway_url.trim_end_matches('/');
        let url = if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}/metrics/job/{job_name}")
        } else {
            format!("http://{base}/metrics/job/{job_name}")
        };

        let body = self.encode_text()?;
        // blocking client, scoped to this call; callers in async contexts
        // must run push on a blocking thread
        let http = reqwest::blocking::Client::builder()
            .timeout(PUSH_TIMEOUT)
            .build()
            .map_err(|e| MetrelayError::Backend(format!("http client: {e}")))?;
        let resp = http
            .post(&url)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(body)
            .send()
            .map_err(|e| MetrelayError::Transport(format!("push failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(MetrelayError::Transport(format!(
                "push failed: gateway returned {}",
                resp.status()
            )));
        }
        tracing::debug!(%url, "pushed metrics to gateway");
        Ok(())
    }
}
