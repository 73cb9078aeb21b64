//! Push-style backend speaking the DogStatsD datagram protocol.
//!
//! Every mutation is transmitted immediately to the collector agent as one
//! fire-and-forget UDP datagram; no state is aggregated locally. The agent
//! address and an optional `service:` tag are resolved from the process
//! environment at construction time.

use std::net::UdpSocket;
use std::sync::Arc;

use metrelay_core::capability::{Backend, LabelSet, Metric, MetricKind};
use metrelay_core::error::{MetrelayError, Result};

/// Agent address override; defaults to the local agent.
const AGENT_ADDR_ENV: &str = "DD_AGENT_ADDR";
const DEFAULT_AGENT_ADDR: &str = "127.0.0.1:8125";
/// Service name propagated as a constant `service:` tag.
const SERVICE_ENV: &str = "DD_SERVICE";

struct DogstatsdClient {
    socket: UdpSocket,
    namespace: String,
    constant_tags: Vec<String>,
}

impl DogstatsdClient {
    fn connect(addr: &str, namespace: &str, constant_tags: Vec<String>) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| MetrelayError::Backend(format!("bind udp socket: {e}")))?;
        socket
            .connect(addr)
            .map_err(|e| MetrelayError::Backend(format!("connect agent {addr}: {e}")))?;
        Ok(Self {
            socket,
            namespace: namespace.to_string(),
            constant_tags,
        })
    }

    /// Serialize one sample as `<ns>.<name>:<value>|<type>|#<tags>` and send
    /// it. Tags are sorted so datagrams are deterministic.
    fn send(&self, name: &str, value: &str, type_code: &str, labels: &LabelSet) -> Result<()> {
        let mut datagram = if self.namespace.is_empty() {
            format!("{name}:{value}|{type_code}")
        } else {
            format!("{}.{name}:{value}|{type_code}", self.namespace)
        };

        let mut tags: Vec<String> = self
            .constant_tags
            .iter()
            .cloned()
            .chain(labels.iter().map(|(k, v)| format!("{k}:{v}")))
            .collect();
        if !tags.is_empty() {
            tags.sort();
            datagram.push_str("|#");
            datagram.push_str(&tags.join(","));
        }

        self.socket
            .send(datagram.as_bytes())
            .map_err(|e| MetrelayError::Transport(format!("send to agent: {e}")))?;
        Ok(())
    }
}

struct DatadogMetric {
    client: Arc<DogstatsdClient>,
    name: String,
    kind: MetricKind,
}

impl Metric for DatadogMetric {
    fn inc(&self, labels: &LabelSet) -> Result<()> {
        self.client.send(&self.name, "1", "c", labels)
    }

    fn dec(&self, labels: &LabelSet) -> Result<()> {
        if self.kind == MetricKind::Counter {
            return Err(MetrelayError::InvalidOperation("dec on Counter".into()));
        }
        self.client.send(&self.name, "-1", "c", labels)
    }

    fn add(&self, value: f64, labels: &LabelSet) -> Result<()> {
        // counts are integral on the wire
        self.client
            .send(&self.name, &format!("{}", value as i64), "c", labels)
    }

    fn set(&self, value: f64, labels: &LabelSet) -> Result<()> {
        if self.kind == MetricKind::Counter {
            return Err(MetrelayError::InvalidOperation("set on Counter".into()));
        }
        self.client
            .send(&self.name, &format!("{value}"), "g", labels)
    }

    fn observe(&self, _value: f64, _labels: &LabelSet) -> Result<()> {
        Err(MetrelayError::InvalidOperation(format!(
            "observe on {}",
            self.kind
        )))
    }

    fn kind(&self) -> MetricKind {
        self.kind
    }
}

/// Direct-to-agent variant: one datagram per mutation, no local aggregation.
pub struct DatadogBackend {
    client: Arc<DogstatsdClient>,
}

impl DatadogBackend {
    /// Agent address and service tag come from the process environment
    /// (`DD_AGENT_ADDR`, `DD_SERVICE`).
    pub fn new(namespace: &str) -> Result<Self> {
        let addr =
            std::env::var(AGENT_ADDR_ENV).unwrap_or_else(|_| DEFAULT_AGENT_ADDR.to_string());
        let constant_tags = match std::env::var(SERVICE_ENV) {
            Ok(service) if !service.is_empty() => vec![format!("service:{service}")],
            _ => Vec::new(),
        };
        Self::with_addr_and_tags(&addr, namespace, constant_tags)
    }

    /// Explicit agent address, no environment lookups.
    pub fn with_addr(addr: &str, namespace: &str) -> Result<Self> {
        Self::with_addr_and_tags(addr, namespace, Vec::new())
    }

    fn with_addr_and_tags(
        addr: &str,
        namespace: &str,
        constant_tags: Vec<String>,
    ) -> Result<Self> {
        let client = DogstatsdClient::connect(addr, namespace, constant_tags)?;
        tracing::info!(%addr, %namespace, "dogstatsd client connected");
        Ok(Self {
            client: Arc::new(client),
        })
    }

    fn metric(&self, name: &str, kind: MetricKind) -> Arc<dyn Metric> {
        Arc::new(DatadogMetric {
            client: Arc::clone(&self.client),
            name: name.to_string(),
            kind,
        })
    }
}

impl Backend for DatadogBackend {
    fn new_counter(
        &self,
        name: &str,
        _description: &str,
        _label_keys: &[String],
    ) -> Result<Arc<dyn Metric>> {
        Ok(self.metric(name, MetricKind::Counter))
    }

    fn new_gauge(
        &self,
        name: &str,
        _description: &str,
        _label_keys: &[String],
    ) -> Result<Arc<dyn Metric>> {
        Ok(self.metric(name, MetricKind::Gauge))
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

    /// Samples are delivered per mutation; there is no client-side buffer to
    /// flush, so this is a no-op.
    fn push_to_gateway(&self, _gateway_url: &str, _job_name: &str) -> Result<()> {
        tracing::debug!("dogstatsd flush requested (no-op)");
        Ok(())
    }
}
