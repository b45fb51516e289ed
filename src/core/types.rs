use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

/// One sample value, forwarded exactly as the agent sent it.
///
/// Integer counters keep full 64-bit precision. An undefined value (the
/// agent's `null`, or a NaN gauge) is `None` and goes out as `null`.
pub type SampleValue = Option<Number>;

/// Gauge value. NaN and infinities become `None`.
pub fn gauge(value: f64) -> SampleValue {
    Number::from_f64(value)
}

/// Counter value, kept as an integer on the wire
pub fn counter(value: u64) -> SampleValue {
    Some(Number::from(value))
}

/// A single named value slot of a type, e.g. `rx:DERIVE` of `if_octets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    /// Data source name (`value`, `rx`, `shortterm`, ...)
    pub name: String,
    /// Semantic kind (`GAUGE`, `COUNTER`, `DERIVE`, `ABSOLUTE`)
    pub kind: String,
}

impl DataSource {
    /// Creates a new data source
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind)
    }
}

/// Declared shape of a sample type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    name: String,
    data_sources: Vec<DataSource>,
}

impl TypeDefinition {
    /// Creates a type definition from its ordered data sources
    pub fn new(name: impl Into<String>, data_sources: Vec<DataSource>) -> Self {
        Self {
            name: name.into(),
            data_sources,
        }
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data sources in declaration order
    pub fn data_sources(&self) -> &[DataSource] {
        &self.data_sources
    }

    /// Number of values a sample of this type must carry
    pub fn arity(&self) -> usize {
        self.data_sources.len()
    }

    /// Data source names in declaration order
    pub fn dsnames(&self) -> Vec<String> {
        self.data_sources.iter().map(|ds| ds.name.clone()).collect()
    }

    /// Data source kinds in declaration order
    pub fn dstypes(&self) -> Vec<String> {
        self.data_sources.iter().map(|ds| ds.kind.clone()).collect()
    }
}

/// A measurement as delivered by the monitoring agent.
///
/// Field names follow the collectd `write_http` JSON layout so that
/// agent payloads deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Name of the type this sample claims to be
    #[serde(rename = "type")]
    pub type_name: String,
    /// Values, one per data source of the type
    pub values: Vec<SampleValue>,
    /// Sample time in epoch seconds
    #[serde(default)]
    pub time: f64,
    /// Collection interval in seconds
    #[serde(default)]
    pub interval: f64,
    /// Originating host
    #[serde(default)]
    pub host: String,
    /// Plugin that produced the sample
    #[serde(default)]
    pub plugin: String,
    /// Plugin instance, if any
    #[serde(default)]
    pub plugin_instance: Option<String>,
    /// Type instance, if any
    #[serde(default)]
    pub type_instance: Option<String>,
}

impl RawSample {
    /// Creates a sample of gauge values with empty metadata
    pub fn new(type_name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::with_values(type_name, values.into_iter().map(gauge).collect())
    }

    /// Creates a sample from values of any kind with empty metadata
    pub fn with_values(type_name: impl Into<String>, values: Vec<SampleValue>) -> Self {
        Self {
            type_name: type_name.into(),
            values,
            time: 0.0,
            interval: 0.0,
            host: String::new(),
            plugin: String::new(),
            plugin_instance: None,
            type_instance: None,
        }
    }

    /// Set sample time and interval
    pub fn at(mut self, time: f64, interval: f64) -> Self {
        self.time = time;
        self.interval = interval;
        self
    }

    /// Set host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set plugin and optional plugin instance
    pub fn plugin(mut self, plugin: impl Into<String>, instance: Option<&str>) -> Self {
        self.plugin = plugin.into();
        self.plugin_instance = instance.map(str::to_string);
        self
    }

    /// Set type instance
    pub fn type_instance(mut self, instance: impl Into<String>) -> Self {
        self.type_instance = Some(instance.into());
        self
    }
}

/// A validated sample ready to be sent to the collector.
///
/// The serialized form of this struct is the wire contract with the
/// collector: field names must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Values in data source order
    pub values: Vec<SampleValue>,
    /// Data source names, positionally paired with `values`
    pub dsnames: Vec<String>,
    /// Data source kinds, positionally paired with `values`
    pub dstypes: Vec<String>,
    /// Sample time in epoch seconds
    pub time: f64,
    /// Collection interval in seconds
    pub interval: f64,
    /// Originating host
    pub host: String,
    /// Plugin name
    pub plugin: String,
    /// Plugin instance, empty when absent
    pub plugin_instance: String,
    /// Type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Type instance, empty when absent
    pub type_instance: String,
}
