//! Common test utilities and fixtures.

#![allow(dead_code)]

use flushd_lib::catalog::TypeCatalog;
use flushd_lib::core::clock::{Clock, ManualClock};
use flushd_lib::core::config::{AuthCredential, EndpointConfig, FlushConfig};
use flushd_lib::core::RawSample;
use flushd_lib::export::Dispatcher;
use flushd_lib::metrics::FlushBuffer;
use flushd_lib::Forwarder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A small types database covering the usual collectd types.
pub const TYPES_DB: &str = "\
# test types
cpu                     value:GAUGE:0:100
load                    shortterm:GAUGE:0:5000, midterm:GAUGE:0:5000, longterm:GAUGE:0:5000
if_octets               rx:DERIVE:0:U, tx:DERIVE:0:U
";

/// Clock start for forwarders built by [`TestForwarderBuilder`]
pub const START: u64 = 1_700_000_000;

/// Builds a forwarder on a manual clock pointed at a test collector.
pub struct TestForwarderBuilder {
    url: String,
    auth: AuthCredential,
    flush: FlushConfig,
    timeout: Duration,
}

impl TestForwarderBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: AuthCredential::None,
            flush: FlushConfig {
                interval_secs: 30,
                max_values: 600,
            },
            timeout: Duration::from_secs(5),
        }
    }

    pub fn auth(mut self, auth: AuthCredential) -> Self {
        self.auth = auth;
        self
    }

    pub fn max_values(mut self, max_values: usize) -> Self {
        self.flush.max_values = max_values;
        self
    }

    pub fn interval_secs(mut self, secs: u64) -> Self {
        self.flush.interval_secs = secs;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> (Forwarder, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let buffer_clock: Arc<dyn Clock> = Arc::<ManualClock>::clone(&clock);

        let endpoint = EndpointConfig {
            url: self.url.parse().unwrap(),
            auth: self.auth,
            verify_ssl: true,
            timeout: self.timeout,
        };

        let forwarder = Forwarder::from_parts(
            TypeCatalog::parse(TYPES_DB),
            PathBuf::from("types.db"),
            FlushBuffer::with_clock(self.flush, buffer_clock),
            Dispatcher::new(&endpoint).unwrap(),
        );
        (forwarder, clock)
    }
}

/// A `cpu` sample with a distinguishing type instance.
pub fn cpu_sample(n: u32) -> RawSample {
    RawSample::new("cpu", vec![f64::from(n)])
        .at(START as f64, 10.0)
        .host("web-1")
        .plugin("cpu", Some("0"))
        .type_instance(format!("core-{}", n))
}
