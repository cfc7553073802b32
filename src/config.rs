//! # Endpoint Configuration
//!
//! Configuration for the service endpoint. The defaults match the sample
//! LED service identity and work out of the box:
//!
//! ```
//! use ledserve::EndpointConfig;
//!
//! let config = EndpointConfig::default();
//! assert_eq!(config.identity.service.value(), 0x1234);
//! ```
//!
//! For custom setups, use the builder:
//!
//! ```
//! use std::time::Duration;
//! use ledserve::{EndpointConfig, RoutingMode};
//!
//! let config = EndpointConfig::builder()
//!     .service_id(0x4242)
//!     .instance_id(0x0001)
//!     .method_id(0x0010)
//!     .routing(RoutingMode::Static)
//!     .reoffer_delay(Duration::from_millis(500))
//!     .build();
//! ```
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `service_id` | `0x1234` | Offered service interface |
//! | `instance_id` | `0x5678` | Offered service instance |
//! | `method_id` | `0x0421` | Method answering LED requests |
//! | `routing` | `Dynamic` | Routing configuration handed to the runtime |
//! | `reoffer_delay` | 1000 ms | Throttle after each offer attempt |

use std::time::Duration;

use crate::{InstanceId, MethodId, ServiceId, ServiceIdentity};

/// Default service interface id of the LED service.
pub const DEFAULT_SERVICE_ID: u16 = 0x1234;
/// Default instance id of the LED service.
pub const DEFAULT_INSTANCE_ID: u16 = 0x5678;
/// Default method id answering LED control requests.
pub const DEFAULT_METHOD_ID: u16 = 0x0421;
/// Default throttle between offer attempts.
pub const DEFAULT_REOFFER_DELAY: Duration = Duration::from_millis(1000);

/// How the runtime routes messages between local endpoints.
///
/// Parsed from the command line and forwarded to the runtime verbatim; the
/// endpoint core behaves identically in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// Routing discovered at runtime.
    #[default]
    Dynamic,
    /// Statically configured routing.
    Static,
}

/// Configuration of a [`ServiceEndpoint`](crate::ServiceEndpoint).
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Identity of the offered service.
    pub identity: ServiceIdentity,
    /// Routing configuration mode handed to the runtime.
    pub routing: RoutingMode,
    /// How long the offer scheduler idles after each offer attempt before
    /// re-checking for a pending signal.
    pub reoffer_delay: Duration,
}

impl EndpointConfig {
    pub fn builder() -> EndpointConfigBuilder {
        EndpointConfigBuilder::default()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`EndpointConfig`].
#[derive(Debug, Default)]
pub struct EndpointConfigBuilder {
    service_id: Option<u16>,
    instance_id: Option<u16>,
    method_id: Option<u16>,
    routing: Option<RoutingMode>,
    reoffer_delay: Option<Duration>,
}

impl EndpointConfigBuilder {
    /// Set the offered service id.
    pub fn service_id(mut self, id: u16) -> Self {
        self.service_id = Some(id);
        self
    }

    /// Set the offered instance id.
    pub fn instance_id(mut self, id: u16) -> Self {
        self.instance_id = Some(id);
        self
    }

    /// Set the method id answering LED requests.
    pub fn method_id(mut self, id: u16) -> Self {
        self.method_id = Some(id);
        self
    }

    /// Set the routing configuration mode.
    pub fn routing(mut self, routing: RoutingMode) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Set the throttle applied after each offer attempt.
    pub fn reoffer_delay(mut self, delay: Duration) -> Self {
        self.reoffer_delay = Some(delay);
        self
    }

    pub fn build(self) -> EndpointConfig {
        EndpointConfig {
            identity: ServiceIdentity::new(
                ServiceId::new(self.service_id.unwrap_or(DEFAULT_SERVICE_ID)),
                InstanceId::new(self.instance_id.unwrap_or(DEFAULT_INSTANCE_ID)),
                MethodId::new(self.method_id.unwrap_or(DEFAULT_METHOD_ID)),
            ),
            routing: self.routing.unwrap_or_default(),
            reoffer_delay: self.reoffer_delay.unwrap_or(DEFAULT_REOFFER_DELAY),
        }
    }
}
