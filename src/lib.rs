//! # ledserve
//!
//! An **LED control service endpoint** for service-oriented middleware
//! runtimes, built on [tokio](https://tokio.rs).
//!
//! The endpoint registers itself with a middleware [`Runtime`], announces
//! ("offers") a single service instance once registration succeeds, and
//! answers fixed-format binary LED commands with fixed-format binary
//! responses.
//!
//! ## Features
//!
//! - **Typed service identity**: service, instance and method IDs are
//!   distinct newtypes, mixed up at compile time instead of run time
//! - **Registration-driven offering**: a background scheduler re-offers the
//!   service on every (re-)registration, surviving transport reconnects
//! - **Strict wire validation**: malformed requests are dropped, never
//!   answered and never crash the delivery context
//! - **Pluggable runtime**: the transport layer is a trait; production
//!   stacks and in-process simulations implement the same interface
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledserve::prelude::*;
//! use ledserve::runtime::LoopbackRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let runtime = Arc::new(LoopbackRuntime::new(RoutingMode::Dynamic));
//!     let endpoint = ServiceEndpoint::new(Arc::clone(&runtime), EndpointConfig::default());
//!
//!     // Wire callbacks into the runtime, then hand over control.
//!     endpoint.init().await?;
//!     endpoint.start().await;
//!
//!     // After stop() has been requested from another context:
//!     endpoint.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ServiceEndpoint                         │
//! │                                                              │
//! │  state handler ──▶ RegistrationMachine ──▶ OfferSignal       │
//! │                         │ (on deregister)      │ (on raise)  │
//! │                         ▼                      ▼             │
//! │                 stop_offer_service      offer worker task    │
//! │                                                │             │
//! │  message handler ──▶ wire::LedRequest          ▼             │
//! │         │            decode / validate   offer_service       │
//! │         ▼                                                    │
//! │  wire::LedResponse ──▶ Runtime::send                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`Runtime`] trait hides the actual transport: who delivers state
//! notifications and request messages, and where offers and responses go,
//! is entirely the runtime's business. [`runtime::LoopbackRuntime`] is an
//! in-process implementation used by the test suite and the demo binary.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod runtime;
mod scheduler;
pub mod state;
pub mod wire;

pub use config::{EndpointConfig, RoutingMode};
pub use endpoint::ServiceEndpoint;
pub use error::{DecodeError, Error, Result};
pub use runtime::{IncomingMessage, OutgoingMessage, RegistrationEvent, Runtime};
pub use state::RegistrationState;

// ============================================================================
// SERVICE IDENTIFIERS
// ============================================================================

/// Identifier of a service interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(u16);

impl ServiceId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Identifier of a concrete instance of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u16);

impl InstanceId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Identifier of a method within a service interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u16);

impl MethodId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

/// The (service, instance, method) triple identifying the offered endpoint.
///
/// Fixed at endpoint construction and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    pub service: ServiceId,
    pub instance: InstanceId,
    pub method: MethodId,
}

impl ServiceIdentity {
    pub fn new(service: ServiceId, instance: InstanceId, method: MethodId) -> Self {
        Self {
            service,
            instance,
            method,
        }
    }
}

impl std::fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}.{:04x}.{:04x}",
            self.service.value(),
            self.instance.value(),
            self.method.value()
        )
    }
}

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub mod prelude {
    pub use crate::config::{EndpointConfig, RoutingMode};
    pub use crate::endpoint::ServiceEndpoint;
    pub use crate::error::{DecodeError, Error, Result};
    pub use crate::runtime::{RegistrationEvent, Runtime};
    pub use crate::state::RegistrationState;
    pub use crate::{InstanceId, MethodId, ServiceId, ServiceIdentity};
}
