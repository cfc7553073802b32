//! Middleware runtime abstraction.
//!
//! This module defines the [`Runtime`] trait that abstracts over the
//! transport/session layer carrying the endpoint's traffic, allowing the
//! endpoint to work with a production middleware stack as well as with the
//! in-process [`LoopbackRuntime`] used for testing.
//!
//! ## Contract
//!
//! The runtime owns a delivery context that invokes the registered
//! handlers; per endpoint that context is single-threaded. Handlers are
//! synchronous closures and must return promptly — every runtime operation
//! the endpoint calls from a handler ([`Runtime::offer_service`],
//! [`Runtime::stop_offer_service`], [`Runtime::send`], [`Runtime::stop`])
//! is fire-and-forget and gives no delivery feedback. Reliability of
//! offers and responses is the runtime's business, not the endpoint's.

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;
use crate::{InstanceId, MethodId, ServiceId};

mod loopback;

pub use loopback::LoopbackRuntime;

/// Registration state notifications delivered by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// The endpoint is registered with the runtime.
    Registered,
    /// The endpoint lost its registration.
    Deregistered,
}

/// Callback invoked on every registration state notification.
pub type StateHandler = Box<dyn Fn(RegistrationEvent) + Send + Sync>;

/// Callback invoked for every message addressed to a registered method.
pub type MessageHandler = Box<dyn Fn(&IncomingMessage) + Send + Sync>;

/// The middleware runtime consumed by the endpoint.
///
/// Implemented by production transport stacks and by [`LoopbackRuntime`].
pub trait Runtime: Send + Sync + 'static {
    /// Initialize the runtime. Must be called before [`Runtime::start`].
    fn init(&self) -> impl Future<Output = Result<()>> + Send;

    /// Run the runtime's delivery loop, occupying the calling task until
    /// [`Runtime::stop`] is called.
    fn start(&self) -> impl Future<Output = ()> + Send;

    /// Stop the delivery loop. Callable from any context.
    fn stop(&self);

    /// Register the callback receiving registration state notifications.
    fn register_state_handler(&self, handler: StateHandler);

    /// Register the callback receiving messages for the given method.
    fn register_message_handler(
        &self,
        service: ServiceId,
        instance: InstanceId,
        method: MethodId,
        handler: MessageHandler,
    );

    /// Announce the service instance to the network.
    fn offer_service(&self, service: ServiceId, instance: InstanceId);

    /// Withdraw a previously announced service instance.
    fn stop_offer_service(&self, service: ServiceId, instance: InstanceId);

    /// Send a response message. Fire-and-forget.
    fn send(&self, message: OutgoingMessage);
}

// ============================================================================
// MESSAGES
// ============================================================================

/// An inbound request message delivered by the runtime.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    service: ServiceId,
    instance: InstanceId,
    method: MethodId,
    client_id: u16,
    session_id: u16,
    payload: Bytes,
}

impl IncomingMessage {
    pub fn new(
        service: ServiceId,
        instance: InstanceId,
        method: MethodId,
        client_id: u16,
        session_id: u16,
        payload: Bytes,
    ) -> Self {
        Self {
            service,
            instance,
            method,
            client_id,
            session_id,
            payload,
        }
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    /// The raw request payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// Build a response message addressed back to this request's sender,
    /// echoing its correlation identifiers.
    pub fn create_response(&self, payload: Bytes) -> OutgoingMessage {
        OutgoingMessage {
            service: self.service,
            instance: self.instance,
            method: self.method,
            client_id: self.client_id,
            session_id: self.session_id,
            payload,
        }
    }
}

/// An outbound response message handed to [`Runtime::send`].
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    service: ServiceId,
    instance: InstanceId,
    method: MethodId,
    client_id: u16,
    session_id: u16,
    payload: Bytes,
}

impl OutgoingMessage {
    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn client_id(&self) -> u16 {
        self.client_id
    }

    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
