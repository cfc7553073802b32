//! In-process runtime implementation.
//!
//! [`LoopbackRuntime`] implements [`Runtime`](super::Runtime) without any
//! network: registration notifications and request messages are injected
//! through [`push_state`](LoopbackRuntime::push_state) and
//! [`push_request`](LoopbackRuntime::push_request), delivered to the
//! registered handlers by the dispatch loop that [`start`](Runtime::start)
//! runs on its calling task, and everything the endpoint hands back
//! (offers, withdrawals, responses) is observable. The integration tests
//! and the demo binary drive the endpoint through this runtime.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::config::RoutingMode;
use crate::error::{Error, Result};
use crate::{InstanceId, MethodId, ServiceId};

use super::{
    IncomingMessage, MessageHandler, OutgoingMessage, RegistrationEvent, Runtime, StateHandler,
};

/// Events consumed by the dispatch loop.
enum Event {
    State(RegistrationEvent),
    Message(IncomingMessage),
    Stop,
}

#[derive(Default)]
struct Handlers {
    state: Option<StateHandler>,
    message: HashMap<(u16, u16, u16), MessageHandler>,
}

/// An in-process [`Runtime`] for simulation and testing.
pub struct LoopbackRuntime {
    routing: RoutingMode,
    fail_init: bool,
    initialized: AtomicBool,
    handlers: Mutex<Handlers>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
    outbound_tx: mpsc::UnboundedSender<OutgoingMessage>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<OutgoingMessage>>>,
    offered: Mutex<HashSet<(u16, u16)>>,
    offer_calls: AtomicUsize,
    withdraw_calls: AtomicUsize,
}

impl LoopbackRuntime {
    pub fn new(routing: RoutingMode) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Self {
            routing,
            fail_init: false,
            initialized: AtomicBool::new(false),
            handlers: Mutex::new(Handlers::default()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            offered: Mutex::new(HashSet::new()),
            offer_calls: AtomicUsize::new(0),
            withdraw_calls: AtomicUsize::new(0),
        }
    }

    /// A runtime whose `init` fails, for exercising the fatal path.
    pub fn with_failing_init(routing: RoutingMode) -> Self {
        Self {
            fail_init: true,
            ..Self::new(routing)
        }
    }

    /// Inject a registration state notification.
    pub fn push_state(&self, event: RegistrationEvent) {
        let _ = self.events_tx.send(Event::State(event));
    }

    /// Inject a request message addressed to the given method.
    pub fn push_request(
        &self,
        service: ServiceId,
        instance: InstanceId,
        method: MethodId,
        client_id: u16,
        session_id: u16,
        payload: Bytes,
    ) {
        let message = IncomingMessage::new(service, instance, method, client_id, session_id, payload);
        let _ = self.events_tx.send(Event::Message(message));
    }

    /// Take the receiver of messages sent through this runtime. Returns
    /// `None` if it was already taken.
    pub fn take_outbound(&self) -> Option<mpsc::UnboundedReceiver<OutgoingMessage>> {
        self.outbound_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Total number of `offer_service` calls observed.
    pub fn offer_calls(&self) -> usize {
        self.offer_calls.load(Ordering::SeqCst)
    }

    /// Total number of `stop_offer_service` calls observed.
    pub fn withdraw_calls(&self) -> usize {
        self.withdraw_calls.load(Ordering::SeqCst)
    }

    /// Whether the given instance is currently offered.
    pub fn is_offered(&self, service: ServiceId, instance: InstanceId) -> bool {
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(service.value(), instance.value()))
    }
}

impl Runtime for LoopbackRuntime {
    async fn init(&self) -> Result<()> {
        if self.fail_init {
            return Err(Error::Init("loopback runtime configured unavailable".into()));
        }

        self.initialized.store(true, Ordering::SeqCst);
        tracing::debug!(routing = ?self.routing, "loopback runtime initialized");
        Ok(())
    }

    async fn start(&self) {
        let rx = self
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut rx) = rx else {
            tracing::error!("loopback runtime started twice");
            return;
        };
        if !self.initialized.load(Ordering::SeqCst) {
            tracing::warn!("loopback runtime started before init");
        }

        tracing::debug!("loopback runtime delivery loop running");
        while let Some(event) = rx.recv().await {
            match event {
                Event::Stop => break,
                // The delivery context is single-threaded per endpoint, so
                // holding the handler table lock across the call is fine.
                Event::State(state) => {
                    let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(handler) = handlers.state.as_ref() {
                        handler(state);
                    }
                }
                Event::Message(message) => {
                    let key = (
                        message.service().value(),
                        message.instance().value(),
                        message.method().value(),
                    );
                    let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
                    match handlers.message.get(&key) {
                        Some(handler) => handler(&message),
                        None => tracing::warn!(
                            service = key.0,
                            instance = key.1,
                            method = key.2,
                            "dropping message for unregistered method"
                        ),
                    }
                }
            }
        }
        tracing::debug!("loopback runtime delivery loop exited");
    }

    fn stop(&self) {
        let _ = self.events_tx.send(Event::Stop);
    }

    fn register_state_handler(&self, handler: StateHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state = Some(handler);
    }

    fn register_message_handler(
        &self,
        service: ServiceId,
        instance: InstanceId,
        method: MethodId,
        handler: MessageHandler,
    ) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .message
            .insert((service.value(), instance.value(), method.value()), handler);
    }

    fn offer_service(&self, service: ServiceId, instance: InstanceId) {
        self.offer_calls.fetch_add(1, Ordering::SeqCst);
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((service.value(), instance.value()));
        tracing::info!(
            service = service.value(),
            instance = instance.value(),
            "service offered"
        );
    }

    fn stop_offer_service(&self, service: ServiceId, instance: InstanceId) {
        self.withdraw_calls.fetch_add(1, Ordering::SeqCst);
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(service.value(), instance.value()));
        tracing::info!(
            service = service.value(),
            instance = instance.value(),
            "service offer withdrawn"
        );
    }

    fn send(&self, message: OutgoingMessage) {
        let _ = self.outbound_tx.send(message);
    }
}
