//! The service endpoint composition root.
//!
//! [`ServiceEndpoint`] wires the registration state machine, the offer
//! scheduler and the wire codec onto a [`Runtime`] and owns the shutdown
//! coordination between them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::config::EndpointConfig;
use crate::error::Result;
use crate::runtime::{IncomingMessage, Runtime};
use crate::scheduler::{offer_worker, OfferSignal};
use crate::state::{RegistrationMachine, RegistrationState};
use crate::wire::{LedOperation, LedRequest, LedResponse};
use crate::ServiceIdentity;

/// A single-instance LED control service endpoint.
///
/// Lifecycle: [`new`](Self::new) (spawns the offer worker) →
/// [`init`](Self::init) (wires callbacks into the runtime) →
/// [`start`](Self::start) (hands control to the runtime's delivery loop)
/// → [`stop`](Self::stop) from some other context →
/// [`shutdown`](Self::shutdown) to reap the worker.
pub struct ServiceEndpoint<R: Runtime> {
    runtime: Arc<R>,
    identity: ServiceIdentity,
    machine: Arc<RegistrationMachine<R>>,
    signal: OfferSignal,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Runtime> ServiceEndpoint<R> {
    /// Build the endpoint and spawn its offer worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(runtime: Arc<R>, config: EndpointConfig) -> Self {
        let identity = config.identity;
        let (signal, directives) = OfferSignal::new();
        let machine = Arc::new(RegistrationMachine::new(
            identity,
            Arc::clone(&runtime),
            signal.clone(),
        ));

        let worker = tokio::spawn(offer_worker(
            Arc::clone(&runtime),
            Arc::clone(&machine),
            identity,
            signal.clone(),
            directives,
            config.reoffer_delay,
        ));

        Self {
            runtime,
            identity,
            machine,
            signal,
            running: AtomicBool::new(true),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Initialize the runtime and register the endpoint's callbacks.
    ///
    /// Must complete successfully before [`start`](Self::start). A failure
    /// here is fatal; there is no retry path.
    pub async fn init(&self) -> Result<()> {
        self.runtime.init().await?;

        let machine = Arc::clone(&self.machine);
        self.runtime
            .register_state_handler(Box::new(move |event| machine.on_runtime_state(event)));

        let runtime = Arc::clone(&self.runtime);
        self.runtime.register_message_handler(
            self.identity.service,
            self.identity.instance,
            self.identity.method,
            Box::new(move |message| handle_request(runtime.as_ref(), message)),
        );

        tracing::info!(identity = %self.identity, "endpoint initialized");
        Ok(())
    }

    /// Run the runtime's delivery loop. Occupies the calling task until
    /// [`stop`](Self::stop) is called.
    pub async fn start(&self) {
        self.runtime.start().await;
    }

    /// Request shutdown. Idempotent and callable from any context.
    ///
    /// Clears the running flag, withdraws any active offer, wakes the
    /// offer worker so it observes shutdown, and stops the runtime. The
    /// worker itself is reaped by [`shutdown`](Self::shutdown).
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        tracing::info!(identity = %self.identity, "stopping endpoint");
        self.runtime
            .stop_offer_service(self.identity.service, self.identity.instance);
        self.signal.shutdown();
        self.runtime.stop();
    }

    /// Stop the endpoint and wait for the offer worker to exit.
    ///
    /// Call this from the bootstrap context that owns the endpoint, never
    /// from inside a runtime callback: the worker is joined here, and it
    /// is joined at most once no matter how often this is called.
    pub async fn shutdown(&self) {
        self.stop();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("offer worker terminated abnormally: {e}");
            }
        }
    }

    /// Whether shutdown has not yet been requested.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current registration state as last notified by the runtime.
    pub fn registration_state(&self) -> RegistrationState {
        self.machine.state()
    }

    /// Identity of the offered service.
    pub fn identity(&self) -> ServiceIdentity {
        self.identity
    }
}

/// Answer one inbound request.
///
/// Malformed requests are logged and dropped without a response; the
/// caller sees silence, not a NOK. Every well-formed request is treated as
/// successful and answered with OK and its own sequence number.
fn handle_request<R: Runtime>(runtime: &R, message: &IncomingMessage) {
    let request = match LedRequest::decode(message.payload()) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(%err, length = message.length(), "dropping malformed request");
            return;
        }
    };

    log_request(&request);

    let response = LedResponse::ok_for(&request);
    runtime.send(message.create_response(response.to_payload()));
}

fn log_request(request: &LedRequest) {
    let seq = request.sequence_number;
    let led = request.led_position;
    match request.operation {
        LedOperation::On => tracing::info!(seq, led, "request: switch LED on"),
        LedOperation::Off => tracing::info!(seq, led, "request: switch LED off"),
        LedOperation::FlashTimed => {
            tracing::info!(seq, led, duration_ms = request.parameter, "request: flash LED");
        }
        LedOperation::FlashDefault => {
            tracing::info!(seq, led, "request: flash LED with default pattern");
        }
    }
}
