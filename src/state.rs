//! Registration state tracking.
//!
//! [`RegistrationMachine`] owns the endpoint's registration state and turns
//! runtime notifications into offer/withdraw activity: becoming registered
//! raises the offer signal for the scheduler, losing the registration
//! withdraws the offer synchronously on the notification path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::runtime::{RegistrationEvent, Runtime};
use crate::scheduler::OfferSignal;
use crate::ServiceIdentity;

/// Whether the endpoint currently holds a registration with the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registered,
}

/// Drives registration transitions from runtime notifications.
///
/// There is no terminal state: the machine lives as long as the endpoint
/// and may cycle between the two states arbitrarily often as the transport
/// reconnects.
pub(crate) struct RegistrationMachine<R: Runtime> {
    identity: ServiceIdentity,
    registered: AtomicBool,
    runtime: Arc<R>,
    signal: OfferSignal,
}

impl<R: Runtime> RegistrationMachine<R> {
    pub(crate) fn new(identity: ServiceIdentity, runtime: Arc<R>, signal: OfferSignal) -> Self {
        Self {
            identity,
            registered: AtomicBool::new(false),
            runtime,
            signal,
        }
    }

    /// Handle a registration state notification from the runtime.
    ///
    /// A repeated `Registered` notification leaves the state untouched but
    /// still raises the offer signal, so a runtime that re-announces the
    /// registration gets a fresh offer. A `Deregistered` notification
    /// withdraws the offer immediately on this path, bypassing the
    /// scheduler.
    pub(crate) fn on_runtime_state(&self, event: RegistrationEvent) {
        tracing::info!(identity = %self.identity, ?event, "registration state notification");
        match event {
            RegistrationEvent::Registered => {
                self.registered.store(true, Ordering::SeqCst);
                self.signal.raise();
            }
            RegistrationEvent::Deregistered => {
                self.registered.store(false, Ordering::SeqCst);
                self.runtime
                    .stop_offer_service(self.identity.service, self.identity.instance);
            }
        }
    }

    pub(crate) fn state(&self) -> RegistrationState {
        if self.is_registered() {
            RegistrationState::Registered
        } else {
            RegistrationState::Unregistered
        }
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }
}
