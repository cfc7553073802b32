//! # Offer Scheduler (Internal)
//!
//! The background worker that announces the service instance whenever the
//! endpoint (re-)registers with the runtime.
//!
//! ## Signal Protocol
//!
//! The notification path and the worker share a single [`OfferDirective`]
//! cell inside a `tokio::sync::watch` channel:
//!
//! | Directive | Meaning | Written by |
//! |-----------|---------|-----------|
//! | `Idle` | Nothing to do, wait for a change | worker (after acting) |
//! | `OfferDue` | An offer attempt is due | state machine |
//! | `Stopping` | Shut down, exit unconditionally | endpoint `stop()` |
//!
//! `Stopping` is sticky: once written it is never overwritten, so a raise
//! racing a shutdown can never resurrect the worker. Writes coalesce —
//! raising an already-raised signal keeps a single pending offer attempt,
//! which is exactly the boolean-flag semantics the protocol needs.
//!
//! After each offer attempt the worker sleeps for the configured re-offer
//! delay before looking at the cell again. The delay throttles offer calls
//! when registration events flap; it is not a retry backoff, because the
//! offer call itself gives no failure feedback.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::runtime::Runtime;
use crate::state::RegistrationMachine;
use crate::ServiceIdentity;

/// What the offer worker should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OfferDirective {
    #[default]
    Idle,
    OfferDue,
    Stopping,
}

/// Shared handle for writing the offer directive cell.
#[derive(Clone)]
pub(crate) struct OfferSignal {
    tx: Arc<watch::Sender<OfferDirective>>,
}

impl OfferSignal {
    pub(crate) fn new() -> (Self, watch::Receiver<OfferDirective>) {
        let (tx, rx) = watch::channel(OfferDirective::Idle);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Mark an offer attempt as due. No-op once `Stopping` is set.
    pub(crate) fn raise(&self) {
        self.tx.send_modify(|directive| {
            if !matches!(directive, OfferDirective::Stopping) {
                *directive = OfferDirective::OfferDue;
            }
        });
    }

    /// Clear a pending offer attempt back to `Idle`. Leaves `Stopping`
    /// untouched.
    pub(crate) fn clear(&self) {
        self.tx.send_if_modified(|directive| {
            if matches!(directive, OfferDirective::OfferDue) {
                *directive = OfferDirective::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Request worker shutdown. Terminal.
    pub(crate) fn shutdown(&self) {
        self.tx.send_modify(|directive| *directive = OfferDirective::Stopping);
    }
}

/// The offer worker task. One per endpoint.
///
/// Blocks on the directive cell (no busy-polling); offers only while the
/// endpoint is registered; exits as soon as `Stopping` is observed, even
/// mid-throttle.
pub(crate) async fn offer_worker<R: Runtime>(
    runtime: Arc<R>,
    machine: Arc<RegistrationMachine<R>>,
    identity: ServiceIdentity,
    signal: OfferSignal,
    mut directives: watch::Receiver<OfferDirective>,
    reoffer_delay: Duration,
) {
    loop {
        let directive = *directives.borrow_and_update();
        match directive {
            OfferDirective::Stopping => break,
            OfferDirective::OfferDue => {
                if machine.is_registered() {
                    runtime.offer_service(identity.service, identity.instance);
                } else {
                    tracing::debug!(%identity, "offer due but endpoint not registered, skipping");
                }
                signal.clear();

                // Throttle before re-checking; a shutdown request cuts the
                // wait short.
                tokio::select! {
                    () = tokio::time::sleep(reoffer_delay) => {}
                    _ = directives.wait_for(|d| matches!(d, OfferDirective::Stopping)) => break,
                }
            }
            OfferDirective::Idle => {
                if directives.changed().await.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(%identity, "offer worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::runtime::{LoopbackRuntime, RegistrationEvent};
    use crate::RoutingMode;

    fn fixture() -> (
        Arc<LoopbackRuntime>,
        Arc<RegistrationMachine<LoopbackRuntime>>,
        ServiceIdentity,
        OfferSignal,
        watch::Receiver<OfferDirective>,
    ) {
        let config = EndpointConfig::default();
        let runtime = Arc::new(LoopbackRuntime::new(RoutingMode::Dynamic));
        let (signal, directives) = OfferSignal::new();
        let machine = Arc::new(RegistrationMachine::new(
            config.identity,
            Arc::clone(&runtime),
            signal.clone(),
        ));
        (runtime, machine, config.identity, signal, directives)
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test(start_paused = true)]
    async fn offers_once_per_raise_while_registered() {
        let (runtime, machine, identity, signal, directives) = fixture();
        machine.on_runtime_state(RegistrationEvent::Registered);

        let worker = tokio::spawn(offer_worker(
            Arc::clone(&runtime),
            Arc::clone(&machine),
            identity,
            signal.clone(),
            directives,
            Duration::from_millis(100),
        ));

        wait_until(|| runtime.offer_calls() == 1).await;

        // A second registration notification triggers a second offer after
        // the throttle.
        machine.on_runtime_state(RegistrationEvent::Registered);
        wait_until(|| runtime.offer_calls() == 2).await;

        signal.shutdown();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn raises_coalesce_into_one_offer() {
        let (runtime, machine, identity, signal, directives) = fixture();
        machine.on_runtime_state(RegistrationEvent::Registered);
        signal.raise();
        signal.raise();

        let worker = tokio::spawn(offer_worker(
            Arc::clone(&runtime),
            Arc::clone(&machine),
            identity,
            signal.clone(),
            directives,
            Duration::from_millis(100),
        ));

        wait_until(|| runtime.offer_calls() == 1).await;

        // Let the throttle elapse and the worker settle back to waiting.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runtime.offer_calls(), 1);

        signal.shutdown();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn skips_offer_when_not_registered() {
        let (runtime, machine, identity, signal, directives) = fixture();
        signal.raise();

        let worker = tokio::spawn(offer_worker(
            Arc::clone(&runtime),
            Arc::clone(&machine),
            identity,
            signal.clone(),
            directives,
            Duration::from_millis(100),
        ));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runtime.offer_calls(), 0);

        signal.shutdown();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_wins_over_pending_offer() {
        let (runtime, machine, identity, signal, directives) = fixture();
        machine.on_runtime_state(RegistrationEvent::Registered);
        signal.shutdown();
        // Raised after shutdown: must not resurrect the worker.
        signal.raise();

        let worker = tokio::spawn(offer_worker(
            Arc::clone(&runtime),
            Arc::clone(&machine),
            identity,
            signal.clone(),
            directives,
            Duration::from_millis(100),
        ));

        worker.await.unwrap();
        assert_eq!(runtime.offer_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_throttle_sleep() {
        let (runtime, machine, identity, signal, directives) = fixture();
        machine.on_runtime_state(RegistrationEvent::Registered);

        let worker = tokio::spawn(offer_worker(
            Arc::clone(&runtime),
            Arc::clone(&machine),
            identity,
            signal.clone(),
            directives,
            Duration::from_secs(3600),
        ));

        wait_until(|| runtime.offer_calls() == 1).await;

        // The worker is now inside a very long throttle sleep.
        signal.shutdown();
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .expect("worker did not observe shutdown during throttle")
            .unwrap();
    }
}
