//! Future adapter over the callback pair of a single request.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::bridge::{ErrorCallback, SuccessCallback};
use crate::errors::EntitlementError;
use crate::payload::Payload;

type Outcome = Result<Payload, EntitlementError>;

/// Outcome of a request that passed argument validation.
///
/// Resolves to the native payload or the boxed native failure. If the bridge
/// drops the request without answering, resolves to an unset
/// [`EntitlementError`].
#[must_use = "a pending request does nothing unless awaited"]
#[derive(Debug)]
pub struct PendingRequest {
    outcome: oneshot::Receiver<Outcome>,
}

impl PendingRequest {
    /// Build a request together with the callback pair that completes it.
    pub(crate) fn channel() -> (Self, SuccessCallback, ErrorCallback) {
        let (tx, outcome) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(tx)));

        let success_slot = slot.clone();
        let on_success: SuccessCallback = Box::new(move |payload| {
            complete(&success_slot, Ok(payload));
        });
        let on_error: ErrorCallback = Box::new(move |error| {
            complete(&slot, Err(error));
        });

        (Self { outcome }, on_success, on_error)
    }
}

fn complete(slot: &Mutex<Option<oneshot::Sender<Outcome>>>, outcome: Outcome) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        // The receiver may have been dropped by a caller that lost interest.
        let _ = sender.send(outcome);
    }
}

impl Future for PendingRequest {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(EntitlementError::unset())))
    }
}
