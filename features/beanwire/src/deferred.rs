//! Deferred completion primitive backing `async_wire`: a single-assignment
//! result cell, a future reading it, and a detached timer that settles the
//! cell on timeout. First settlement wins; later ones are reported back so
//! the caller can log them.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
    thread,
    time::Duration,
};

use futures_channel::oneshot;
use pin_project_lite::pin_project;

use crate::errors::InjectionError;
use crate::types::Wired;

pub(crate) type WireResult = Result<Wired, InjectionError>;

/// Single-assignment settlement cell shared between the connector callback
/// and the timeout timer.
#[derive(Clone)]
pub(crate) struct SettleCell {
    tx: Arc<Mutex<Option<oneshot::Sender<WireResult>>>>,
}

impl SettleCell {
    /// Settles the cell; returns false when it was already settled.
    pub(crate) fn settle(&self, result: WireResult) -> bool {
        let Some(tx) = self.tx.lock().unwrap().take() else {
            return false;
        };
        // the receiver may already be gone, the settlement still counts
        let _ = tx.send(result);
        true
    }

    /// Arms a detached timer settling the cell with
    /// [`InjectionError::Timeout`]. The thread is not joined, it dies on its
    /// own after the sleep.
    pub(crate) fn arm_timeout(&self, timeout: Duration) {
        let cell = self.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            if cell.settle(Err(InjectionError::Timeout)) {
                tracing::debug!("deferred wiring timed out after {timeout:?}");
            }
        });
    }
}

pub(crate) fn deferred() -> (SettleCell, WireFuture) {
    let (tx, rx) = oneshot::channel();
    (
        SettleCell {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        WireFuture { rx },
    )
}

pin_project! {
    /// Future handed out by `async_wire`; resolves with the first settled
    /// value.
    pub struct WireFuture {
        #[pin]
        rx: oneshot::Receiver<WireResult>,
    }
}

impl Future for WireFuture {
    type Output = WireResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().rx.poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // sender dropped without settling: the manager went away
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(InjectionError::ChannelClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
