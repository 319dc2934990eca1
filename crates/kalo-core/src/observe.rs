//! Single-slot observable envelope shared between a controller and the UI.
//!
//! Every request started through [`EnvelopeCell::spawn`] gets a generation
//! number. A result is published only while its generation is the newest,
//! so a slow request that has been superseded can never overwrite the
//! outcome of a later one.

use crate::envelope::Envelope;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct Tagged<T> {
    generation: u64,
    envelope: Envelope<T>,
}

pub struct EnvelopeCell<T> {
    tx: watch::Sender<Tagged<T>>,
}

impl<T> Default for EnvelopeCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EnvelopeCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Tagged {
            generation: 0,
            envelope: Envelope::None,
        });
        Self { tx }
    }

    pub fn subscribe(&self) -> EnvelopeReceiver<T> {
        EnvelopeReceiver {
            rx: self.tx.subscribe(),
        }
    }

    pub fn current(&self) -> Envelope<T> {
        self.tx.borrow().envelope.clone()
    }

    /// Drops interest in any pending request and goes back to `None`.
    pub fn reset(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|slot| {
            slot.generation += 1;
            slot.envelope = Envelope::None;
            generation = slot.generation;
        });
        generation
    }

    /// Publishes `envelope` if `generation` is still the newest request.
    pub fn publish(&self, generation: u64, envelope: Envelope<T>) -> bool {
        publish(&self.tx, generation, envelope)
    }

    /// Runs `request` on the runtime and publishes its outcome.
    pub fn spawn<F>(&self, request: F) -> JoinHandle<()>
    where
        F: Future<Output = Envelope<T>> + Send + 'static,
    {
        let generation = self.reset();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let envelope = request.await;
            publish(&tx, generation, envelope);
        })
    }
}

fn publish<T>(tx: &watch::Sender<Tagged<T>>, generation: u64, envelope: Envelope<T>) -> bool {
    tx.send_if_modified(|slot| {
        if slot.generation == generation {
            slot.envelope = envelope;
            true
        } else {
            false
        }
    })
}

/// UI side of an [`EnvelopeCell`].
#[derive(Clone)]
pub struct EnvelopeReceiver<T> {
    rx: watch::Receiver<Tagged<T>>,
}

impl<T: Clone> EnvelopeReceiver<T> {
    /// Whether something was published since the last [`Self::current`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn current(&mut self) -> Envelope<T> {
        self.rx.borrow_and_update().envelope.clone()
    }

    /// Waits until the envelope leaves `None`.
    pub async fn settled(&mut self) -> Envelope<T> {
        loop {
            let current = self.current();
            if !current.is_none() {
                return current;
            }
            if self.rx.changed().await.is_err() {
                return self.current();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_spawn_publishes_result() {
        let cell: EnvelopeCell<u32> = EnvelopeCell::new();
        let mut rx = cell.subscribe();
        assert!(rx.current().is_none());

        cell.spawn(async { Envelope::Success(5) });
        assert_eq!(rx.settled().await, Envelope::Success(5));
        assert_eq!(cell.current(), Envelope::Success(5));
    }

    #[tokio::test]
    async fn test_superseded_request_is_dropped() {
        let cell: EnvelopeCell<&'static str> = EnvelopeCell::new();
        let mut rx = cell.subscribe();
        let (release_old, old_gate) = oneshot::channel::<()>();

        let old = cell.spawn(async move {
            let _ = old_gate.await;
            Envelope::Success("old")
        });
        let new = cell.spawn(async { Envelope::Success("new") });
        new.await.expect("new request");
        assert_eq!(rx.settled().await, Envelope::Success("new"));

        release_old.send(()).expect("old still waiting");
        old.await.expect("old request");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cell.current(), Envelope::Success("new"));
    }

    #[tokio::test]
    async fn test_reset_returns_to_none() {
        let cell: EnvelopeCell<u32> = EnvelopeCell::new();
        let generation = cell.reset();
        assert!(cell.publish(generation, Envelope::failure("x")));
        assert!(cell.current().is_failure());

        cell.reset();
        assert!(cell.current().is_none());
        assert!(!cell.publish(generation, Envelope::Success(1)));
    }
}
