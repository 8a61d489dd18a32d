//! # Resolution Cell
//!
//! Risoluzione asincrona memoizzata e condivisa di un singolo valore.
//!
//! ## Stati:
//! - `Unresolved` → `Resolving` alla prima richiesta
//! - `Resolving` → `Resolved` in caso di successo, valore mantenuto per la vita della cella
//! - `Resolving` → `Unresolved` in caso di errore: l'errore arriva a tutti i waiter
//!   di quel tentativo, la chiamata successiva riparte da zero
//!
//! ## Concorrenza:
//! - Le richieste concorrenti si uniscono allo stesso `Shared` future
//! - La cella conserva solo un riferimento debole al tentativo in corso: se tutti i
//!   waiter vengono cancellati il future interno viene droppato (e con lui la richiesta
//!   al backend); la chiamata successiva avvia un nuovo tentativo
//! - Cancellare un waiter non influisce sugli altri
//! - Il lock non viene mai tenuto attraverso un `.await`

use crate::error::MediaResult;
use crate::probe::PixelSize;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

type Resolution<T> = BoxFuture<'static, MediaResult<T>>;

enum CellState<T> {
    Unresolved,
    Resolving {
        attempt: u64,
        pending: WeakShared<Resolution<T>>,
    },
    Resolved(T),
}

struct Slot<T> {
    state: CellState<T>,
    attempts: u64,
}

/// Memoized, coalesced async resolution of one value
pub struct ResolutionCell<T> {
    label: &'static str,
    slot: Mutex<Slot<T>>,
}

impl<T> ResolutionCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slot: Mutex::new(Slot {
                state: CellState::Unresolved,
                attempts: 0,
            }),
        }
    }

    /// The resolved value, if any
    pub fn get(&self) -> Option<T> {
        match &self.slot.lock().state {
            CellState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Number of resolution attempts started so far
    pub fn attempts(&self) -> u64 {
        self.slot.lock().attempts
    }

    /// Return the cached value, join the attempt in flight, or start a new one with `resolve`.
    ///
    /// `resolve` is only called when a new attempt starts.
    pub async fn get_or_resolve<F, Fut>(&self, resolve: F) -> MediaResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MediaResult<T>> + Send + 'static,
    {
        let (attempt, pending) = {
            let mut slot = self.slot.lock();

            let joined = match &slot.state {
                CellState::Resolved(value) => return Ok(value.clone()),
                CellState::Resolving { attempt, pending } => {
                    pending.upgrade().map(|shared| (*attempt, shared))
                }
                CellState::Unresolved => None,
            };

            match joined {
                Some((attempt, shared)) => {
                    debug!("{}: joining attempt {}", self.label, attempt);
                    (attempt, shared)
                }
                None => {
                    slot.attempts += 1;
                    let attempt = slot.attempts;
                    let shared: Shared<Resolution<T>> = resolve().boxed().shared();
                    match shared.downgrade() {
                        Some(weak) => {
                            slot.state = CellState::Resolving {
                                attempt,
                                pending: weak,
                            };
                        }
                        None => slot.state = CellState::Unresolved,
                    }
                    debug!("{}: starting attempt {}", self.label, attempt);
                    (attempt, shared)
                }
            }
        };

        let outcome = pending.await;

        let mut slot = self.slot.lock();
        let current = matches!(
            &slot.state,
            CellState::Resolving { attempt: running, .. } if *running == attempt
        );
        if current {
            slot.state = match &outcome {
                Ok(value) => {
                    debug!("{}: resolved by attempt {}", self.label, attempt);
                    CellState::Resolved(value.clone())
                }
                Err(e) => {
                    debug!("{}: attempt {} failed: {}", self.label, attempt, e);
                    CellState::Unresolved
                }
            };
        }

        outcome
    }
}

/// One cell per resolved value kind of an adapter
pub struct ResolutionCache {
    pub url: ResolutionCell<Option<PathBuf>>,
    pub data: ResolutionCell<Option<Bytes>>,
    pub thumbnail: ResolutionCell<Option<Bytes>>,
    pub size: ResolutionCell<Option<PixelSize>>,
    pub byte_count: ResolutionCell<Option<u64>>,
    pub duration: ResolutionCell<Option<f64>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            url: ResolutionCell::new("url"),
            data: ResolutionCell::new("data"),
            thumbnail: ResolutionCell::new("thumbnail"),
            size: ResolutionCell::new("size"),
            byte_count: ResolutionCell::new("byte_count"),
            duration: ResolutionCell::new("duration"),
        }
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}
