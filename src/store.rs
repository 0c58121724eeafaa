use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::page::Html;

/// The outcome of generating a route.
#[derive(Clone, Debug, PartialEq)]
pub enum Rendered {
    Page(Html),
    /// Non-permanent redirect to this location.
    Redirect(String),
}

#[derive(Debug)]
enum Slot {
    Generating,
    Ready {
        rendered: Rendered,
        generated_at: Instant,
        revalidating: bool,
    },
    /// The last generation errored and nothing was kept before it.
    Failed,
}

#[derive(Debug, PartialEq)]
pub enum Lookup {
    Fresh(Rendered),
    Stale(Rendered),
    Generating,
    Failed,
    Missing,
}

/// Generated artifacts keyed by route, in generation order.
///
/// Holds at most `capacity` settled routes; past that the oldest are dropped.
pub struct PageStore {
    slots: RwLock<IndexMap<String, Slot>>,
    revalidate: Duration,
    capacity: NonZeroUsize,
}

fn evict(slots: &mut IndexMap<String, Slot>, capacity: NonZeroUsize) {
    while slots.len() > capacity.get() {
        let Some(oldest) = slots
            .values()
            .position(|slot| !matches!(slot, Slot::Generating))
        else {
            break;
        };
        if let Some((route, _)) = slots.shift_remove_index(oldest) {
            tracing::debug!(route = %route, "evicted from page store");
        }
    }
}

impl PageStore {
    pub fn new(revalidate: Duration, capacity: NonZeroUsize) -> Self {
        PageStore {
            slots: RwLock::new(IndexMap::new()),
            revalidate,
            capacity,
        }
    }

    pub async fn lookup(&self, route: &str) -> Lookup {
        match self.slots.read().await.get(route) {
            None => Lookup::Missing,
            Some(Slot::Generating) => Lookup::Generating,
            Some(Slot::Failed) => Lookup::Failed,
            Some(Slot::Ready {
                rendered,
                generated_at,
                ..
            }) => {
                if generated_at.elapsed() >= self.revalidate {
                    Lookup::Stale(rendered.clone())
                } else {
                    Lookup::Fresh(rendered.clone())
                }
            }
        }
    }

    /// Claims the right to (re)generate `route`.
    ///
    /// Succeeds for a missing or failed route, or a stale one nobody is
    /// revalidating yet.
    pub async fn claim(&self, route: &str) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get_mut(route) {
            None => {
                slots.insert(route.to_string(), Slot::Generating);
                evict(&mut slots, self.capacity);
                true
            }
            Some(slot @ Slot::Failed) => {
                *slot = Slot::Generating;
                true
            }
            Some(Slot::Generating) => false,
            Some(Slot::Ready {
                generated_at,
                revalidating,
                ..
            }) => {
                if *revalidating || generated_at.elapsed() < self.revalidate {
                    false
                } else {
                    *revalidating = true;
                    true
                }
            }
        }
    }

    /// Stores a freshly generated artifact as the newest entry.
    pub async fn fill(&self, route: &str, rendered: Rendered) {
        let mut slots = self.slots.write().await;
        slots.shift_remove(route);
        slots.insert(
            route.to_string(),
            Slot::Ready {
                rendered,
                generated_at: Instant::now(),
                revalidating: false,
            },
        );
        evict(&mut slots, self.capacity);
    }

    /// Gives up a claim; a previously generated artifact stays in place.
    pub async fn release(&self, route: &str) {
        let mut slots = self.slots.write().await;
        match slots.get_mut(route) {
            Some(Slot::Generating) => {
                slots.shift_remove(route);
            }
            Some(Slot::Ready { revalidating, .. }) => *revalidating = false,
            Some(Slot::Failed) | None => {}
        }
    }

    /// Gives up a claim after a failed generation.
    ///
    /// A route with nothing to fall back on is marked [`Lookup::Failed`].
    pub async fn fail(&self, route: &str) {
        let mut slots = self.slots.write().await;
        match slots.get_mut(route) {
            Some(slot @ Slot::Generating) => *slot = Slot::Failed,
            Some(Slot::Ready { revalidating, .. }) => *revalidating = false,
            Some(Slot::Failed) | None => {}
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }
}
