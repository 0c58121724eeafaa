use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::{
    gateway::{Gateway, GatewayError},
    model::PostPagination,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// This many posts were appended.
    Appended(usize),
    /// There is no next page to fetch.
    Exhausted,
    /// Another activation is still waiting on the CMS.
    InFlight,
}

/// Owns the pagination state of one listing page.
///
/// Each successful [`load_more`](Self::load_more) replaces the state with a new
/// value derived from the previous one, and subscribers are notified.
pub struct ListingController {
    state: watch::Sender<PostPagination>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ListingController {
    pub fn new(initial: PostPagination) -> Self {
        let (state, _) = watch::channel(initial);
        ListingController {
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> PostPagination {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PostPagination> {
        self.state.subscribe()
    }

    pub fn can_load_more(&self) -> bool {
        self.state.borrow().has_next_page()
    }

    /// Fetches the page behind the current cursor and appends it.
    ///
    /// On error the state is left as it was and the call may be retried.
    pub async fn load_more(&self, gateway: &dyn Gateway) -> Result<LoadMore, GatewayError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Ok(LoadMore::InFlight);
        };

        let Some(cursor) = self.state.borrow().next_page.clone() else {
            return Ok(LoadMore::Exhausted);
        };

        let page = gateway.fetch_page(&cursor).await.inspect_err(|err| {
            tracing::warn!(cursor = cursor.as_str(), error = %err, "load more failed");
        })?;

        let (posts, next_page) = page.into_posts();
        let appended = posts.len();

        let merged = self.snapshot().appended(posts, next_page);
        tracing::debug!(
            appended,
            total = merged.results.len(),
            exhausted = !merged.has_next_page(),
            "loaded more posts"
        );
        self.state.send_replace(merged);

        Ok(LoadMore::Appended(appended))
    }
}
