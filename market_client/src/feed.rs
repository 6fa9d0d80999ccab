//! Consumer-side market data feed.
//!
//! A `MarketDataFeed` turns the service's push updates into state a UI can read
//! whenever it redraws: `{ data, is_loading }`. Class feeds subscribe to the
//! service; the trending feed has no push channel and polls instead.
//!
//! Lifecycle:
//! - `mount` starts the subscription or the poll and fills the first state
//!   synchronously, so `is_loading` is already `false` when it returns.
//! - `unmount` (also run on drop) first marks the feed inactive, then waits for
//!   any update that is writing the state, then tears down the subscription or
//!   poll thread. Once it returns the state never changes again and no further
//!   render signal is sent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::Sender;
use log::{debug, warn};
use market_common::{AssetRecord, FeedKind, Result};
use market_server::{MarketDataService, PeriodicTask, Subscription};
use serde::Serialize;

/// What a consumer reads from a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    /// Latest records, empty until the first delivery.
    pub data: Vec<AssetRecord>,
    /// `true` until the first delivery.
    pub is_loading: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        FeedState {
            data: Vec::new(),
            is_loading: true,
        }
    }
}

struct FeedShared {
    kind: FeedKind,
    active: AtomicBool,
    state: Mutex<FeedState>,
    render: Option<Sender<FeedKind>>,
}

impl FeedShared {
    fn store(&self, data: Vec<AssetRecord>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        state.data = data;
        state.is_loading = false;
        if let Some(render) = &self.render {
            let _ = render.try_send(self.kind);
        }
    }

    fn deactivate(&self) -> bool {
        let was_active = self.active.swap(false, Ordering::AcqRel);
        // Waits out a store that passed the active check before the swap.
        drop(self.state.lock().unwrap_or_else(PoisonError::into_inner));
        was_active
    }
}

enum Source {
    Push(Subscription),
    Poll(PeriodicTask),
}

/// Live view of one feed kind, kept up to date until unmounted.
pub struct MarketDataFeed {
    shared: Arc<FeedShared>,
    source: Option<Source>,
}

impl MarketDataFeed {
    /// Mounts a feed without a render signal.
    pub fn mount(service: &MarketDataService, kind: FeedKind) -> Result<Self> {
        Self::mount_inner(service, kind, None)
    }

    /// Mounts a feed that sends its `kind` on `render` after every state change.
    pub fn mount_with_render(
        service: &MarketDataService,
        kind: FeedKind,
        render: Sender<FeedKind>,
    ) -> Result<Self> {
        Self::mount_inner(service, kind, Some(render))
    }

    fn mount_inner(
        service: &MarketDataService,
        kind: FeedKind,
        render: Option<Sender<FeedKind>>,
    ) -> Result<Self> {
        let shared = Arc::new(FeedShared {
            kind,
            active: AtomicBool::new(true),
            state: Mutex::new(FeedState::default()),
            render,
        });

        let source = match kind.asset_class() {
            Some(class) => {
                let sink = Arc::clone(&shared);
                let subscription =
                    service.subscribe(class, move |snapshot| sink.store(snapshot.to_vec()))?;
                debug!("Feed {} subscribed to {}", kind, subscription.class());
                Source::Push(subscription)
            }
            None => {
                shared.store(service.get_trending_data()?);
                let sink = Arc::clone(&shared);
                let poller = service.clone();
                let task = PeriodicTask::spawn(
                    "trending-poll",
                    service.config().trending_poll(),
                    move || {
                        if !sink.active.load(Ordering::Acquire) {
                            return false;
                        }
                        match poller.get_trending_data() {
                            Ok(data) => sink.store(data),
                            Err(e) => warn!("Trending poll failed: {}", e),
                        }
                        true
                    },
                )?;
                Source::Poll(task)
            }
        };
        debug!("Feed {} mounted", kind);

        Ok(Self {
            shared,
            source: Some(source),
        })
    }

    /// Feed kind.
    pub fn kind(&self) -> FeedKind {
        self.shared.kind
    }

    /// Copy of the current state.
    pub fn state(&self) -> FeedState {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `true` until unmounted.
    pub fn is_mounted(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Stops all updates. Idempotent.
    pub fn unmount(&mut self) {
        if !self.shared.deactivate() {
            return;
        }
        match self.source.take() {
            Some(Source::Push(subscription)) => subscription.unsubscribe(),
            Some(Source::Poll(mut task)) => task.stop(),
            None => {}
        }
        debug!("Feed {} unmounted", self.shared.kind);
    }
}

impl Drop for MarketDataFeed {
    fn drop(&mut self) {
        self.unmount();
    }
}
