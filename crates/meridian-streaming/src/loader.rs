use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use meridian_core::{AssetClass, AssetId, AssetKey};
use meridian_host::WorldHost;
use tracing::{debug, trace, warn};

use crate::config::{AcquireOptions, LoaderConfig};
use crate::error::StreamingError;

/// Lifecycle of one acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Validated but not yet polled
    Idle,
    /// Waiting on the host, holding an in-flight slot
    RequestSent,
    Loaded,
    TimedOut,
}

/// Proof that an asset was resident when the acquire resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded {
    pub asset: AssetId,
    /// Game time spent waiting, in milliseconds
    pub waited_ms: u64,
}

/// One shared host request and how many acquires are waiting on it
#[derive(Debug, Clone, Copy)]
struct InFlight {
    subscribers: usize,
    requested_at: u64,
    /// A release hint went out while acquires were still waiting
    released: bool,
}

type InFlightTable = Rc<RefCell<HashMap<AssetId, InFlight>>>;

/// Streams assets in through the host catalog and waits for them to become
/// resident, bounded by a per-acquire game-time budget.
///
/// Concurrent acquires of the same asset share a single host request.
pub struct AsyncResourceLoader {
    host: Rc<dyn WorldHost>,
    config: LoaderConfig,
    in_flight: InFlightTable,
}

impl AsyncResourceLoader {
    pub fn new(host: Rc<dyn WorldHost>) -> Self {
        Self::with_config(host, LoaderConfig::default())
    }

    pub fn with_config(host: Rc<dyn WorldHost>, config: LoaderConfig) -> Self {
        Self {
            host,
            config,
            in_flight: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolve a key to an `AssetId` using the host's name hasher
    pub fn resolve(&self, class: AssetClass, key: &AssetKey) -> AssetId {
        let hash = key.resolve_with(|name| self.host.hash_name(name));
        AssetId::new(class, hash)
    }

    /// Whether the catalog knows this asset. Never triggers a load.
    pub fn is_valid(&self, class: AssetClass, key: impl Into<AssetKey>) -> bool {
        self.host.contains(self.resolve(class, &key.into()))
    }

    /// Whether the asset is resident right now. Never triggers a load.
    pub fn is_loaded(&self, class: AssetClass, key: impl Into<AssetKey>) -> bool {
        self.host.is_loaded(self.resolve(class, &key.into()))
    }

    /// Start acquiring an asset with the configured options for its class.
    ///
    /// An unknown key fails here, before any request is made. Otherwise the
    /// returned future must be polled (once per tick) to make progress.
    pub fn acquire(
        &self,
        class: AssetClass,
        key: impl Into<AssetKey>,
    ) -> Result<Acquire, StreamingError> {
        self.acquire_with(class, key, self.config.options_for(class))
    }

    /// Like [`acquire`](Self::acquire) with explicit options
    pub fn acquire_with(
        &self,
        class: AssetClass,
        key: impl Into<AssetKey>,
        options: AcquireOptions,
    ) -> Result<Acquire, StreamingError> {
        let asset = self.resolve(class, &key.into());
        self.acquire_id(asset, options)
    }

    /// Acquire an already resolved asset id
    pub fn acquire_id(
        &self,
        asset: AssetId,
        options: AcquireOptions,
    ) -> Result<Acquire, StreamingError> {
        if !self.host.contains(asset) {
            warn!("refusing to stream {asset}: not in the catalog");
            return Err(StreamingError::InvalidAsset { asset });
        }
        Ok(Acquire {
            asset,
            options,
            host: Rc::clone(&self.host),
            in_flight: Rc::clone(&self.in_flight),
            state: LoadState::Idle,
            started_at: 0,
            next_poll_at: 0,
        })
    }

    pub fn acquire_model(&self, key: impl Into<AssetKey>) -> Result<Acquire, StreamingError> {
        self.acquire(AssetClass::Model, key)
    }

    pub fn acquire_anim_dict(&self, key: impl Into<AssetKey>) -> Result<Acquire, StreamingError> {
        self.acquire(AssetClass::AnimDict, key)
    }

    pub fn acquire_anim_set(&self, key: impl Into<AssetKey>) -> Result<Acquire, StreamingError> {
        self.acquire(AssetClass::AnimSet, key)
    }

    pub fn acquire_texture_dict(
        &self,
        key: impl Into<AssetKey>,
    ) -> Result<Acquire, StreamingError> {
        self.acquire(AssetClass::TextureDict, key)
    }

    pub fn acquire_ptfx_asset(&self, key: impl Into<AssetKey>) -> Result<Acquire, StreamingError> {
        self.acquire(AssetClass::PtfxAsset, key)
    }

    /// Tell the host the asset may be evicted. Fire-and-forget: acquires
    /// still in flight re-request the asset if the host drops it.
    pub fn release(&self, asset: AssetId) {
        debug!("releasing {asset}");
        if let Some(entry) = self.in_flight.borrow_mut().get_mut(&asset) {
            entry.released = true;
        }
        self.host.release_hint(asset);
    }

    /// Assets with a host request in flight and how many acquires wait on each
    pub fn pending(&self) -> Vec<(AssetId, usize)> {
        self.in_flight
            .borrow()
            .iter()
            .map(|(&asset, entry)| (asset, entry.subscribers))
            .collect()
    }
}

/// Future returned by [`AsyncResourceLoader::acquire`].
///
/// Checks `is_loaded` at most once per poll interval. The budget starts on
/// the first poll. Dropping it before completion gives up its in-flight slot
/// without cancelling the host request.
pub struct Acquire {
    asset: AssetId,
    options: AcquireOptions,
    host: Rc<dyn WorldHost>,
    in_flight: InFlightTable,
    state: LoadState,
    started_at: u64,
    next_poll_at: u64,
}

impl Acquire {
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Join the shared request for this asset, issuing it if there is none
    fn subscribe(&mut self, now: u64) {
        let mut table = self.in_flight.borrow_mut();
        match table.get_mut(&self.asset) {
            Some(entry) => {
                entry.subscribers += 1;
                trace!(
                    "joined in-flight request for {} ({} waiting, issued at {})",
                    self.asset,
                    entry.subscribers,
                    entry.requested_at
                );
            }
            None => {
                self.host.request_load(self.asset);
                debug!("requested {}", self.asset);
                table.insert(
                    self.asset,
                    InFlight {
                        subscribers: 1,
                        requested_at: now,
                        released: false,
                    },
                );
            }
        }
        self.state = LoadState::RequestSent;
    }

    /// Issue the shared request again if a release hint may have evicted
    /// the asset out from under the remaining subscribers
    fn renew_if_released(&self, now: u64) {
        let mut table = self.in_flight.borrow_mut();
        if let Some(entry) = table.get_mut(&self.asset) {
            if entry.released {
                self.host.request_load(self.asset);
                debug!(
                    "re-requested {} after release ({} waiting)",
                    self.asset, entry.subscribers
                );
                entry.released = false;
                entry.requested_at = now;
            }
        }
    }

    fn unsubscribe(&mut self) {
        let mut table = self.in_flight.borrow_mut();
        if let Some(entry) = table.get_mut(&self.asset) {
            entry.subscribers -= 1;
            if entry.subscribers == 0 {
                table.remove(&self.asset);
            }
        }
    }

    fn finish(&mut self, state: LoadState) {
        if self.state == LoadState::RequestSent {
            self.unsubscribe();
        }
        self.state = state;
    }
}

impl Future for Acquire {
    type Output = Result<Loaded, StreamingError>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let now = this.host.game_timer();

        match this.state {
            LoadState::Idle => {
                this.started_at = now;
                if this.host.is_loaded(this.asset) {
                    this.finish(LoadState::Loaded);
                    return Poll::Ready(Ok(Loaded {
                        asset: this.asset,
                        waited_ms: 0,
                    }));
                }
                this.subscribe(now);
                this.next_poll_at = now.saturating_add(this.options.poll_interval_ms);
                return Poll::Pending;
            }
            LoadState::RequestSent => {}
            LoadState::Loaded => {
                return Poll::Ready(Ok(Loaded {
                    asset: this.asset,
                    waited_ms: 0,
                }))
            }
            LoadState::TimedOut => {
                return Poll::Ready(Err(StreamingError::Timeout {
                    asset: this.asset,
                    budget_ms: this.options.timeout_budget_ms,
                }))
            }
        }

        if now < this.next_poll_at {
            return Poll::Pending;
        }
        this.next_poll_at = now.saturating_add(this.options.poll_interval_ms);

        let elapsed = now.saturating_sub(this.started_at);
        if this.host.is_loaded(this.asset) {
            this.finish(LoadState::Loaded);
            debug!("{} loaded after {elapsed} ms", this.asset);
            return Poll::Ready(Ok(Loaded {
                asset: this.asset,
                waited_ms: elapsed,
            }));
        }
        if elapsed > this.options.timeout_budget_ms {
            this.finish(LoadState::TimedOut);
            warn!(
                "gave up on {} after {elapsed} ms (budget {} ms)",
                this.asset, this.options.timeout_budget_ms
            );
            return Poll::Ready(Err(StreamingError::Timeout {
                asset: this.asset,
                budget_ms: this.options.timeout_budget_ms,
            }));
        }
        this.renew_if_released(now);
        Poll::Pending
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        if self.state == LoadState::RequestSent {
            trace!("acquire for {} dropped while in flight", self.asset);
            self.unsubscribe();
        }
    }
}
