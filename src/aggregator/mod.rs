//! Provider output aggregation.
//!
//! Owns the single provider-group subscription. Every push becomes a fresh
//! [`ProviderSnapshot`]; it is published only when the change detector
//! says the visible content moved. Otherwise the previously published
//! `Arc` stays in place, so consumers comparing by pointer skip work.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::host::protocol::{ProviderConfig, ProviderGroupConfig};
use crate::host::{HostError, ProviderHost, ProviderSubscription};
use crate::snapshot::change::has_changed;
use crate::snapshot::{ProviderOutputs, ProviderSnapshot};

/// Published snapshot slot. `None` until the first push.
pub type SnapshotRx = watch::Receiver<Option<Arc<ProviderSnapshot>>>;

/// Date pattern handed to the clock provider.
pub const DATE_FORMAT: &str = "EEE d MMM t h:mm a";
pub const DATE_LOCALE: &str = "en-US";
/// Window-manager provider refresh interval.
pub const KOMOREBI_REFRESH_MS: u64 = 1000;
pub const WEATHER_LATITUDE: f64 = 6.0108;
pub const WEATHER_LONGITUDE: f64 = -75.4275;

/// The fixed provider group this widget subscribes to.
pub fn provider_group_config() -> ProviderGroupConfig {
    ProviderGroupConfig::default()
        .with("media", ProviderConfig::Media)
        .with(
            "komorebi",
            ProviderConfig::Komorebi {
                refresh_interval_ms: KOMOREBI_REFRESH_MS,
            },
        )
        .with("cpu", ProviderConfig::Cpu)
        .with(
            "date",
            ProviderConfig::Date {
                formatting: DATE_FORMAT.into(),
                locale: DATE_LOCALE.into(),
            },
        )
        .with("memory", ProviderConfig::Memory)
        .with(
            "weather",
            ProviderConfig::Weather {
                latitude: WEATHER_LATITUDE,
                longitude: WEATHER_LONGITUDE,
            },
        )
        .with("audio", ProviderConfig::Audio)
        .with("systray", ProviderConfig::Systray)
}

pub struct ProviderOutputAggregator {
    subscription: ProviderSubscription,
    published: watch::Sender<Option<Arc<ProviderSnapshot>>>,
}

impl ProviderOutputAggregator {
    /// Subscribe to the host's provider group with the fixed configuration.
    pub fn subscribe<H: ProviderHost>(host: &mut H) -> Result<Self, HostError> {
        let subscription = host.subscribe(provider_group_config())?;
        Ok(Self::from_subscription(subscription))
    }

    /// Wrap an open subscription. Outputs the host already holds are
    /// published right away.
    pub fn from_subscription(subscription: ProviderSubscription) -> Self {
        let (published, _) = watch::channel(None);
        let aggregator = Self {
            subscription,
            published,
        };
        let initial = aggregator.subscription.current_outputs();
        if !initial.is_empty() {
            aggregator.apply_push(&initial);
        }
        aggregator
    }

    /// A receiver observing every published snapshot.
    pub fn snapshots(&self) -> SnapshotRx {
        self.published.subscribe()
    }

    /// Build a snapshot from one push and publish it if it changed.
    ///
    /// Returns whether a new snapshot was published.
    pub fn apply_push(&self, outputs: &ProviderOutputs) -> bool {
        let next = Arc::new(ProviderSnapshot::from_outputs(outputs));
        self.published.send_if_modified(|slot| {
            if has_changed(slot.as_ref(), Some(&next)) {
                *slot = Some(Arc::clone(&next));
                true
            } else {
                false
            }
        })
    }

    /// Apply pushes in arrival order until the host goes away or `cancel`
    /// fires. Consumes the aggregator; the subscription is dropped on
    /// return, which unsubscribes.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("aggregator cancelled");
                    break;
                }
                push = self.subscription.recv() => {
                    let Some(outputs) = push else {
                        tracing::info!("provider group closed");
                        break;
                    };
                    if self.apply_push(&outputs) {
                        tracing::trace!("snapshot published");
                    }
                }
            }
        }
    }
}
