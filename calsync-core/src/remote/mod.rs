//! Remote event sources backed by provider binaries.

pub mod convert;
pub mod protocol;
pub mod provider;

use std::collections::HashMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::event::{Event, Side};
use crate::remote::protocol::{CreateEvent, DeleteEvent, ListEvents, UpdateEvent};
use crate::remote::provider::Provider;
use crate::source::{EventSource, SyncWindow};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Remote provider configuration (e.g., which database or calendar to use)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }
}

/// An `EventSource` that talks to a provider binary for one side.
pub struct RemoteSource {
    side: Side,
    remote: Remote,
    tz: Tz,
}

impl RemoteSource {
    pub fn new(side: Side, remote: Remote, tz: Tz) -> Self {
        RemoteSource { side, remote, tz }
    }

    fn native_id<'a>(&self, event: &'a Event) -> SyncResult<&'a str> {
        event.native_id(self.side).ok_or_else(|| {
            SyncError::InvalidEvent(format!(
                "'{}' has no {} id to address",
                event.label(),
                self.side
            ))
        })
    }
}

impl EventSource for RemoteSource {
    fn side(&self) -> Side {
        self.side
    }

    async fn list_upcoming(&self, window: &SyncWindow) -> SyncResult<Vec<Event>> {
        let remote_events = self
            .remote
            .provider
            .call(ListEvents {
                remote_config: self.remote.remote_config(),
                from: window.from.to_rfc3339(),
            })
            .await?;

        // A malformed record fails the whole snapshot: dropping it would read as a deletion
        let events = remote_events
            .into_iter()
            .map(|remote_event| convert::from_remote(remote_event, self.side, self.tz))
            .collect::<SyncResult<Vec<_>>>()?;

        info!(side = %self.side, count = events.len(), "listed events");
        Ok(events)
    }

    async fn create(&self, event: &Event) -> SyncResult<String> {
        let mut remote_event = convert::to_remote(event, self.side, self.tz);
        remote_event.id = None;

        let native_id = self
            .remote
            .provider
            .call(CreateEvent {
                remote_config: self.remote.remote_config(),
                event: remote_event,
            })
            .await?;

        if native_id.trim().is_empty() {
            warn!(side = %self.side, event = event.label(), "provider returned an empty id");
            return Err(SyncError::Provider("Provider returned an empty event id".into()));
        }

        info!(side = %self.side, event = event.label(), native_id = %native_id, "created event");
        Ok(native_id)
    }

    async fn update(&self, event: &Event) -> SyncResult<()> {
        self.native_id(event)?;

        self.remote
            .provider
            .call(UpdateEvent {
                remote_config: self.remote.remote_config(),
                event: convert::to_remote(event, self.side, self.tz),
            })
            .await?;

        info!(side = %self.side, event = event.label(), "updated event");
        Ok(())
    }

    async fn delete(&self, event: &Event) -> SyncResult<()> {
        let native_id = self.native_id(event)?;
        debug!(side = %self.side, event = event.label(), native_id, "deleting event");

        self.remote
            .provider
            .call(DeleteEvent {
                remote_config: self.remote.remote_config(),
                event_id: native_id.to_string(),
            })
            .await?;

        info!(side = %self.side, event = event.label(), "deleted event");
        Ok(())
    }
}
