//! Event persistence.
//!
//! Pending events wait for their outbound observations under one key;
//! completed events get the next contiguous id and are stored as JSON for
//! off-chain indexers. `last-event-id` is the global id watermark.

use super::{keys, pad_height, Keeper};
use crate::errors::KeeperError;
use shared_types::{Event, EventId, EventStatus, Tx, TxId};
use tracing::debug;

impl Keeper {
    /// The last assigned event id.
    pub fn get_last_event_id(&self) -> Result<EventId, KeeperError> {
        Ok(self.fetch_json(keys::LAST_EVENT_ID)?.unwrap_or_default())
    }

    /// Events still waiting on outbound observations.
    pub fn get_incomplete_events(&self) -> Result<Vec<Event>, KeeperError> {
        Ok(self.fetch_json(keys::INCOMPLETE_EVENTS)?.unwrap_or_default())
    }

    /// Replace the pending event list.
    pub fn set_incomplete_events(&mut self, events: &[Event]) -> Result<(), KeeperError> {
        if events.is_empty() {
            self.remove(keys::INCOMPLETE_EVENTS)
        } else {
            self.put_json(keys::INCOMPLETE_EVENTS, &events)
        }
    }

    /// Queue an event until its outbound legs are observed.
    pub fn add_incomplete_event(&mut self, event: Event) -> Result<(), KeeperError> {
        let mut events = self.get_incomplete_events()?;
        events.push(event);
        self.put_json(keys::INCOMPLETE_EVENTS, &events)
    }

    /// Assign the next id and persist the event as completed.
    pub fn set_completed_event(&mut self, mut event: Event) -> Result<EventId, KeeperError> {
        let id = self.get_last_event_id()? + 1;
        event.id = id;
        debug!(id, event_type = %event.event_type, "event completed");
        self.put_json(&format!("{}{}", keys::EVENT, pad_height(id)), &event)?;
        self.put_json(keys::LAST_EVENT_ID, &id)?;
        Ok(id)
    }

    /// Fetch a completed event by id.
    pub fn get_event(&self, id: EventId) -> Result<Event, KeeperError> {
        self.fetch_json(&format!("{}{}", keys::EVENT, pad_height(id)))?
            .ok_or_else(|| KeeperError::NotFound(format!("event {id}")))
    }

    /// All completed events, in id order.
    pub fn get_completed_events(&self) -> Result<Vec<Event>, KeeperError> {
        let mut out = Vec::new();
        for (key, bytes) in self
            .scan_raw(keys::EVENT)?
        {
            let event = serde_json::from_slice(&bytes).map_err(|e| KeeperError::Codec {
                key,
                reason: e.to_string(),
            })?;
            out.push(event);
        }
        Ok(out)
    }

    /// Complete every pending event tied to the inbound tx id: attach the
    /// outbound tx, and persist once all outbound legs have arrived.
    /// Returns the ids assigned, empty when events are still waiting.
    pub fn complete_events(
        &mut self,
        in_hash: &TxId,
        out_tx: Tx,
        pending_outbounds: usize,
        status: EventStatus,
    ) -> Result<Vec<EventId>, KeeperError> {
        let mut remaining = Vec::new();
        let mut ids = Vec::new();
        for mut event in self.get_incomplete_events()? {
            if &event.in_tx.id != in_hash {
                remaining.push(event);
                continue;
            }
            if !event.out_txs.iter().any(|t| t.id == out_tx.id) {
                event.out_txs.push(out_tx.clone());
            }
            if event.out_txs.len() >= pending_outbounds {
                event.status = status;
                ids.push(self.set_completed_event(event)?);
            } else {
                remaining.push(event);
            }
        }
        self.set_incomplete_events(&remaining)?;
        Ok(ids)
    }
}
