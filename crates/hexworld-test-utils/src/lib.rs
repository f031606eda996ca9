//! Test utilities for hexworld development.
//!
//! Provides a [`MapBuilder`] for assembling map prototypes, critter and
//! item shorthands, and [`RecordingEvents`], a [`WorldEvents`] sink that
//! records every notification for later assertions.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use hexworld_core::{CritterId, HexPos, ItemId, LocationId, MapId, ProtoId, WorldEvents};

pub use fixtures::{blocker, npc, open_map, player, runtime_map, MapBuilder};

/// One recorded notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    CritterAppeared { viewer: CritterId, target: CritterId },
    CritterDisappeared { viewer: CritterId, target: CritterId },
    ItemAppeared { viewer: CritterId, item: ItemId },
    ItemDisappeared { viewer: CritterId, item: ItemId },
    Effect { viewer: CritterId, effect: ProtoId, hex: HexPos, radius: u16 },
    FlyEffect { viewer: CritterId, effect: ProtoId, from: HexPos, to: HexPos },
    PropertyChanged { map: MapId, key: String },
    Transited { critter: CritterId, from: Option<MapId>, to: Option<MapId> },
    MapLoop { map: MapId, index: usize },
    LocationDeleted { location: LocationId },
}

/// A [`WorldEvents`] sink recording into a shared log.
///
/// Clones share the log, so a test keeps one clone and hands the other
/// to the code under test.
#[derive(Clone, Debug, Default)]
pub struct RecordingEvents {
    log: Arc<Mutex<Vec<Event>>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    fn push(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }
}

impl WorldEvents for RecordingEvents {
    fn critter_appeared(&mut self, viewer: CritterId, target: CritterId) {
        self.push(Event::CritterAppeared { viewer, target });
    }

    fn critter_disappeared(&mut self, viewer: CritterId, target: CritterId) {
        self.push(Event::CritterDisappeared { viewer, target });
    }

    fn item_appeared(&mut self, viewer: CritterId, item: ItemId) {
        self.push(Event::ItemAppeared { viewer, item });
    }

    fn item_disappeared(&mut self, viewer: CritterId, item: ItemId) {
        self.push(Event::ItemDisappeared { viewer, item });
    }

    fn effect(&mut self, viewer: CritterId, effect: ProtoId, hex: HexPos, radius: u16) {
        self.push(Event::Effect {
            viewer,
            effect,
            hex,
            radius,
        });
    }

    fn fly_effect(
        &mut self,
        viewer: CritterId,
        effect: ProtoId,
        _from_critter: Option<CritterId>,
        _to_critter: Option<CritterId>,
        from: HexPos,
        to: HexPos,
    ) {
        self.push(Event::FlyEffect {
            viewer,
            effect,
            from,
            to,
        });
    }

    fn property_changed(&mut self, map: MapId, key: &str) {
        self.push(Event::PropertyChanged {
            map,
            key: key.to_string(),
        });
    }

    fn critter_transited(&mut self, critter: CritterId, from: Option<MapId>, to: Option<MapId>) {
        self.push(Event::Transited { critter, from, to });
    }

    fn map_loop(&mut self, map: MapId, index: usize) {
        self.push(Event::MapLoop { map, index });
    }

    fn location_deleted(&mut self, location: LocationId) {
        self.push(Event::LocationDeleted { location });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_log() {
        let rec = RecordingEvents::new();
        let mut sink = rec.clone();
        sink.map_loop(MapId(1), 2);
        assert_eq!(rec.events(), vec![Event::MapLoop { map: MapId(1), index: 2 }]);
        assert_eq!(rec.take().len(), 1);
        assert!(rec.events().is_empty());
    }
}
