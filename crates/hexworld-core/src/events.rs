//! Outbound notifications from the map core to the surrounding server.
//!
//! The core never talks to clients directly. Every observable change is
//! reported through a [`WorldEvents`] implementation supplied by the
//! embedding server, which decides how (and whether) to put it on the
//! wire. All methods default to no-ops so sinks implement only what they
//! forward.

use crate::hex::HexPos;
use crate::id::{CritterId, ItemId, LocationId, MapId, ProtoId};

/// Sink for notifications emitted by the map core.
pub trait WorldEvents {
    /// `target` entered `viewer`'s field of view.
    fn critter_appeared(&mut self, viewer: CritterId, target: CritterId) {
        let _ = (viewer, target);
    }

    /// `target` left `viewer`'s field of view.
    fn critter_disappeared(&mut self, viewer: CritterId, target: CritterId) {
        let _ = (viewer, target);
    }

    /// `item` became visible to `viewer`.
    fn item_appeared(&mut self, viewer: CritterId, item: ItemId) {
        let _ = (viewer, item);
    }

    /// `item` stopped being visible to `viewer`.
    fn item_disappeared(&mut self, viewer: CritterId, item: ItemId) {
        let _ = (viewer, item);
    }

    /// A static effect is played at `hex` for `viewer`.
    fn effect(&mut self, viewer: CritterId, effect: ProtoId, hex: HexPos, radius: u16) {
        let _ = (viewer, effect, hex, radius);
    }

    /// A flying effect travels between two hexes for `viewer`.
    #[allow(clippy::too_many_arguments)]
    fn fly_effect(
        &mut self,
        viewer: CritterId,
        effect: ProtoId,
        from_critter: Option<CritterId>,
        to_critter: Option<CritterId>,
        from: HexPos,
        to: HexPos,
    ) {
        let _ = (viewer, effect, from_critter, to_critter, from, to);
    }

    /// A map-level property changed and must be resent.
    fn property_changed(&mut self, map: MapId, key: &str) {
        let _ = (map, key);
    }

    /// A critter moved between containers (`None` is the global map).
    fn critter_transited(&mut self, critter: CritterId, from: Option<MapId>, to: Option<MapId>) {
        let _ = (critter, from, to);
    }

    /// One of a map's loop timers fired.
    fn map_loop(&mut self, map: MapId, index: usize) {
        let _ = (map, index);
    }

    /// A location and all of its maps were deleted.
    fn location_deleted(&mut self, location: LocationId) {
        let _ = location;
    }
}

/// A sink that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEvents;

impl WorldEvents for NullEvents {}
