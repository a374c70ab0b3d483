//! Phase-ordered, duration-based game event scheduler.
//!
//! One round of simulation is a fixed sequence of phases; each phase
//! owns an ordered list of events. Events carry an optional per-frame
//! callback, an optional end-of-round callback and a duration counted in
//! rounds (`-1` for perpetual). The session registers its whole round
//! pipeline here once, and timed effects come and go as temporary
//! events, so a new mechanic is one registration instead of another
//! hand-rolled field on the session state.

mod temporary;

pub use temporary::{TempCallbacks, TempEventKind, TempEventSpec, TempPayload, TempState};

use std::fmt;

use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, error};

use crate::save::SavedTempEvent;
use crate::session::GameCtx;

/// Duration value marking an event that never auto-completes.
pub const PERPETUAL_DURATION: i32 = -1;

/// Sequential stages of one simulation round, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// Mouse/keyboard input processing (driven by the front end).
    Input,
    /// Path recalculation and other logic that precedes movement.
    PreLogic,
    /// Adventurer movement.
    Adventurer,
    /// Collisions and pickups right after the adventurer moved.
    PostAdventurer,
    /// Dragon movement.
    Dragons,
    /// Collision checks again, dragons may have moved onto the hero.
    PostDragons,
    /// Round bookkeeping that must not interrupt the rest.
    Cleanup,
}

impl Phase {
    pub const COUNT: usize = 7;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Unique identifier of a registered event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EventFlags: u8 {
        /// Skip both callbacks until unpaused; duration is untouched.
        const PAUSED = 1 << 0;
        /// Ran out of duration; destroyed on the next sweep.
        const COMPLETED = 1 << 1;
        /// Never auto-completes.
        const PERPETUAL = 1 << 2;
    }
}

/// Callback invoked with the session context and the owning event.
///
/// Plain function values, registered once at session setup; the event
/// reference gives timed effects access to their own payload.
pub type EventCallback = fn(&mut GameCtx, &mut GameEvent);

/// One scheduled event inside a phase bucket.
#[derive(Debug)]
pub struct GameEvent {
    id: EventId,
    /// Remaining rounds, or [`PERPETUAL_DURATION`].
    pub duration: i32,
    on_frame: Option<EventCallback>,
    on_round_end: Option<EventCallback>,
    pub flags: EventFlags,
    /// Present for temporary events only.
    pub temp: Option<TempState>,
}

impl GameEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn is_paused(&self) -> bool {
        self.flags.contains(EventFlags::PAUSED)
    }

    pub fn is_perpetual(&self) -> bool {
        self.flags.contains(EventFlags::PERPETUAL)
    }

    pub fn temp_mut(&mut self) -> Option<&mut TempState> {
        self.temp.as_mut()
    }
}

/// The scheduler: one ordered event list per phase.
#[derive(Debug, Default)]
pub struct EventScheduler {
    phases: [Vec<GameEvent>; Phase::COUNT],
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plain event and returns its id.
    ///
    /// A duration of [`PERPETUAL_DURATION`] marks the event perpetual;
    /// ids grow monotonically (max existing id + 1) and events append to
    /// the back of their phase list.
    pub fn register(
        &mut self,
        phase: Phase,
        duration: i32,
        on_frame: Option<EventCallback>,
        on_round_end: Option<EventCallback>,
    ) -> EventId {
        let id = self.allocate_id();
        let flags = if duration == PERPETUAL_DURATION {
            EventFlags::PERPETUAL
        } else {
            EventFlags::empty()
        };
        self.phases[phase.index()].push(GameEvent {
            id,
            duration,
            on_frame,
            on_round_end,
            flags,
            temp: None,
        });
        debug!(%id, ?phase, duration, "registered event");
        id
    }

    /// Registers a temporary event and synchronously fires `on_create`.
    pub fn register_temporary(&mut self, ctx: &mut GameCtx, spec: TempEventSpec) -> EventId {
        let callbacks = spec.kind.callbacks();
        let id = self.push_temporary(
            spec.phase,
            spec.duration,
            spec.flags,
            spec.kind,
            spec.payload,
            callbacks,
        );
        debug!(%id, kind = %spec.kind, ?spec.phase, "registered temporary event");

        if let Some(event) = self.event_in_phase_mut(spec.phase, id) {
            let on_create = event.temp.as_ref().and_then(|temp| temp.on_create);
            if let Some(callback) = on_create {
                callback(ctx, event);
            }
        }
        id
    }

    /// Re-registers a saved temporary event without firing `on_create`;
    /// the effect is already applied in the saved game data.
    pub(crate) fn restore_temporary(&mut self, saved: SavedTempEvent) -> EventId {
        let callbacks = saved.kind.callbacks();
        let id = self.push_temporary(
            saved.phase,
            saved.duration,
            EventFlags::from_bits_truncate(saved.flags),
            saved.kind,
            saved.payload,
            callbacks,
        );
        debug!(%id, kind = %saved.kind, "restored temporary event from save");
        id
    }

    fn push_temporary(
        &mut self,
        phase: Phase,
        duration: i32,
        mut flags: EventFlags,
        kind: TempEventKind,
        payload: TempPayload,
        callbacks: TempCallbacks,
    ) -> EventId {
        let id = self.allocate_id();
        if duration == PERPETUAL_DURATION {
            flags |= EventFlags::PERPETUAL;
        }
        self.phases[phase.index()].push(GameEvent {
            id,
            duration,
            on_frame: callbacks.on_frame,
            on_round_end: callbacks.on_round_end,
            flags,
            temp: Some(TempState {
                kind,
                on_create: callbacks.on_create,
                on_destroy: callbacks.on_destroy,
                payload,
            }),
        });
        id
    }

    /// Removes an event, firing `on_destroy` for temporary events.
    ///
    /// Unknown ids are a logged no-op.
    pub fn unregister(&mut self, ctx: &mut GameCtx, id: EventId) -> bool {
        for bucket in 0..Phase::COUNT {
            if let Some(index) = self.phases[bucket].iter().position(|event| event.id == id) {
                self.destroy_at(ctx, bucket, index);
                return true;
            }
        }
        error!(%id, "tried to unregister an unknown event");
        false
    }

    /// Runs every non-paused event's `on_frame`, phase by phase.
    ///
    /// Expected to run once per rendered frame.
    pub fn frame_tick(&mut self, ctx: &mut GameCtx) {
        for phase in Phase::iter() {
            let bucket = phase.index();
            let mut index = 0;
            while index < self.phases[bucket].len() {
                let event = &mut self.phases[bucket][index];
                if !event.is_paused() {
                    if let Some(callback) = event.on_frame {
                        callback(ctx, event);
                    }
                }
                index += 1;
            }
            self.drain_pending(ctx);
        }
    }

    /// Runs end-of-round callbacks, duration accounting and removal.
    ///
    /// Runs only when a round boundary is reached, never twice for the
    /// same boundary. For every non-paused event in phase order: invoke
    /// `on_round_end`, decrement the duration unless perpetual, mark
    /// completed once it goes negative, then destroy completed events.
    pub fn round_tick(&mut self, ctx: &mut GameCtx) {
        for phase in Phase::iter() {
            let bucket = phase.index();
            let mut index = 0;
            while index < self.phases[bucket].len() {
                let event = &mut self.phases[bucket][index];
                if event.is_paused() {
                    index += 1;
                    continue;
                }

                if let Some(callback) = event.on_round_end {
                    callback(ctx, event);
                }

                let event = &mut self.phases[bucket][index];
                if !event.is_perpetual() {
                    if event.duration >= 0 {
                        event.duration -= 1;
                    }
                    if event.duration < 0 {
                        event.flags |= EventFlags::COMPLETED;
                    }
                }

                if event.flags.contains(EventFlags::COMPLETED) {
                    self.destroy_at(ctx, bucket, index);
                } else {
                    index += 1;
                }
            }
            self.drain_pending(ctx);
        }
    }

    /// Pauses every event currently in `phase`; later additions to the
    /// phase are unaffected.
    pub fn pause_phase(&mut self, phase: Phase) {
        for event in &mut self.phases[phase.index()] {
            event.flags |= EventFlags::PAUSED;
        }
    }

    pub fn unpause_phase(&mut self, phase: Phase) {
        for event in &mut self.phases[phase.index()] {
            event.flags -= EventFlags::PAUSED;
        }
    }

    pub fn events(&self, phase: Phase) -> &[GameEvent] {
        &self.phases[phase.index()]
    }

    pub fn event(&self, id: EventId) -> Option<&GameEvent> {
        self.phases.iter().flatten().find(|event| event.id == id)
    }

    /// All temporary events with their phases, for the save snapshot.
    pub fn temporary_events(&self) -> impl Iterator<Item = (Phase, &GameEvent)> {
        Phase::iter().flat_map(move |phase| {
            self.phases[phase.index()]
                .iter()
                .filter(|event| event.temp.is_some())
                .map(move |event| (phase, event))
        })
    }

    /// Registers temporary events queued from inside a tick.
    ///
    /// Callbacks cannot reach the scheduler they are running in, so
    /// in-tick registrations (item consumption) park on the context and
    /// are drained after each phase pass; `on_create` fires here.
    fn drain_pending(&mut self, ctx: &mut GameCtx) {
        while !ctx.pending.is_empty() {
            for spec in std::mem::take(&mut ctx.pending) {
                self.register_temporary(ctx, spec);
            }
        }
    }

    fn destroy_at(&mut self, ctx: &mut GameCtx, bucket: usize, index: usize) {
        let on_destroy = self.phases[bucket][index]
            .temp
            .as_ref()
            .and_then(|temp| temp.on_destroy);
        if let Some(callback) = on_destroy {
            callback(ctx, &mut self.phases[bucket][index]);
        }
        let event = self.phases[bucket].remove(index);
        debug!(id = %event.id, "destroyed event");
    }

    fn event_in_phase_mut(&mut self, phase: Phase, id: EventId) -> Option<&mut GameEvent> {
        self.phases[phase.index()]
            .iter_mut()
            .find(|event| event.id == id)
    }

    fn allocate_id(&self) -> EventId {
        let max = self
            .phases
            .iter()
            .flatten()
            .map(|event| event.id.0)
            .max()
            .unwrap_or(0);
        EventId(max + 1)
    }
}

#[cfg(test)]
mod tests {
    use game_core::{Dungeon, EntityStore, GameData};

    use super::*;

    fn test_ctx() -> GameCtx {
        GameCtx::new(GameData::new(Dungeon::new(2, 2), EntityStore::new()), 0)
    }

    // The treasure counter doubles as a callback-invocation counter:
    // fn pointers cannot capture state, so the callbacks count through
    // the context instead.
    fn bump(ctx: &mut GameCtx, _event: &mut GameEvent) {
        ctx.data.treasure_remaining += 1;
    }

    fn times_ten(ctx: &mut GameCtx, _event: &mut GameEvent) {
        ctx.data.treasure_remaining *= 10;
    }

    #[test]
    fn duration_n_removes_event_on_tick_n_plus_one() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        let id = scheduler.register(Phase::PreLogic, 2, None, Some(bump));

        scheduler.round_tick(&mut ctx);
        assert!(scheduler.event(id).is_some());
        scheduler.round_tick(&mut ctx);
        assert!(scheduler.event(id).is_some());
        scheduler.round_tick(&mut ctx);
        assert!(scheduler.event(id).is_none());

        // The callback also ran on the final tick.
        assert_eq!(ctx.data.treasure_remaining, 3);
    }

    #[test]
    fn zero_duration_event_lasts_exactly_one_round() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        let id = scheduler.register(Phase::Cleanup, 0, None, Some(bump));

        scheduler.round_tick(&mut ctx);
        assert!(scheduler.event(id).is_none());
        assert_eq!(ctx.data.treasure_remaining, 1);
    }

    #[test]
    fn perpetual_events_survive_any_number_of_rounds() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        let id = scheduler.register(Phase::Dragons, PERPETUAL_DURATION, None, Some(bump));

        for _ in 0..50 {
            scheduler.round_tick(&mut ctx);
        }
        let event = scheduler.event(id).unwrap();
        assert!(event.is_perpetual());
        assert_eq!(event.duration, PERPETUAL_DURATION);
        assert_eq!(ctx.data.treasure_remaining, 50);
    }

    #[test]
    fn pause_suppresses_callbacks_and_duration() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        let id = scheduler.register(Phase::Adventurer, 3, Some(bump), Some(bump));

        scheduler.pause_phase(Phase::Adventurer);
        scheduler.frame_tick(&mut ctx);
        scheduler.round_tick(&mut ctx);
        assert_eq!(ctx.data.treasure_remaining, 0);
        assert_eq!(scheduler.event(id).unwrap().duration, 3);

        scheduler.unpause_phase(Phase::Adventurer);
        scheduler.frame_tick(&mut ctx);
        scheduler.round_tick(&mut ctx);
        assert_eq!(ctx.data.treasure_remaining, 2);
        assert_eq!(scheduler.event(id).unwrap().duration, 2);
    }

    #[test]
    fn pausing_does_not_affect_later_registrations() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        scheduler.register(Phase::Input, PERPETUAL_DURATION, Some(bump), None);
        scheduler.pause_phase(Phase::Input);

        let late = scheduler.register(Phase::Input, PERPETUAL_DURATION, Some(bump), None);
        assert!(!scheduler.event(late).unwrap().is_paused());

        scheduler.frame_tick(&mut ctx);
        assert_eq!(ctx.data.treasure_remaining, 1);
    }

    #[test]
    fn phases_run_in_fixed_order() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        // Registered back to front; execution must still be Input first.
        scheduler.register(Phase::Cleanup, PERPETUAL_DURATION, Some(times_ten), None);
        scheduler.register(Phase::Input, PERPETUAL_DURATION, Some(bump), None);

        scheduler.frame_tick(&mut ctx);
        assert_eq!(ctx.data.treasure_remaining, 10);
    }

    #[test]
    fn ids_grow_from_the_current_maximum() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        let first = scheduler.register(Phase::Input, PERPETUAL_DURATION, None, None);
        let second = scheduler.register(Phase::Dragons, PERPETUAL_DURATION, None, None);
        assert_eq!(first, EventId(1));
        assert_eq!(second, EventId(2));

        assert!(scheduler.unregister(&mut ctx, second));
        let third = scheduler.register(Phase::Input, PERPETUAL_DURATION, None, None);
        assert_eq!(third, EventId(2));
    }

    #[test]
    fn unregistering_unknown_id_is_a_noop() {
        let mut ctx = test_ctx();
        let mut scheduler = EventScheduler::new();
        scheduler.register(Phase::Input, PERPETUAL_DURATION, Some(bump), None);

        assert!(!scheduler.unregister(&mut ctx, EventId(999)));
        scheduler.frame_tick(&mut ctx);
        assert_eq!(ctx.data.treasure_remaining, 1);
    }
}
