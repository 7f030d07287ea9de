use deck_engine::{Aabb, AnimatedPart, ObjectId, Pose, PoseRates, TouchId, TouchSession};
use glam::Vec3;
use tracing::{debug, info};

use super::collab::AudioSink;
use super::player::CassettePlayer;
use crate::app::config::{HoldConfig, TapeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TapeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TapeState {
    Free,
    Held,
    Inserted,
}

/// What a holdable needs to see while a touch picks it up or lets go.
pub(crate) struct HoldContext<'a> {
    pub(crate) player: &'a mut CassettePlayer,
    pub(crate) audio: &'a mut dyn AudioSink,
    /// Sessions other than the acting one that currently hold something.
    pub(crate) other_holders: usize,
}

/// Capability of props a touch session can pick up and carry.
pub(crate) trait Holdable {
    /// Binds `session` to this object. Returns `false` when the hold is refused.
    fn try_hold(&mut self, session: &mut TouchSession, context: &mut HoldContext<'_>) -> bool;
    fn release(&mut self, session: &mut TouchSession, context: &mut HoldContext<'_>);
}

#[derive(Debug, Clone)]
pub(crate) struct CassetteTape {
    id: TapeId,
    collider: ObjectId,
    name: String,
    clip_length_seconds: f32,
    state: TapeState,
    held_by: Option<TouchId>,
    over_slot: bool,
    progress: f32,
    part: AnimatedPart,
    origin: Pose,
    hold_rates: PoseRates,
    return_rates: PoseRates,
    half_extents: Vec3,
}

impl CassetteTape {
    pub(crate) fn new(id: TapeId, collider: ObjectId, config: &TapeConfig, hold: &HoldConfig) -> Self {
        let origin = config.origin.to_pose();
        let return_rates = PoseRates::uniform(hold.return_speed);
        Self {
            id,
            collider,
            name: config.name.clone(),
            clip_length_seconds: config.clip_length_seconds,
            state: TapeState::Free,
            held_by: None,
            over_slot: false,
            progress: 0.0,
            part: AnimatedPart::at_rest(origin, return_rates, hold.snap_threshold),
            origin,
            hold_rates: PoseRates::uniform(hold.hold_speed),
            return_rates,
            half_extents: Vec3::from_array(hold.tape_half_extents),
        }
    }

    pub(crate) fn id(&self) -> TapeId {
        self.id
    }

    pub(crate) fn collider(&self) -> ObjectId {
        self.collider
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn clip_length_seconds(&self) -> f32 {
        self.clip_length_seconds
    }

    pub(crate) fn state(&self) -> TapeState {
        self.state
    }

    pub(crate) fn held_by(&self) -> Option<TouchId> {
        self.held_by
    }

    pub(crate) fn progress(&self) -> f32 {
        self.progress
    }

    pub(crate) fn pose(&self) -> Pose {
        self.part.pose()
    }

    #[allow(dead_code)]
    pub(crate) fn origin(&self) -> Pose {
        self.origin
    }

    pub(crate) fn bounds(&self) -> Aabb {
        let pose = self.part.pose();
        Aabb::from_center_half_extents(pose.position, self.half_extents * pose.scale)
    }

    /// Eases toward `target` at the carrying speed.
    pub(crate) fn follow(&mut self, target: Pose) {
        self.part.set_rates(self.hold_rates);
        self.part.retarget(target);
    }

    /// Held pose at `point`: the tape keeps its resting orientation and scale.
    pub(crate) fn carried_pose(&self, point: Vec3) -> Pose {
        Pose {
            position: point,
            ..self.origin
        }
    }

    /// Records whether the carry point is over the slot. Returns `true` only on
    /// the tick it arrives there.
    pub(crate) fn track_slot_overlap(&mut self, over_slot: bool) -> bool {
        let arrived = over_slot && !self.over_slot;
        self.over_slot = over_slot;
        arrived
    }

    pub(crate) fn mark_inserted(&mut self) {
        self.state = TapeState::Inserted;
    }

    /// Logical ejection while a touch still carries the tape.
    pub(crate) fn mark_held(&mut self, progress: f32) {
        self.progress = progress;
        self.state = TapeState::Held;
    }

    /// The player let go of this tape: it becomes free and heads home,
    /// unless a touch is still carrying it.
    pub(crate) fn on_ejected(&mut self, progress: f32) {
        self.progress = progress;
        if self.held_by.is_some() {
            self.state = TapeState::Held;
            return;
        }
        self.state = TapeState::Free;
        self.return_home();
    }

    /// Rigidly locks the tape onto the slot, no catch-up motion.
    pub(crate) fn pin_to(&mut self, pose: Pose) {
        self.part.snap_to(pose);
    }

    pub(crate) fn animate(&mut self, dt_seconds: f32) -> bool {
        self.part.tick(dt_seconds)
    }

    fn return_home(&mut self) {
        self.part.set_rates(self.return_rates);
        self.part.retarget(self.origin);
    }
}

impl Holdable for CassetteTape {
    fn try_hold(&mut self, session: &mut TouchSession, context: &mut HoldContext<'_>) -> bool {
        if let Some(holder) = self.held_by {
            debug!(
                tape = self.id.0,
                holder = holder.0,
                touch = session.id().0,
                reason = "already_held",
                "tape_hold_rejected"
            );
            return false;
        }
        if self.state == TapeState::Inserted && !context.player.is_door_open() {
            debug!(tape = self.id.0, reason = "door_closed", "tape_hold_rejected");
            return false;
        }

        self.held_by = Some(session.id());
        session.held_object = Some(self.collider);
        if self.state == TapeState::Free {
            self.state = TapeState::Held;
        }
        if context.player.is_stowed() && !context.player.is_door_open() {
            context.player.toggle_door(true, context.audio);
        }
        info!(tape = self.id.0, touch = session.id().0, "tape_held");
        true
    }

    fn release(&mut self, session: &mut TouchSession, context: &mut HoldContext<'_>) {
        if self.held_by != Some(session.id()) {
            return;
        }
        self.held_by = None;
        self.over_slot = false;
        session.held_object = None;

        if self.state == TapeState::Inserted {
            self.pin_to(context.player.insertion_pose());
        } else {
            self.state = TapeState::Free;
            self.return_home();
        }
        if context.player.is_stowed() && context.other_holders == 0 {
            context.player.toggle_door(false, context.audio);
        }
        info!(tape = self.id.0, state = ?self.state, "tape_released");
    }
}

/// Every tape prop on the desk, indexed by [`TapeId`].
#[derive(Debug, Clone, Default)]
pub(crate) struct TapeRack {
    tapes: Vec<CassetteTape>,
}

impl TapeRack {
    pub(crate) fn push(&mut self, tape: CassetteTape) {
        self.tapes.push(tape);
    }

    pub(crate) fn get(&self, id: TapeId) -> Option<&CassetteTape> {
        self.tapes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: TapeId) -> Option<&mut CassetteTape> {
        self.tapes.get_mut(id.0)
    }

    pub(crate) fn by_collider(&self, collider: ObjectId) -> Option<TapeId> {
        self.tapes
            .iter()
            .find(|tape| tape.collider == collider)
            .map(CassetteTape::id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &CassetteTape> {
        self.tapes.iter()
    }

    pub(crate) fn ids(&self) -> Vec<TapeId> {
        self.tapes.iter().map(CassetteTape::id).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.tapes.len()
    }

    /// Number of tapes carried by touches other than `touch`.
    pub(crate) fn holders_except(&self, touch: TouchId) -> usize {
        self.tapes
            .iter()
            .filter(|tape| tape.held_by.is_some_and(|holder| holder != touch))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::app::config::{PlayerConfig, SavedPose};
    use crate::app::desk::collab::recording::RecordingAudio;
    use crate::app::desk::collab::Cue;

    fn tape() -> CassetteTape {
        let config = TapeConfig {
            name: "Demo".to_string(),
            clip_length_seconds: 30.0,
            origin: SavedPose {
                position: [-3.0, -3.0, 0.0],
                ..SavedPose::default()
            },
        };
        CassetteTape::new(TapeId(0), ObjectId(7), &config, &HoldConfig::default())
    }

    fn session(id: u64) -> TouchSession {
        TouchSession::new(TouchId(id), Vec2::new(100.0, 100.0))
    }

    #[test]
    fn hold_binds_both_sides_and_opens_stowed_door() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut touch = session(1);

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 0,
        };
        assert!(tape.try_hold(&mut touch, &mut context));

        assert_eq!(tape.held_by(), Some(TouchId(1)));
        assert_eq!(tape.state(), TapeState::Held);
        assert_eq!(touch.held_object, Some(ObjectId(7)));
        assert!(player.is_door_open());
        assert_eq!(audio.count(Cue::DoorOpen), 1);
    }

    #[test]
    fn second_session_cannot_steal_a_held_tape() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut first = session(1);
        let mut second = session(2);

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 0,
        };
        assert!(tape.try_hold(&mut first, &mut context));
        assert!(!tape.try_hold(&mut second, &mut context));
        assert_eq!(tape.held_by(), Some(TouchId(1)));
        assert_eq!(second.held_object, None);
    }

    #[test]
    fn release_outside_slot_heads_home_and_closes_door() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut touch = session(1);

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 0,
        };
        tape.try_hold(&mut touch, &mut context);
        tape.follow(tape.carried_pose(Vec3::new(2.0, 2.0, -1.0)));
        for _ in 0..10 {
            tape.animate(1.0 / 60.0);
        }
        tape.release(&mut touch, &mut context);

        assert_eq!(tape.state(), TapeState::Free);
        assert_eq!(tape.held_by(), None);
        assert_eq!(touch.held_object, None);
        assert!(!player.is_door_open());

        let mut snapped = false;
        for _ in 0..600 {
            snapped |= tape.animate(1.0 / 60.0);
        }
        assert!(snapped);
        assert_eq!(tape.pose(), tape.origin());
    }

    #[test]
    fn release_keeps_door_open_while_another_touch_holds() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut touch = session(1);

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 1,
        };
        tape.try_hold(&mut touch, &mut context);
        tape.release(&mut touch, &mut context);
        assert!(player.is_door_open());
    }

    #[test]
    fn release_from_foreign_session_is_ignored() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut owner = session(1);
        let mut stranger = session(2);

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 0,
        };
        tape.try_hold(&mut owner, &mut context);
        tape.release(&mut stranger, &mut context);
        assert_eq!(tape.held_by(), Some(TouchId(1)));
    }

    #[test]
    fn inserted_tape_behind_a_closed_door_cannot_be_held() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut touch = session(1);

        player.toggle_door(true, &mut audio);
        player.insert_tape(TapeId(0), "Demo", 30.0, 0.0, &mut audio);
        tape.mark_inserted();
        player.toggle_door(false, &mut audio);

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 0,
        };
        assert!(!tape.try_hold(&mut touch, &mut context));
        assert_eq!(tape.held_by(), None);
        assert_eq!(tape.state(), TapeState::Inserted);
        assert_eq!(touch.held_object, None);
        assert!(!player.is_door_open());
    }

    #[test]
    fn inserted_tape_can_be_taken_once_the_door_opens() {
        let mut player = CassettePlayer::new(&PlayerConfig::default());
        let mut audio = RecordingAudio::default();
        let mut tape = tape();
        let mut touch = session(1);

        player.toggle_door(true, &mut audio);
        player.insert_tape(TapeId(0), "Demo", 30.0, 0.0, &mut audio);
        tape.mark_inserted();

        let mut context = HoldContext {
            player: &mut player,
            audio: &mut audio,
            other_holders: 0,
        };
        assert!(tape.try_hold(&mut touch, &mut context));
        assert_eq!(tape.held_by(), Some(TouchId(1)));
        assert_eq!(tape.state(), TapeState::Inserted);
    }

    #[test]
    fn slot_overlap_reports_arrival_once() {
        let mut tape = tape();
        assert!(tape.track_slot_overlap(true));
        assert!(!tape.track_slot_overlap(true));
        assert!(!tape.track_slot_overlap(false));
        assert!(tape.track_slot_overlap(true));
    }

    #[test]
    fn ejected_while_carried_stays_held() {
        let mut tape = tape();
        tape.mark_inserted();
        tape.held_by = Some(TouchId(3));
        tape.on_ejected(0.25);
        assert_eq!(tape.state(), TapeState::Held);
        assert_eq!(tape.progress(), 0.25);
    }

    #[test]
    fn rack_counts_other_holders() {
        let mut rack = TapeRack::default();
        let mut first = tape();
        first.held_by = Some(TouchId(1));
        let mut second = tape();
        second.id = TapeId(1);
        second.collider = ObjectId(8);
        second.held_by = Some(TouchId(2));
        rack.push(first);
        rack.push(second);

        assert_eq!(rack.holders_except(TouchId(1)), 1);
        assert_eq!(rack.holders_except(TouchId(9)), 2);
        assert_eq!(rack.by_collider(ObjectId(8)), Some(TapeId(1)));
    }
}
