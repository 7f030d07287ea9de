use deck_engine::{Aabb, AnimatedPart, Pose, PoseRates};
use glam::Vec3;
use tracing::{debug, info};

use super::buttons::{ButtonPanel, DeckButton};
use super::collab::{AudioSink, Cue, Emitter, TransportReadout};
use super::tape::TapeId;
use super::transport::TapeTransport;
use crate::app::config::PlayerConfig;

/// Tape released by the player during its own animation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TapeEjected {
    pub(crate) tape: TapeId,
    pub(crate) progress: f32,
}

/// The cassette player: body, door, button panel and transport.
///
/// The body moves in world space. Door, buttons and the insertion slot are
/// children of the body.
#[derive(Debug, Clone)]
pub(crate) struct CassettePlayer {
    stowed: bool,
    door_open: bool,
    tape_visible: bool,
    inserted: Option<TapeId>,
    body: AnimatedPart,
    door: AnimatedPart,
    panel: ButtonPanel,
    transport: TapeTransport,
    stowed_pose: Pose,
    deployed_pose: Pose,
    stow_rates: PoseRates,
    deploy_rates: PoseRates,
    door_closed_pose: Pose,
    door_open_pose: Pose,
    stowed_collider: Aabb,
    deployed_collider: Aabb,
    button_half_extents: Vec3,
    insertion_slot: Pose,
    insertion_half_extents: Vec3,
    ejected: Vec<TapeEjected>,
}

impl CassettePlayer {
    pub(crate) fn new(config: &PlayerConfig) -> Self {
        let stowed_pose = config.stowed_pose.to_pose();
        let stow_rates = PoseRates::split(config.stow_speed, config.rotation_speed);
        let door_closed_pose = config.door_closed_pose.to_pose();
        Self {
            stowed: true,
            door_open: false,
            tape_visible: false,
            inserted: None,
            body: AnimatedPart::at_rest(stowed_pose, stow_rates, config.snap_threshold),
            door: AnimatedPart::at_rest(
                door_closed_pose,
                PoseRates::uniform(config.door_speed),
                config.snap_threshold,
            ),
            panel: ButtonPanel::new(config),
            transport: TapeTransport::default(),
            stowed_pose,
            deployed_pose: config.deployed_pose.to_pose(),
            stow_rates,
            deploy_rates: PoseRates::split(config.deploy_speed, config.rotation_speed),
            door_closed_pose,
            door_open_pose: config.door_open_pose.to_pose(),
            stowed_collider: config.stowed_collider.to_aabb(),
            deployed_collider: config.deployed_collider.to_aabb(),
            button_half_extents: Vec3::from_array(config.button_half_extents),
            insertion_slot: config.insertion_slot.to_pose(),
            insertion_half_extents: Vec3::from_array(config.insertion_half_extents),
            ejected: Vec::new(),
        }
    }

    pub(crate) fn is_stowed(&self) -> bool {
        self.stowed
    }

    pub(crate) fn is_door_open(&self) -> bool {
        self.door_open
    }

    pub(crate) fn is_tape_visible(&self) -> bool {
        self.tape_visible
    }

    pub(crate) fn inserted_tape(&self) -> Option<TapeId> {
        self.inserted
    }

    pub(crate) fn panel(&self) -> &ButtonPanel {
        &self.panel
    }

    pub(crate) fn transport(&self) -> &TapeTransport {
        &self.transport
    }

    #[allow(dead_code)]
    pub(crate) fn body_pose(&self) -> Pose {
        self.body.pose()
    }

    pub(crate) fn is_body_settled(&self) -> bool {
        self.body.is_snapped()
    }

    pub(crate) fn is_door_settled(&self) -> bool {
        self.door.is_snapped()
    }

    pub(crate) fn button_pose(&self, button: DeckButton) -> Option<Pose> {
        let local = self.panel.local_pose(button)?;
        Some(self.body.pose().transform_pose(&local))
    }

    /// Collider bounds for the body, swapped as soon as the stow state flips.
    pub(crate) fn body_bounds(&self) -> Aabb {
        if self.stowed {
            self.stowed_collider
        } else {
            self.deployed_collider
        }
    }

    pub(crate) fn button_bounds(&self, button: DeckButton) -> Option<Aabb> {
        let pose = self.button_pose(button)?;
        Some(Aabb::from_center_half_extents(
            pose.position,
            self.button_half_extents * pose.scale,
        ))
    }

    /// World pose an inserted tape is locked to.
    pub(crate) fn insertion_pose(&self) -> Pose {
        self.body.pose().transform_pose(&self.insertion_slot)
    }

    /// Region a carried tape has to enter to be taken by the player.
    pub(crate) fn insertion_region(&self) -> Aabb {
        let body = self.body.pose();
        Aabb::from_center_half_extents(
            self.insertion_pose().position,
            self.insertion_half_extents * body.scale,
        )
    }

    /// Slides the player onto or off the desk. Deploying an empty player is refused.
    pub(crate) fn toggle_stow(&mut self, stow: bool, audio: &mut dyn AudioSink) -> bool {
        if stow == self.stowed {
            return false;
        }
        if !stow && self.inserted.is_none() {
            debug!("player_deploy_rejected_empty");
            return false;
        }

        self.stowed = stow;
        if stow {
            self.panel.release_all();
            self.body.set_rates(self.stow_rates);
            self.body.retarget(self.stowed_pose);
            audio.play_one_shot(Emitter::Player, Cue::PlayerStow);
        } else {
            self.body.set_rates(self.deploy_rates);
            self.body.retarget(self.deployed_pose);
            audio.play_one_shot(Emitter::Player, Cue::PlayerDeploy);
        }
        info!(stowed = stow, "player_stow_toggled");
        true
    }

    pub(crate) fn toggle_door(&mut self, open: bool, audio: &mut dyn AudioSink) -> bool {
        if open == self.door_open {
            return false;
        }

        self.door_open = open;
        if open {
            self.tape_visible = true;
            self.door.retarget(self.door_open_pose);
            audio.play_one_shot(Emitter::Player, Cue::DoorOpen);
        } else {
            self.door.retarget(self.door_closed_pose);
            audio.play_one_shot(Emitter::Player, Cue::DoorClose);
        }
        info!(open, "player_door_toggled");
        true
    }

    /// Buttons only respond while the player is deployed.
    pub(crate) fn push_button(&mut self, button: DeckButton, audio: &mut dyn AudioSink) -> bool {
        if self.stowed {
            debug!(button = button.name(), "button_push_ignored_stowed");
            return false;
        }
        if !self.panel.set_pushed(button, true) {
            return false;
        }
        audio.play_one_shot(Emitter::Player, Cue::ButtonTouch);
        debug!(button = button.name(), "button_pushed");
        true
    }

    pub(crate) fn release_button(&mut self, button: DeckButton, audio: &mut dyn AudioSink) -> bool {
        if !self.panel.set_pushed(button, false) {
            return false;
        }
        let recording_hold = button == DeckButton::Record && self.transport.is_recording();
        if !recording_hold {
            audio.play_one_shot(Emitter::Player, Cue::ButtonReturn);
        }
        debug!(button = button.name(), "button_released");
        true
    }

    /// Takes `tape` into the slot. Whatever was inserted before is ejected
    /// first and returned to the caller.
    pub(crate) fn insert_tape(
        &mut self,
        tape: TapeId,
        name: &str,
        clip_length_seconds: f32,
        progress: f32,
        audio: &mut dyn AudioSink,
    ) -> Option<TapeEjected> {
        if self.inserted == Some(tape) {
            return None;
        }
        let previous = self.eject_tape(audio);

        self.inserted = Some(tape);
        self.tape_visible = true;
        self.transport.load(tape, name, clip_length_seconds, progress);
        self.panel.set_locked(DeckButton::Eject, false);
        audio.play_one_shot(Emitter::Tape(tape), Cue::TapeInsert);
        info!(tape = tape.0, "tape_inserted");
        previous
    }

    pub(crate) fn eject_tape(&mut self, audio: &mut dyn AudioSink) -> Option<TapeEjected> {
        let tape = self.inserted.take()?;
        let progress = self
            .transport
            .unload()
            .map(|(_, progress)| progress)
            .unwrap_or(0.0);
        audio.play_one_shot(Emitter::Tape(tape), Cue::TapeEject);
        info!(tape = tape.0, progress, "tape_ejected");
        Some(TapeEjected { tape, progress })
    }

    /// Tapes the player ejected on its own since the last drain.
    pub(crate) fn drain_ejected(&mut self) -> Vec<TapeEjected> {
        std::mem::take(&mut self.ejected)
    }

    /// One tick of part motion, completion triggers, button triggers and transport.
    pub(crate) fn animate(&mut self, dt_seconds: f32, audio: &mut dyn AudioSink) {
        let locked_before = self.panel.locked_flags();

        if self.body.tick(dt_seconds) && self.stowed && self.door_open && self.inserted.is_some() {
            if let Some(ejected) = self.eject_tape(audio) {
                self.ejected.push(ejected);
            }
            self.toggle_door(false, audio);
        }

        if self.door.tick(dt_seconds) && !self.door_open {
            self.tape_visible = false;
            debug!("player_tape_hidden");
        }

        for button in self.panel.tick(dt_seconds) {
            self.trigger(button, audio);
        }

        self.transport.tick(dt_seconds, &mut self.panel);

        let locked_after = self.panel.locked_flags();
        for (before, after) in locked_before.iter().zip(locked_after) {
            if after && !before {
                audio.play_one_shot(Emitter::Player, Cue::ButtonLock);
            }
        }
    }

    fn trigger(&mut self, button: DeckButton, audio: &mut dyn AudioSink) {
        if self.inserted.is_none() {
            debug!(button = button.name(), "button_trigger_ignored_empty");
            return;
        }
        audio.play_one_shot(Emitter::Player, Cue::ButtonClick);
        info!(button = button.name(), "button_triggered");
        self.transport.press(button, &mut self.panel);
        if button == DeckButton::Eject {
            self.toggle_door(true, audio);
            self.toggle_stow(true, audio);
        }
    }

    pub(crate) fn readout(&self) -> TransportReadout {
        self.transport.readout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::desk::collab::recording::RecordingAudio;

    const DT: f32 = 1.0 / 60.0;

    fn player() -> CassettePlayer {
        CassettePlayer::new(&PlayerConfig::default())
    }

    fn run(player: &mut CassettePlayer, audio: &mut RecordingAudio, ticks: usize) {
        for _ in 0..ticks {
            player.animate(DT, audio);
        }
    }

    fn deployed_with_tape(audio: &mut RecordingAudio) -> CassettePlayer {
        let mut player = player();
        player.toggle_door(true, audio);
        player.insert_tape(TapeId(0), "Side A", 60.0, 0.0, audio);
        player.toggle_door(false, audio);
        player.toggle_stow(false, audio);
        run(&mut player, audio, 240);
        audio.clear();
        player
    }

    #[test]
    fn deploying_an_empty_player_is_rejected() {
        let mut player = player();
        let mut audio = RecordingAudio::default();
        assert!(!player.toggle_stow(false, &mut audio));
        assert!(player.is_stowed());
        assert!(audio.cues().is_empty());
    }

    #[test]
    fn toggle_stow_is_idempotent() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);

        assert!(player.toggle_stow(true, &mut audio));
        assert!(!player.toggle_stow(true, &mut audio));
        assert_eq!(audio.count(Cue::PlayerStow), 1);
    }

    #[test]
    fn body_snaps_onto_deployed_pose() {
        let mut audio = RecordingAudio::default();
        let player = deployed_with_tape(&mut audio);
        assert!(player.is_body_settled());
        assert_eq!(player.body_pose(), Pose::IDENTITY);
    }

    #[test]
    fn stowing_releases_every_button_and_swaps_bounds() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);
        assert_eq!(player.body_bounds(), PlayerConfig::default().deployed_collider.to_aabb());

        player.push_button(DeckButton::Rewind, &mut audio);
        player.push_button(DeckButton::Pause, &mut audio);
        player.toggle_stow(true, &mut audio);

        assert!(!player.panel().is_pushed(DeckButton::Rewind));
        assert!(!player.panel().is_pushed(DeckButton::Pause));
        assert_eq!(player.body_bounds(), PlayerConfig::default().stowed_collider.to_aabb());
    }

    #[test]
    fn buttons_ignore_pushes_while_stowed() {
        let mut player = player();
        let mut audio = RecordingAudio::default();
        assert!(!player.push_button(DeckButton::Play, &mut audio));
        assert!(!player.panel().is_pushed(DeckButton::Play));
    }

    #[test]
    fn redundant_push_and_release_are_noops() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);

        assert!(player.push_button(DeckButton::Play, &mut audio));
        assert!(!player.push_button(DeckButton::Play, &mut audio));
        assert!(player.release_button(DeckButton::Play, &mut audio));
        assert!(!player.release_button(DeckButton::Play, &mut audio));
        assert_eq!(audio.count(Cue::ButtonTouch), 1);
        assert_eq!(audio.count(Cue::ButtonReturn), 1);
    }

    #[test]
    fn held_button_fires_its_action_once() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);

        player.push_button(DeckButton::Play, &mut audio);
        run(&mut player, &mut audio, 120);

        assert_eq!(audio.count(Cue::ButtonClick), 1);
        assert_eq!(audio.count(Cue::ButtonLock), 1);
        assert!(player.transport().is_playing());
        assert!(player.panel().is_locked(DeckButton::Play));
    }

    #[test]
    fn releasing_record_while_recording_skips_return_cue() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);

        player.push_button(DeckButton::Record, &mut audio);
        run(&mut player, &mut audio, 30);
        assert!(player.transport().is_recording());
        player.release_button(DeckButton::Record, &mut audio);
        assert_eq!(audio.count(Cue::ButtonReturn), 0);
    }

    #[test]
    fn eject_opens_door_stows_and_ejects_on_arrival() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);

        player.push_button(DeckButton::Eject, &mut audio);
        run(&mut player, &mut audio, 10);
        assert!(player.is_stowed());
        assert!(player.is_door_open());
        assert!(player.panel().is_locked(DeckButton::Eject));
        assert_eq!(player.inserted_tape(), Some(TapeId(0)));

        run(&mut player, &mut audio, 300);
        assert_eq!(player.inserted_tape(), None);
        assert!(!player.is_door_open());
        assert_eq!(
            player.drain_ejected(),
            vec![TapeEjected {
                tape: TapeId(0),
                progress: 0.0
            }]
        );
        assert_eq!(audio.count(Cue::TapeEject), 1);
    }

    #[test]
    fn stowing_with_closed_door_keeps_the_tape() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);

        player.toggle_stow(true, &mut audio);
        run(&mut player, &mut audio, 300);
        assert_eq!(player.inserted_tape(), Some(TapeId(0)));
        assert!(player.drain_ejected().is_empty());
    }

    #[test]
    fn door_hides_tape_only_once_closed() {
        let mut player = player();
        let mut audio = RecordingAudio::default();
        player.toggle_door(true, &mut audio);
        player.insert_tape(TapeId(1), "Side B", 60.0, 0.0, &mut audio);
        run(&mut player, &mut audio, 120);

        player.toggle_door(false, &mut audio);
        player.animate(DT, &mut audio);
        assert!(player.is_tape_visible());

        run(&mut player, &mut audio, 120);
        assert!(player.is_door_settled());
        assert!(!player.is_tape_visible());

        player.toggle_door(true, &mut audio);
        assert!(player.is_tape_visible());
    }

    #[test]
    fn inserting_over_an_occupied_slot_ejects_first() {
        let mut player = player();
        let mut audio = RecordingAudio::default();
        player.toggle_door(true, &mut audio);
        player.insert_tape(TapeId(0), "A", 60.0, 0.3, &mut audio);

        let ejected = player.insert_tape(TapeId(1), "B", 60.0, 0.0, &mut audio);
        assert_eq!(
            ejected,
            Some(TapeEjected {
                tape: TapeId(0),
                progress: 0.3
            })
        );
        assert_eq!(player.inserted_tape(), Some(TapeId(1)));
        let insert_index = audio
            .cues()
            .iter()
            .rposition(|(_, cue)| *cue == Cue::TapeInsert);
        let eject_index = audio
            .cues()
            .iter()
            .position(|(_, cue)| *cue == Cue::TapeEject);
        assert!(eject_index < insert_index);
    }

    #[test]
    fn new_insertion_unlocks_eject() {
        let mut audio = RecordingAudio::default();
        let mut player = deployed_with_tape(&mut audio);
        player.push_button(DeckButton::Eject, &mut audio);
        run(&mut player, &mut audio, 300);
        assert!(player.panel().is_locked(DeckButton::Eject));

        player.toggle_door(true, &mut audio);
        player.insert_tape(TapeId(2), "C", 60.0, 0.0, &mut audio);
        assert!(!player.panel().is_locked(DeckButton::Eject));
    }

    #[test]
    fn insertion_region_follows_the_body() {
        let mut audio = RecordingAudio::default();
        let player = deployed_with_tape(&mut audio);
        let region = player.insertion_region();
        assert!(region.contains(Vec3::new(0.0, -0.2, -1.0)));
        assert!(!region.contains(Vec3::new(6.5, -4.0, -1.0)));
    }
}
