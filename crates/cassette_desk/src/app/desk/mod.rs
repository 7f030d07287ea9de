mod buttons;
mod collab;
mod commands;
mod player;
mod router;
mod tape;
mod transport;
mod whiteboard;

use deck_engine::{
    Aabb, Camera, CollisionWorld, ContactSample, ObjectId, Simulation, TouchTickCounts,
    TouchTracker,
};
use glam::Vec3;
use tracing::{debug, info, warn};

use crate::app::config::{DeskConfig, HoldConfig, BUTTON_COUNT};

pub(crate) use buttons::DeckButton;
use collab::{AudioSink, TransportReadout, TransportUi};
use player::CassettePlayer;
use router::{ColliderTag, InteractionRouter};
use tape::{CassetteTape, TapeId, TapeRack, TapeState};
use whiteboard::Whiteboard;

pub(crate) use collab::{TracingAudio, TracingUi};
pub(crate) use commands::{desk_command_registry, DeskCommand};

#[derive(Debug, Clone, Copy)]
struct SceneColliders {
    body: ObjectId,
    whiteboard: ObjectId,
    buttons: [ObjectId; BUTTON_COUNT],
}

/// The whole desk, advanced once per fixed tick.
///
/// Tick order: touch tracking and routing, carried tapes, player parts with
/// button triggers and transport, inserted tapes, colliders, readout.
pub(crate) struct DeskScene {
    camera: Camera,
    hold: HoldConfig,
    tracker: TouchTracker,
    world: CollisionWorld<ColliderTag>,
    colliders: SceneColliders,
    player: CassettePlayer,
    tapes: TapeRack,
    whiteboard: Whiteboard,
    pending_taps: Vec<DeckButton>,
    audio: Box<dyn AudioSink>,
    ui: Box<dyn TransportUi>,
    ticks: u64,
}

impl DeskScene {
    pub(crate) fn new(
        config: &DeskConfig,
        audio: Box<dyn AudioSink>,
        ui: Box<dyn TransportUi>,
    ) -> Self {
        let player = CassettePlayer::new(&config.player);
        let whiteboard = Whiteboard::new(&config.whiteboard);
        let mut world = CollisionWorld::new();

        // Insertion order breaks distance ties: later colliders win, so
        // buttons beat the body they sit on and tapes beat everything.
        let body = world.insert(ColliderTag::PlayerBody, player.body_bounds());
        let buttons = DeckButton::ALL.map(|button| {
            let bounds = player
                .button_bounds(button)
                .unwrap_or_else(|| player.body_bounds());
            world.insert(ColliderTag::Button(button), bounds)
        });
        let whiteboard_collider = world.insert(ColliderTag::Drawable, whiteboard.bounds());

        let mut tapes = TapeRack::default();
        for (index, tape_config) in config.tapes.iter().enumerate() {
            let id = TapeId(index);
            let origin = tape_config.origin.to_pose();
            let collider = world.insert(
                ColliderTag::Tape(id),
                Aabb::from_center_half_extents(origin.position, Vec3::ZERO),
            );
            tapes.push(CassetteTape::new(id, collider, tape_config, &config.hold));
        }

        let mut scene = Self {
            camera: config.camera.to_camera(),
            hold: config.hold.clone(),
            tracker: TouchTracker::new(),
            world,
            colliders: SceneColliders {
                body,
                whiteboard: whiteboard_collider,
                buttons,
            },
            player,
            tapes,
            whiteboard,
            pending_taps: Vec::new(),
            audio,
            ui,
            ticks: 0,
        };
        scene.sync_colliders();
        info!(
            tapes = scene.tapes.len(),
            colliders = scene.world.len(),
            "desk_scene_loaded"
        );
        scene
    }

    pub(crate) fn camera(&self) -> &Camera {
        &self.camera
    }

    pub(crate) fn player(&self) -> &CassettePlayer {
        &self.player
    }

    pub(crate) fn tapes(&self) -> &TapeRack {
        &self.tapes
    }

    pub(crate) fn whiteboard(&self) -> &Whiteboard {
        &self.whiteboard
    }

    pub(crate) fn tracker(&self) -> &TouchTracker {
        &self.tracker
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn readout(&self) -> TransportReadout {
        self.player.readout()
    }

    /// Applies a debug/test command directly, outside the touch path.
    /// `Help` and `Status` are answered by the caller.
    pub(crate) fn execute(&mut self, command: DeskCommand) -> bool {
        let audio = self.audio.as_mut();
        let changed = match command {
            DeskCommand::Deploy => self.player.toggle_stow(false, audio),
            DeskCommand::Stow => self.player.toggle_stow(true, audio),
            DeskCommand::Door { open } => self.player.toggle_door(open, audio),
            DeskCommand::Press(button) => self.player.push_button(button, audio),
            DeskCommand::Release(button) => self.player.release_button(button, audio),
            DeskCommand::Tap(button) => {
                let pushed = self.player.push_button(button, audio);
                if pushed {
                    self.pending_taps.push(button);
                }
                pushed
            }
            DeskCommand::Help | DeskCommand::Status => false,
        };
        debug!(?command, changed, "desk_command_applied");
        changed
    }

    pub(crate) fn status_line(&self) -> String {
        let transport = self.player.transport();
        let inserted = self
            .player
            .inserted_tape()
            .and_then(|id| self.tapes.get(id))
            .map(|tape| tape.name().to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "stowed={} door_open={} settled={} tape={} phase={:?} rate={} progress={:.3} timestamp={}",
            self.player.is_stowed(),
            self.player.is_door_open(),
            self.player.is_body_settled() && self.player.is_door_settled(),
            inserted,
            transport.phase(),
            transport.rate(),
            transport.progress(),
            self.readout().timestamp,
        )
    }

    fn route_touches(&mut self, dt_seconds: f32, contacts: &[ContactSample]) -> TouchTickCounts {
        let mut router = InteractionRouter {
            camera: &self.camera,
            world: &self.world,
            max_ray_distance: self.hold.max_ray_distance,
            player: &mut self.player,
            tapes: &mut self.tapes,
            whiteboard: &mut self.whiteboard,
            audio: self.audio.as_mut(),
        };
        self.tracker.update(contacts, dt_seconds, &mut router)
    }

    fn release_finished_taps(&mut self) {
        let panel = self.player.panel();
        let (done, waiting): (Vec<DeckButton>, Vec<DeckButton>) = self
            .pending_taps
            .iter()
            .partition(|button| panel.is_settled(**button));
        self.pending_taps = waiting;
        for button in done {
            self.player.release_button(button, self.audio.as_mut());
        }
    }

    /// Carried tapes chase their touch, and enter or leave the slot.
    fn update_carried_tapes(&mut self, dt_seconds: f32) {
        for id in self.tapes.ids() {
            let Some(holder) = self.tapes.get(id).and_then(|tape| tape.held_by()) else {
                if let Some(tape) = self.tapes.get_mut(id) {
                    if tape.state() != TapeState::Inserted {
                        tape.animate(dt_seconds);
                    }
                }
                continue;
            };
            let Some(screen) = self.tracker.session(holder).map(|session| session.position()) else {
                warn!(tape = id.0, touch = holder.0, "tape_holder_missing");
                continue;
            };

            let point = self.camera.screen_to_world(screen, self.hold.hold_depth);
            let over_slot =
                self.player.is_door_open() && self.player.insertion_region().contains(point);
            let Some(tape) = self.tapes.get_mut(id) else {
                continue;
            };
            let arrived = tape.track_slot_overlap(over_slot);
            let inserted = tape.state() == TapeState::Inserted;

            // Insert only on the tick the tape reaches the slot.
            if arrived && !inserted {
                let name = tape.name().to_string();
                let clip_length_seconds = tape.clip_length_seconds();
                let progress = tape.progress();
                let previous = self.player.insert_tape(
                    id,
                    &name,
                    clip_length_seconds,
                    progress,
                    self.audio.as_mut(),
                );
                if let Some(previous) = previous {
                    if let Some(tape) = self.tapes.get_mut(previous.tape) {
                        tape.on_ejected(previous.progress);
                    }
                }
                if let Some(tape) = self.tapes.get_mut(id) {
                    tape.mark_inserted();
                }
            } else if !over_slot && inserted {
                if let Some(ejected) = self.player.eject_tape(self.audio.as_mut()) {
                    if let Some(tape) = self.tapes.get_mut(ejected.tape) {
                        tape.mark_held(ejected.progress);
                    }
                }
            }

            let slot = self.player.insertion_pose();
            if let Some(tape) = self.tapes.get_mut(id) {
                let target = if tape.state() == TapeState::Inserted {
                    slot
                } else {
                    tape.carried_pose(point)
                };
                tape.follow(target);
                tape.animate(dt_seconds);
            }
        }
    }

    fn settle_player_ejections(&mut self) {
        for ejected in self.player.drain_ejected() {
            if let Some(tape) = self.tapes.get_mut(ejected.tape) {
                tape.on_ejected(ejected.progress);
            }
        }
    }

    /// Inserted tapes nobody is carrying ride rigidly in the slot.
    fn pin_inserted_tapes(&mut self) {
        let slot = self.player.insertion_pose();
        let Some(id) = self.player.inserted_tape() else {
            return;
        };
        if let Some(tape) = self.tapes.get_mut(id) {
            if tape.state() == TapeState::Inserted && tape.held_by().is_none() {
                tape.pin_to(slot);
            }
        }
    }

    fn tape_visible(&self, tape: &CassetteTape) -> bool {
        tape.state() != TapeState::Inserted || self.player.is_tape_visible()
    }

    fn sync_colliders(&mut self) {
        self.world
            .set_bounds(self.colliders.body, self.player.body_bounds());
        let buttons_live = !self.player.is_stowed();
        for button in DeckButton::ALL {
            let collider = self.colliders.buttons[button.index()];
            if let Some(bounds) = self.player.button_bounds(button) {
                self.world.set_bounds(collider, bounds);
            }
            self.world.set_enabled(collider, buttons_live);
        }
        self.world
            .set_bounds(self.colliders.whiteboard, self.whiteboard.bounds());

        let updates: Vec<_> = self
            .tapes
            .iter()
            .map(|tape| (tape.collider(), tape.bounds(), self.tape_visible(tape)))
            .collect();
        for (collider, bounds, visible) in updates {
            self.world.set_bounds(collider, bounds);
            self.world.set_enabled(collider, visible);
        }
    }
}

impl Simulation for DeskScene {
    fn tick(&mut self, fixed_dt_seconds: f32, contacts: &[ContactSample]) {
        self.release_finished_taps();
        let counts = self.route_touches(fixed_dt_seconds, contacts);
        if counts != TouchTickCounts::default() {
            debug!(
                started = counts.started,
                moved = counts.moved,
                ended = counts.ended,
                live = self.tracker.len(),
                "touches_routed"
            );
        }

        self.update_carried_tapes(fixed_dt_seconds);
        self.player.animate(fixed_dt_seconds, self.audio.as_mut());
        self.whiteboard.animate(fixed_dt_seconds);
        self.settle_player_ejections();
        self.pin_inserted_tapes();
        self.sync_colliders();

        let readout = self.player.readout();
        self.ui.publish(&readout);
        self.ticks = self.ticks.saturating_add(1);
    }
}
