use deck_engine::{Camera, CollisionWorld, RayHit, TouchHandler, TouchSession};
use glam::Vec2;
use tracing::debug;

use super::buttons::DeckButton;
use super::collab::AudioSink;
use super::player::CassettePlayer;
use super::tape::{HoldContext, Holdable, TapeId, TapeRack};
use super::whiteboard::Whiteboard;

/// Category a collider dispatches to when struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColliderTag {
    PlayerBody,
    Drawable,
    Button(DeckButton),
    Tape(TapeId),
}

/// Turns touch lifecycle events into calls on the desk's objects.
pub(crate) struct InteractionRouter<'a> {
    pub(crate) camera: &'a Camera,
    pub(crate) world: &'a CollisionWorld<ColliderTag>,
    pub(crate) max_ray_distance: f32,
    pub(crate) player: &'a mut CassettePlayer,
    pub(crate) tapes: &'a mut TapeRack,
    pub(crate) whiteboard: &'a mut Whiteboard,
    pub(crate) audio: &'a mut dyn AudioSink,
}

impl InteractionRouter<'_> {
    fn hit_test(&self, screen_px: Vec2) -> Option<RayHit<ColliderTag>> {
        let ray = self.camera.ray_through(screen_px);
        self.world.raycast(&ray, self.max_ray_distance)
    }

    fn press(&mut self, session: &mut TouchSession, button: DeckButton) {
        self.player.push_button(button, &mut *self.audio);
        session.pressed_button = Some(button.index());
    }

    fn release_pressed(&mut self, session: &mut TouchSession) {
        if let Some(button) = session
            .pressed_button
            .take()
            .and_then(DeckButton::from_index)
        {
            self.player.release_button(button, &mut *self.audio);
        }
    }
}

impl TouchHandler for InteractionRouter<'_> {
    fn touch_started(&mut self, session: &mut TouchSession) {
        let Some(hit) = self.hit_test(session.position()) else {
            return;
        };
        debug!(touch = session.id().0, tag = ?hit.tag, distance = hit.distance, "touch_hit");

        match hit.tag {
            ColliderTag::PlayerBody => {
                let stow = !self.player.is_stowed();
                self.player.toggle_stow(stow, &mut *self.audio);
                session.consume();
            }
            ColliderTag::Drawable => {
                let deploy = !self.whiteboard.is_deployed();
                self.whiteboard.toggle(deploy);
                session.consume();
            }
            ColliderTag::Button(button) => {
                if !self.player.is_stowed() {
                    self.press(session, button);
                }
            }
            ColliderTag::Tape(id) => {
                let mut context = HoldContext {
                    other_holders: self.tapes.holders_except(session.id()),
                    player: &mut *self.player,
                    audio: &mut *self.audio,
                };
                if let Some(tape) = self.tapes.get_mut(id) {
                    tape.try_hold(session, &mut context);
                }
            }
        }
    }

    fn touch_moved(&mut self, session: &mut TouchSession) {
        if self.player.is_stowed() {
            return;
        }

        let under = match self.hit_test(session.position()) {
            Some(RayHit {
                tag: ColliderTag::Button(button),
                ..
            }) => Some(button),
            _ => None,
        };
        let previous = session.pressed_button.and_then(DeckButton::from_index);
        if previous == under {
            return;
        }
        self.release_pressed(session);
        if let Some(button) = under {
            self.press(session, button);
        }
    }

    fn touch_ended(&mut self, session: &mut TouchSession) {
        if let Some(collider) = session.held_object {
            if let Some(id) = self.tapes.by_collider(collider) {
                let other_holders = self.tapes.holders_except(session.id());
                let mut context = HoldContext {
                    other_holders,
                    player: &mut *self.player,
                    audio: &mut *self.audio,
                };
                if let Some(tape) = self.tapes.get_mut(id) {
                    tape.release(session, &mut context);
                }
            }
        }
        self.release_pressed(session);
    }
}
