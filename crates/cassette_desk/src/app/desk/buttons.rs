use deck_engine::{AnimatedPart, Pose, PoseRates};
use glam::Vec3;

use crate::app::config::{PlayerConfig, BUTTON_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum DeckButton {
    Record,
    Rewind,
    Play,
    Pause,
    FastForward,
    Eject,
}

impl DeckButton {
    pub(crate) const ALL: [DeckButton; BUTTON_COUNT] = [
        DeckButton::Record,
        DeckButton::Rewind,
        DeckButton::Play,
        DeckButton::Pause,
        DeckButton::FastForward,
        DeckButton::Eject,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            DeckButton::Record => "record",
            DeckButton::Rewind => "rewind",
            DeckButton::Play => "play",
            DeckButton::Pause => "pause",
            DeckButton::FastForward => "ff",
            DeckButton::Eject => "eject",
        }
    }

    /// Accepts a button name (case-insensitive) or its panel index.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        if let Ok(index) = raw.parse::<usize>() {
            return Self::from_index(index);
        }
        match raw.to_ascii_lowercase().as_str() {
            "record" | "rec" => Some(DeckButton::Record),
            "rewind" | "rew" => Some(DeckButton::Rewind),
            "play" => Some(DeckButton::Play),
            "pause" => Some(DeckButton::Pause),
            "ff" | "fastforward" | "fast_forward" => Some(DeckButton::FastForward),
            "eject" | "stop" => Some(DeckButton::Eject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ButtonState {
    part: AnimatedPart,
    rest: Pose,
    pushed: bool,
    locked: bool,
}

impl ButtonState {
    pub(crate) fn is_pushed(&self) -> bool {
        self.pushed
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked
    }

    /// Local pose relative to the player body.
    pub(crate) fn pose(&self) -> Pose {
        self.part.pose()
    }
}

/// The six transport keys. Poses live in the player body's local frame.
#[derive(Debug, Clone)]
pub(crate) struct ButtonPanel {
    buttons: Vec<ButtonState>,
    push_offset: Vec3,
    locked_depth_fraction: f32,
    trigger_threshold: f32,
}

impl ButtonPanel {
    pub(crate) fn new(config: &PlayerConfig) -> Self {
        let rates = PoseRates::uniform(config.button_speed);
        let buttons = config
            .button_rest_positions
            .iter()
            .map(|position| {
                let rest = Pose::from_position(Vec3::from_array(*position));
                ButtonState {
                    part: AnimatedPart::at_rest(rest, rates, config.snap_threshold),
                    rest,
                    pushed: false,
                    locked: false,
                }
            })
            .collect();
        Self {
            buttons,
            push_offset: Vec3::from_array(config.button_push_offset),
            locked_depth_fraction: config.locked_depth_fraction,
            trigger_threshold: config.trigger_threshold,
        }
    }

    pub(crate) fn state(&self, button: DeckButton) -> Option<&ButtonState> {
        self.buttons.get(button.index())
    }

    pub(crate) fn is_pushed(&self, button: DeckButton) -> bool {
        self.state(button).is_some_and(ButtonState::is_pushed)
    }

    pub(crate) fn is_locked(&self, button: DeckButton) -> bool {
        self.state(button).is_some_and(ButtonState::is_locked)
    }

    pub(crate) fn is_settled(&self, button: DeckButton) -> bool {
        self.state(button)
            .is_some_and(|state| state.part.is_snapped())
    }

    pub(crate) fn local_pose(&self, button: DeckButton) -> Option<Pose> {
        self.state(button).map(ButtonState::pose)
    }

    /// Travel between rest (0) and fully pressed (1), measured along the push axis.
    pub(crate) fn push_fraction(&self, button: DeckButton) -> f32 {
        self.state(button)
            .map(|state| self.fraction_of(state))
            .unwrap_or(0.0)
    }

    fn fraction_of(&self, state: &ButtonState) -> f32 {
        let travel = state.part.pose().position - state.rest.position;
        (travel.dot(self.push_offset) / self.push_offset.length_squared()).clamp(0.0, 1.0)
    }

    fn target_for(&self, state: &ButtonState) -> Pose {
        let depth = if state.pushed {
            1.0
        } else if state.locked {
            self.locked_depth_fraction
        } else {
            0.0
        };
        Pose::from_position(state.rest.position + self.push_offset * depth)
    }

    fn retarget(&mut self, button: DeckButton) {
        let Some(state) = self.buttons.get(button.index()) else {
            return;
        };
        let target = self.target_for(state);
        if let Some(state) = self.buttons.get_mut(button.index()) {
            state.part.retarget(target);
        }
    }

    /// Returns `false` when the button was already in the requested state.
    pub(crate) fn set_pushed(&mut self, button: DeckButton, pushed: bool) -> bool {
        match self.buttons.get_mut(button.index()) {
            Some(state) if state.pushed != pushed => state.pushed = pushed,
            _ => return false,
        }
        self.retarget(button);
        true
    }

    pub(crate) fn set_locked(&mut self, button: DeckButton, locked: bool) -> bool {
        match self.buttons.get_mut(button.index()) {
            Some(state) if state.locked != locked => state.locked = locked,
            _ => return false,
        }
        self.retarget(button);
        true
    }

    pub(crate) fn release_all(&mut self) {
        for button in DeckButton::ALL {
            self.set_pushed(button, false);
        }
    }

    pub(crate) fn locked_flags(&self) -> [bool; BUTTON_COUNT] {
        let mut flags = [false; BUTTON_COUNT];
        for button in DeckButton::ALL {
            flags[button.index()] = self.is_locked(button);
        }
        flags
    }

    /// Moves every button one step and returns those whose push-fraction
    /// crossed the trigger threshold upward during this step.
    pub(crate) fn tick(&mut self, dt_seconds: f32) -> Vec<DeckButton> {
        let mut triggered = Vec::new();
        for button in DeckButton::ALL {
            let Some(state) = self.buttons.get(button.index()) else {
                continue;
            };
            let before = self.fraction_of(state);
            if let Some(state) = self.buttons.get_mut(button.index()) {
                state.part.tick(dt_seconds);
            }
            let after = self.push_fraction(button);
            if before < self.trigger_threshold && after >= self.trigger_threshold {
                triggered.push(button);
            }
        }
        triggered
    }
}
