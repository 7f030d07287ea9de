use tracing::{debug, info};

use super::buttons::{ButtonPanel, DeckButton};
use super::collab::{format_timestamp, TransportReadout};
use super::tape::TapeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportPhase {
    Stopped,
    Playing,
    Paused,
    Recording,
    EndReached,
}

#[derive(Debug, Clone, PartialEq)]
struct LoadedTape {
    id: TapeId,
    name: String,
    clip_length_seconds: f32,
}

/// Playback state of the inserted tape.
///
/// The rate is signed: negative plays in reverse. Repeated rewind or
/// fast-forward presses double its magnitude.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TapeTransport {
    loaded: Option<LoadedTape>,
    playing: bool,
    paused: bool,
    recording: bool,
    ended: bool,
    rate: f32,
    progress: f32,
    record_start: f32,
    record_length: f32,
}

impl Default for TapeTransport {
    fn default() -> Self {
        Self {
            loaded: None,
            playing: false,
            paused: false,
            recording: false,
            ended: false,
            rate: 1.0,
            progress: 0.0,
            record_start: -1.0,
            record_length: 0.0,
        }
    }
}

impl TapeTransport {
    #[allow(dead_code)]
    pub(crate) fn is_playing(&self) -> bool {
        self.playing
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording
    }

    pub(crate) fn rate(&self) -> f32 {
        self.rate
    }

    pub(crate) fn progress(&self) -> f32 {
        self.progress
    }

    #[allow(dead_code)]
    pub(crate) fn record_start(&self) -> f32 {
        self.record_start
    }

    #[allow(dead_code)]
    pub(crate) fn record_length(&self) -> f32 {
        self.record_length
    }

    pub(crate) fn phase(&self) -> TransportPhase {
        if self.playing {
            if self.recording {
                TransportPhase::Recording
            } else {
                TransportPhase::Playing
            }
        } else if self.paused {
            TransportPhase::Paused
        } else if self.ended {
            TransportPhase::EndReached
        } else {
            TransportPhase::Stopped
        }
    }

    /// Resets all transport state and starts tracking `id` at `progress`.
    pub(crate) fn load(&mut self, id: TapeId, name: &str, clip_length_seconds: f32, progress: f32) {
        *self = Self {
            loaded: Some(LoadedTape {
                id,
                name: name.to_string(),
                clip_length_seconds,
            }),
            progress: progress.clamp(0.0, 1.0),
            ..Self::default()
        };
        info!(tape = id.0, name, progress = self.progress, "transport_loaded");
    }

    /// Resets all transport state and returns the unloaded tape's final position.
    pub(crate) fn unload(&mut self) -> Option<(TapeId, f32)> {
        let loaded = self.loaded.take()?;
        let progress = self.progress;
        *self = Self::default();
        info!(tape = loaded.id.0, progress, "transport_unloaded");
        Some((loaded.id, progress))
    }

    /// Runs the action bound to `button`.
    pub(crate) fn press(&mut self, button: DeckButton, panel: &mut ButtonPanel) {
        match button {
            DeckButton::Record => self.record(panel),
            DeckButton::Rewind => self.rewind(panel),
            DeckButton::Play => self.play(panel),
            DeckButton::Pause => self.pause(panel),
            DeckButton::FastForward => self.fast_forward(),
            DeckButton::Eject => self.eject(panel),
        }
    }

    pub(crate) fn record(&mut self, panel: &mut ButtonPanel) {
        if self.recording {
            self.recording = false;
            panel.set_locked(DeckButton::Record, false);
            info!(
                record_start = self.record_start,
                record_length = self.record_length,
                "recording_stopped"
            );
            return;
        }
        if self.at_end() {
            debug!("record_ignored_at_end");
            return;
        }
        if !self.playing {
            self.start_forward();
        }
        self.recording = true;
        self.record_start = self.progress;
        self.record_length = 0.0;
        panel.set_locked(DeckButton::Record, true);
        info!(record_start = self.record_start, "recording_started");
    }

    pub(crate) fn rewind(&mut self, panel: &mut ButtonPanel) {
        if self.at_end() {
            self.progress = 0.0;
            self.ended = false;
            self.stop(panel);
            info!("transport_rewound_from_end");
            return;
        }
        if !self.playing {
            return;
        }
        self.rate = if self.rate < 0.0 { self.rate * 2.0 } else { -1.0 };
        debug!(rate = self.rate, "transport_rate_changed");
    }

    pub(crate) fn play(&mut self, panel: &mut ButtonPanel) {
        if self.at_end() {
            debug!("play_ignored_at_end");
            return;
        }
        if !self.playing {
            self.start_forward();
            info!(progress = self.progress, "transport_playing");
        }
        panel.set_locked(DeckButton::Play, true);
    }

    pub(crate) fn pause(&mut self, panel: &mut ButtonPanel) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.paused = true;
        panel.set_locked(DeckButton::Play, false);
        info!(progress = self.progress, rate = self.rate, "transport_paused");
    }

    pub(crate) fn fast_forward(&mut self) {
        if !self.playing {
            return;
        }
        self.rate = if self.rate < 0.0 { 2.0 } else { self.rate * 2.0 };
        debug!(rate = self.rate, "transport_rate_changed");
    }

    /// Halts the transport. Opening the door and stowing are the player's half of ejecting.
    pub(crate) fn eject(&mut self, panel: &mut ButtonPanel) {
        self.playing = false;
        self.paused = false;
        self.recording = false;
        panel.set_locked(DeckButton::Eject, true);
        panel.set_locked(DeckButton::Play, false);
        panel.set_locked(DeckButton::Record, false);
        info!(progress = self.progress, "transport_ejected");
    }

    pub(crate) fn tick(&mut self, dt_seconds: f32, panel: &mut ButtonPanel) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        if !self.playing {
            return;
        }

        self.progress += self.rate * dt_seconds / loaded.clip_length_seconds;
        let hit_end = self.rate > 0.0 && self.progress >= 1.0;
        let hit_start = self.rate < 0.0 && self.progress <= 0.0;
        if hit_end || hit_start {
            self.progress = self.progress.clamp(0.0, 1.0);
        }
        if self.recording {
            self.record_length = (self.progress - self.record_start).abs();
        }
        if hit_end || hit_start {
            self.stop(panel);
            self.ended = hit_end;
            info!(progress = self.progress, "transport_end_reached");
        }
    }

    pub(crate) fn readout(&self) -> TransportReadout {
        let Some(loaded) = &self.loaded else {
            return TransportReadout::default();
        };
        TransportReadout {
            progress: self.progress,
            record_start: self.record_start,
            record_width: self.record_length,
            display_name: loaded.name.clone(),
            timestamp: format_timestamp(
                self.progress * loaded.clip_length_seconds,
                loaded.clip_length_seconds,
            ),
        }
    }

    fn at_end(&self) -> bool {
        self.progress >= 1.0
    }

    fn start_forward(&mut self) {
        self.rate = 1.0;
        self.playing = true;
        self.paused = false;
        self.ended = false;
    }

    fn stop(&mut self, panel: &mut ButtonPanel) {
        self.playing = false;
        self.paused = false;
        self.recording = false;
        self.rate = 1.0;
        panel.set_locked(DeckButton::Play, false);
        panel.set_locked(DeckButton::Record, false);
    }
}
