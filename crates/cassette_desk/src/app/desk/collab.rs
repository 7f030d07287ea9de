use tracing::debug;

use super::tape::TapeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emitter {
    Player,
    Tape(TapeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cue {
    ButtonTouch,
    ButtonClick,
    ButtonReturn,
    ButtonLock,
    DoorOpen,
    DoorClose,
    TapeInsert,
    TapeEject,
    PlayerStow,
    PlayerDeploy,
}

/// Fire-and-forget one-shot playback.
pub(crate) trait AudioSink {
    fn play_one_shot(&mut self, emitter: Emitter, cue: Cue);
}

/// Numeric fields the transport display shows. Pushed every tick, never read back.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransportReadout {
    pub(crate) progress: f32,
    pub(crate) record_start: f32,
    pub(crate) record_width: f32,
    pub(crate) display_name: String,
    pub(crate) timestamp: String,
}

impl Default for TransportReadout {
    fn default() -> Self {
        Self {
            progress: 0.0,
            record_start: -1.0,
            record_width: 0.0,
            display_name: String::new(),
            timestamp: format_timestamp(0.0, 0.0),
        }
    }
}

pub(crate) trait TransportUi {
    fn publish(&mut self, readout: &TransportReadout);
}

/// `M:SS/M:SS` with both values floored to whole seconds.
pub(crate) fn format_timestamp(elapsed_seconds: f32, total_seconds: f32) -> String {
    fn clock(seconds: f32) -> String {
        let whole = seconds.max(0.0).floor() as u64;
        format!("{}:{:02}", whole / 60, whole % 60)
    }
    format!("{}/{}", clock(elapsed_seconds), clock(total_seconds))
}

/// Audio collaborator for headless runs: every cue becomes a debug event.
#[derive(Debug, Default)]
pub(crate) struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play_one_shot(&mut self, emitter: Emitter, cue: Cue) {
        debug!(?emitter, ?cue, "audio_one_shot");
    }
}

/// UI collaborator for headless runs: logs the readout whenever it changes.
#[derive(Debug, Default)]
pub(crate) struct TracingUi {
    last: Option<TransportReadout>,
}

impl TracingUi {
    #[allow(dead_code)]
    pub(crate) fn last(&self) -> Option<&TransportReadout> {
        self.last.as_ref()
    }
}

impl TransportUi for TracingUi {
    fn publish(&mut self, readout: &TransportReadout) {
        if self.last.as_ref() == Some(readout) {
            return;
        }
        debug!(
            progress = readout.progress,
            record_start = readout.record_start,
            record_width = readout.record_width,
            name = %readout.display_name,
            timestamp = %readout.timestamp,
            "transport_readout"
        );
        self.last = Some(readout.clone());
    }
}
