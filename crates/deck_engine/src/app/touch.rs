use glam::Vec2;

use super::scene::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub u64);

/// One raw contact reported by the platform for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSample {
    pub id: TouchId,
    pub position: Vec2,
}

/// Identity-preserving record for a contact, alive from its first sample until
/// the tick its contact disappears.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchSession {
    id: TouchId,
    position: Vec2,
    delta: Vec2,
    origin: Vec2,
    duration_seconds: f32,
    pub held_object: Option<ObjectId>,
    pub pressed_button: Option<usize>,
    pending_removal: bool,
    consumed: bool,
}

impl TouchSession {
    pub fn new(id: TouchId, position: Vec2) -> Self {
        Self {
            id,
            position,
            delta: Vec2::ZERO,
            origin: position,
            duration_seconds: 0.0,
            held_object: None,
            pressed_button: None,
            pending_removal: false,
            consumed: false,
        }
    }

    pub fn id(&self) -> TouchId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_seconds
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Stops further move dispatch for this session. The end event still fires.
    pub fn consume(&mut self) {
        self.consumed = true;
    }
}

pub trait TouchHandler {
    fn touch_started(&mut self, session: &mut TouchSession);
    fn touch_moved(&mut self, session: &mut TouchSession);
    fn touch_ended(&mut self, session: &mut TouchSession);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchTickCounts {
    pub started: u32,
    pub moved: u32,
    pub ended: u32,
}

#[derive(Debug, Default)]
pub struct TouchTracker {
    sessions: Vec<TouchSession>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs this tick's raw contacts against the tracked sessions.
    ///
    /// Start fires for every new id before any move/end is evaluated, and a
    /// session is purged only after its end event has been dispatched.
    pub fn update<H>(
        &mut self,
        contacts: &[ContactSample],
        dt_seconds: f32,
        handler: &mut H,
    ) -> TouchTickCounts
    where
        H: TouchHandler + ?Sized,
    {
        let mut counts = TouchTickCounts::default();

        for contact in contacts {
            if self.sessions.iter().any(|session| session.id == contact.id) {
                continue;
            }
            let mut session = TouchSession::new(contact.id, contact.position);
            handler.touch_started(&mut session);
            self.sessions.push(session);
            counts.started += 1;
        }

        for session in &mut self.sessions {
            if session.pending_removal {
                continue;
            }
            match contacts.iter().find(|contact| contact.id == session.id) {
                Some(contact) => {
                    if contact.position != session.position {
                        session.delta = contact.position - session.position;
                        session.position = contact.position;
                        if !session.consumed {
                            handler.touch_moved(session);
                            counts.moved += 1;
                        }
                    }
                    session.duration_seconds += dt_seconds;
                }
                None => {
                    handler.touch_ended(session);
                    session.pending_removal = true;
                    counts.ended += 1;
                }
            }
        }

        self.sessions.retain(|session| !session.pending_removal);
        counts
    }

    pub fn sessions(&self) -> &[TouchSession] {
        &self.sessions
    }

    pub fn session(&self, id: TouchId) -> Option<&TouchSession> {
        self.sessions.iter().find(|session| session.id == id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Started,
        Moved,
        Ended,
    }

    #[derive(Default)]
    struct EventLog {
        events: Vec<(TouchId, Phase)>,
        consume_on_start: bool,
    }

    impl TouchHandler for EventLog {
        fn touch_started(&mut self, session: &mut TouchSession) {
            self.events.push((session.id(), Phase::Started));
            if self.consume_on_start {
                session.consume();
            }
        }

        fn touch_moved(&mut self, session: &mut TouchSession) {
            self.events.push((session.id(), Phase::Moved));
        }

        fn touch_ended(&mut self, session: &mut TouchSession) {
            self.events.push((session.id(), Phase::Ended));
        }
    }

    fn contact(id: u64, x: f32, y: f32) -> ContactSample {
        ContactSample {
            id: TouchId(id),
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn lifecycle_fires_start_move_end_once_each() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog::default();

        tracker.update(&[contact(1, 10.0, 10.0)], 0.1, &mut log);
        tracker.update(&[contact(1, 10.0, 10.0)], 0.1, &mut log);
        tracker.update(&[contact(1, 15.0, 12.0)], 0.1, &mut log);
        tracker.update(&[], 0.1, &mut log);
        tracker.update(&[], 0.1, &mut log);

        assert_eq!(
            log.events,
            vec![
                (TouchId(1), Phase::Started),
                (TouchId(1), Phase::Moved),
                (TouchId(1), Phase::Ended),
            ]
        );
        assert!(tracker.is_empty());
    }

    #[test]
    fn start_is_never_emitted_twice_for_a_live_id() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog::default();

        for step in 0..10 {
            tracker.update(&[contact(7, step as f32, 0.0)], 0.016, &mut log);
        }

        let starts = log
            .events
            .iter()
            .filter(|(_, phase)| *phase == Phase::Started)
            .count();
        assert_eq!(starts, 1);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn duplicate_ids_in_one_frame_share_a_session() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog::default();

        let counts = tracker.update(&[contact(3, 0.0, 0.0), contact(3, 0.0, 0.0)], 0.1, &mut log);

        assert_eq!(counts.started, 1);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn move_tracks_delta_origin_and_duration() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog::default();

        tracker.update(&[contact(1, 10.0, 10.0)], 0.25, &mut log);
        tracker.update(&[contact(1, 13.0, 6.0)], 0.25, &mut log);

        let session = tracker.session(TouchId(1)).expect("session");
        assert_eq!(session.origin(), Vec2::new(10.0, 10.0));
        assert_eq!(session.position(), Vec2::new(13.0, 6.0));
        assert_eq!(session.delta(), Vec2::new(3.0, -4.0));
        assert!((session.duration_seconds() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sessions_are_independent_per_id() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog::default();

        tracker.update(&[contact(1, 0.0, 0.0), contact(2, 5.0, 5.0)], 0.1, &mut log);
        let counts = tracker.update(&[contact(2, 6.0, 5.0)], 0.1, &mut log);

        assert_eq!(counts.moved, 1);
        assert_eq!(counts.ended, 1);
        assert!(tracker.session(TouchId(1)).is_none());
        assert!(tracker.session(TouchId(2)).is_some());
    }

    #[test]
    fn consumed_session_skips_moves_but_still_ends() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog {
            consume_on_start: true,
            ..EventLog::default()
        };

        tracker.update(&[contact(4, 0.0, 0.0)], 0.1, &mut log);
        tracker.update(&[contact(4, 8.0, 0.0)], 0.1, &mut log);
        tracker.update(&[], 0.1, &mut log);

        assert_eq!(
            log.events,
            vec![(TouchId(4), Phase::Started), (TouchId(4), Phase::Ended)]
        );
    }

    #[test]
    fn reused_id_after_end_starts_new_session() {
        let mut tracker = TouchTracker::new();
        let mut log = EventLog::default();

        tracker.update(&[contact(9, 0.0, 0.0)], 0.1, &mut log);
        tracker.update(&[], 0.1, &mut log);
        tracker.update(&[contact(9, 1.0, 1.0)], 0.1, &mut log);

        let session = tracker.session(TouchId(9)).expect("session");
        assert_eq!(session.origin(), Vec2::new(1.0, 1.0));
        assert_eq!(
            log.events
                .iter()
                .filter(|(_, phase)| *phase == Phase::Started)
                .count(),
            2
        );
    }
}
