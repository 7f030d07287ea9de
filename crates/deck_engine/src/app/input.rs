use std::collections::BTreeMap;

use glam::Vec2;

use super::touch::{ContactSample, TouchId};

/// Latest known position of every live contact, in id order.
#[derive(Debug, Clone, Default)]
pub struct ContactBoard {
    contacts: BTreeMap<TouchId, Vec2>,
}

impl ContactBoard {
    pub fn press(&mut self, id: TouchId, position_px: Vec2) {
        self.contacts.insert(id, position_px);
    }

    pub fn lift(&mut self, id: TouchId) -> bool {
        self.contacts.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn samples(&self) -> Vec<ContactSample> {
        self.contacts
            .iter()
            .map(|(id, position)| ContactSample {
                id: *id,
                position: *position,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_overwrites_position_for_same_id() {
        let mut board = ContactBoard::default();
        board.press(TouchId(1), Vec2::new(1.0, 1.0));
        board.press(TouchId(1), Vec2::new(2.0, 3.0));

        assert_eq!(
            board.samples(),
            vec![ContactSample {
                id: TouchId(1),
                position: Vec2::new(2.0, 3.0),
            }]
        );
    }

    #[test]
    fn samples_are_ordered_by_id() {
        let mut board = ContactBoard::default();
        board.press(TouchId(5), Vec2::ZERO);
        board.press(TouchId(2), Vec2::ZERO);
        let ids: Vec<_> = board.samples().into_iter().map(|sample| sample.id).collect();
        assert_eq!(ids, vec![TouchId(2), TouchId(5)]);
    }

    #[test]
    fn lift_reports_whether_contact_existed() {
        let mut board = ContactBoard::default();
        board.press(TouchId(1), Vec2::ZERO);
        assert!(board.lift(TouchId(1)));
        assert!(!board.lift(TouchId(1)));
        assert!(board.is_empty());
    }
}
