//! crates/flashcards_core/src/study.rs
//!
//! A single linear study pass over a shuffled working set.
//!
//! The session never touches storage. Every transition consumes the session and returns
//! the next one, so a controller holds exactly one value and replaces it on each event.

use rand::Rng;

/// In-place Fisher-Yates shuffle: for `i` from the last index down to 1, swap element `i`
/// with a uniformly chosen element in `0..=i`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyPhase {
    Empty,
    Active { cursor: usize, revealed: bool },
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyEvent {
    Flip,
    Advance,
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudySession<T> {
    cards: Vec<T>,
    cursor: usize,
    revealed: bool,
}

impl<T> Default for StudySession<T> {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            cursor: 0,
            revealed: false,
        }
    }
}

impl<T> StudySession<T> {
    /// Starts a session over a shuffled copy of `cards`.
    pub fn load<R: Rng + ?Sized>(mut cards: Vec<T>, rng: &mut R) -> Self {
        shuffle(&mut cards, rng);
        Self {
            cards,
            cursor: 0,
            revealed: false,
        }
    }

    /// Reveals the answer. A no-op when nothing is loaded or the answer is already shown.
    pub fn flip(mut self) -> Self {
        if !self.cards.is_empty() {
            self.revealed = true;
        }
        self
    }

    /// Moves to the next card, but only after the current answer was revealed and
    /// while there is a next card.
    pub fn advance(mut self) -> Self {
        if self.revealed && self.cursor + 1 < self.cards.len() {
            self.cursor += 1;
            self.revealed = false;
        }
        self
    }

    /// Re-shuffles the current working set and starts over.
    pub fn restart<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        Self::load(self.cards, rng)
    }

    pub fn apply<R: Rng + ?Sized>(self, event: StudyEvent, rng: &mut R) -> Self {
        match event {
            StudyEvent::Flip => self.flip(),
            StudyEvent::Advance => self.advance(),
            StudyEvent::Restart => self.restart(rng),
        }
    }

    pub fn phase(&self) -> StudyPhase {
        if self.cards.is_empty() {
            StudyPhase::Empty
        } else if self.is_completed() {
            StudyPhase::Completed
        } else {
            StudyPhase::Active {
                cursor: self.cursor,
                revealed: self.revealed,
            }
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.cards.get(self.cursor)
    }

    pub fn cards(&self) -> &[T] {
        &self.cards
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn completed_count(&self) -> usize {
        (self.cursor + 1).min(self.cards.len())
    }

    pub fn is_completed(&self) -> bool {
        !self.cards.is_empty() && self.cursor == self.cards.len() - 1 && self.revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn loaded(n: u32) -> StudySession<u32> {
        StudySession::load((1..=n).collect(), &mut rng())
    }

    #[test]
    fn load_is_a_permutation() {
        let session = loaded(5);
        let mut cards = session.cards().to_vec();
        cards.sort_unstable();
        assert_eq!(cards, vec![1, 2, 3, 4, 5]);
        assert_eq!(session.phase(), StudyPhase::Active { cursor: 0, revealed: false });
    }

    #[test]
    fn shuffle_reaches_every_position() {
        // Each value should land in each slot at least once over many shuffles.
        let mut seen = [[false; 4]; 4];
        let mut rng = rng();
        for _ in 0..500 {
            let mut items = [0usize, 1, 2, 3];
            shuffle(&mut items, &mut rng);
            for (slot, value) in items.iter().enumerate() {
                seen[*value][slot] = true;
            }
        }
        assert!(seen.iter().flatten().all(|hit| *hit));
    }

    #[test]
    fn empty_load_is_empty() {
        let session: StudySession<u32> = StudySession::load(Vec::new(), &mut rng());
        assert_eq!(session.phase(), StudyPhase::Empty);
        assert_eq!(session.completed_count(), 0);
        assert!(session.current().is_none());
        let session = session.flip().advance();
        assert_eq!(session.phase(), StudyPhase::Empty);
        assert!(!session.is_revealed());
    }

    #[test]
    fn advance_before_flip_is_a_noop() {
        let session = loaded(3);
        let before = session.clone();
        assert_eq!(session.advance(), before);
    }

    #[test]
    fn flip_is_idempotent() {
        let once = loaded(3).flip();
        let twice = once.clone().flip();
        assert_eq!(once, twice);
    }

    #[test]
    fn completes_only_on_last_card_revealed() {
        let mut session = loaded(5);
        for step in 0..4 {
            assert!(!session.is_completed());
            session = session.flip();
            assert!(!session.is_completed(), "completed early at step {}", step);
            session = session.advance();
        }
        assert_eq!(session.cursor(), 4);
        assert!(!session.is_completed());
        assert_eq!(session.completed_count(), 5);

        session = session.flip();
        assert!(session.is_completed());
        assert_eq!(session.phase(), StudyPhase::Completed);

        // Advancing past the last card does nothing.
        let after = session.clone().advance();
        assert_eq!(after, session);
    }

    #[test]
    fn restart_resets_cursor_and_keeps_cards() {
        let mut rng = rng();
        let session = loaded(4).flip().advance().flip();
        let restarted = session.apply(StudyEvent::Restart, &mut rng);
        assert_eq!(restarted.cursor(), 0);
        assert!(!restarted.is_revealed());
        let mut cards = restarted.cards().to_vec();
        cards.sort_unstable();
        assert_eq!(cards, vec![1, 2, 3, 4]);
    }

    #[test]
    fn single_card_session() {
        let mut rng = rng();
        let session = StudySession::load(vec!["only"], &mut rng);
        assert_eq!(session.completed_count(), 1);
        let session = session.apply(StudyEvent::Flip, &mut rng);
        assert!(session.is_completed());
        assert_eq!(session.current(), Some(&"only"));
    }
}
