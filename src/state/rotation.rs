use rand::{rng, seq::SliceRandom};
use uuid::Uuid;

use crate::state::game::Quiz;

/// Outcome of looking for the next quiz in the rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuiz {
    /// An unplayed quiz follows the current one.
    Next(Quiz),
    /// The catalog is exhausted.
    Exhausted,
}

/// Quiz sequence of the room and Free Mode flag.
#[derive(Debug, Clone, Default)]
pub struct QuizRotation {
    catalog: Vec<Quiz>,
    current_index: Option<usize>,
    current: Option<Quiz>,
    free_mode: bool,
}

impl QuizRotation {
    /// Build a rotation over an ordered catalog.
    pub fn new(catalog: Vec<Quiz>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Ordered quiz list of the room.
    pub fn catalog(&self) -> &[Quiz] {
        &self.catalog
    }

    /// Look up a catalog entry.
    pub fn find(&self, id: Uuid) -> Option<&Quiz> {
        self.catalog.iter().find(|quiz| quiz.id == id)
    }

    /// Quiz of the running round.
    pub fn current(&self) -> Option<&Quiz> {
        self.current.as_ref()
    }

    /// Catalog position of the last quiz started from the catalog.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Whether the running round is a Free Mode round.
    pub fn is_free_mode(&self) -> bool {
        self.free_mode
    }

    /// Next unplayed catalog entry after the current index.
    pub fn next(&self) -> NextQuiz {
        let index = self.current_index.map_or(0, |index| index + 1);
        match self.catalog.get(index) {
            Some(quiz) => NextQuiz::Next(quiz.clone()),
            None => NextQuiz::Exhausted,
        }
    }

    /// Make `quiz` the current one. Quizzes absent from the local catalog keep the index.
    pub fn begin_quiz(&mut self, quiz: Quiz) {
        if let Some(index) = self.catalog.iter().position(|entry| entry.id == quiz.id) {
            self.current_index = Some(index);
        }
        self.current = Some(quiz);
        self.free_mode = false;
    }

    /// Make the synthetic Free Mode quiz the current one.
    pub fn begin_free_mode(&mut self, quiz: Quiz) {
        self.current = Some(quiz);
        self.free_mode = true;
    }

    /// Drop the current quiz, keeping the position in the catalog.
    pub fn clear_current(&mut self) {
        self.current = None;
        self.free_mode = false;
    }

    /// Replace the catalog, keeping the position when the current quiz is still listed.
    pub fn replace_catalog(&mut self, catalog: Vec<Quiz>) {
        self.current_index = self
            .current
            .as_ref()
            .and_then(|current| catalog.iter().position(|quiz| quiz.id == current.id));
        self.catalog = catalog;
    }

    /// Shuffle the catalog before the first quiz is requested.
    ///
    /// Returns `false` once the rotation has started.
    pub fn shuffle(&mut self) -> bool {
        if self.current_index.is_some() {
            return false;
        }
        if self.catalog.len() > 1 {
            let mut rng = rng();
            self.catalog.shuffle(&mut rng);
        }
        true
    }

    /// Forget the position and the current quiz for a new room session.
    pub fn reset_session(&mut self) {
        self.current_index = None;
        self.clear_current();
    }
}
