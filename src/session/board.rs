//! Question progress and the answer being transcribed

use crate::questions::QuestionRecord;

/// Ordered question list with exactly one current question
///
/// Questions before the current one are completed; the list never grows or
/// shrinks once created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBoard {
    questions: Vec<QuestionRecord>,
    current: usize,
}

impl QuestionBoard {
    /// Take ownership of `questions`, making the first one current
    #[must_use]
    pub fn new(mut questions: Vec<QuestionRecord>) -> Self {
        for (idx, question) in questions.iter_mut().enumerate() {
            question.completed = false;
            question.is_current = idx == 0;
        }

        Self {
            questions,
            current: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Whether the current question is the final one
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    /// Complete the current question and make the next one current
    ///
    /// Returns the new current question, or `None` (leaving the board
    /// untouched) when the current question is the last.
    pub fn advance(&mut self) -> Option<&QuestionRecord> {
        if self.is_last() {
            return None;
        }

        let finished = &mut self.questions[self.current];
        finished.completed = true;
        finished.is_current = false;

        self.current += 1;
        let next = &mut self.questions[self.current];
        next.is_current = true;
        Some(next)
    }
}

/// Finalized answer text plus the provisional fragment still being recognised
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerBuffer {
    text: String,
    interim: String,
}

impl AnswerBuffer {
    /// Append a final fragment and drop the interim one
    pub fn push_final(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(fragment);
        }
        self.interim.clear();
    }

    /// Replace the interim fragment
    pub fn set_interim(&mut self, fragment: &str) {
        fragment.clone_into(&mut self.interim);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.interim.clear();
    }

    /// Finalized text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn interim(&self) -> &str {
        &self.interim
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.interim.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(n: u32) -> QuestionBoard {
        QuestionBoard::new(
            (1..=n)
                .map(|id| QuestionRecord::new(id, "Label", format!("Question {id}?")))
                .collect(),
        )
    }

    fn assert_invariants(board: &QuestionBoard) {
        let questions = board.questions();
        assert_eq!(questions.iter().filter(|q| q.is_current).count(), 1);
        for (idx, q) in questions.iter().enumerate() {
            assert_eq!(q.completed, idx < board.current_index(), "question {idx}");
            assert_eq!(q.is_current, idx == board.current_index());
        }
    }

    #[test]
    fn advancing_keeps_completed_prefix() {
        let mut board = board(4);
        assert_invariants(&board);

        for expected in 2..=4 {
            let next = board.advance().unwrap();
            assert_eq!(next.id, expected);
            assert_invariants(&board);
        }

        assert!(board.is_last());
        assert!(board.advance().is_none());
        assert_eq!(board.current_index(), 3);
        assert_invariants(&board);
    }

    #[test]
    fn new_normalises_flags() {
        let mut questions: Vec<QuestionRecord> = (1..=3)
            .map(|id| QuestionRecord::new(id, "L", "Q"))
            .collect();
        questions[2].is_current = true;
        questions[1].completed = true;

        assert_invariants(&QuestionBoard::new(questions));
    }

    #[test]
    fn empty_board() {
        let mut board = QuestionBoard::default();
        assert!(board.is_empty());
        assert!(board.current().is_none());
        assert!(board.advance().is_none());
    }

    #[test]
    fn interim_then_final() {
        let mut answer = AnswerBuffer::default();

        answer.set_interim("hel");
        answer.set_interim("hello");
        assert_eq!(answer.text(), "");
        assert_eq!(answer.interim(), "hello");

        answer.push_final("hello there");
        assert_eq!(answer.text(), "hello there");
        assert_eq!(answer.interim(), "");

        answer.push_final(" and more ");
        assert_eq!(answer.text(), "hello there and more");

        answer.clear();
        assert!(answer.is_empty());
    }
}
