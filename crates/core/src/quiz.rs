//! Quiz data as served by the remote service, plus the bookkeeping a client
//! needs while the user works through it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Refreshes allowed per question within one session.
pub const MAX_REFRESHES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    TrueFalse,
}

/// Question mix requested when generating a quiz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizFormat {
    Mcq,
    TrueFalse,
    #[default]
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Text(String),
}

impl Answer {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::Bool(b) => Some(*b),
            Answer::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Answer::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            Answer::Text(_) => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Bool(b) => write!(f, "{}", b),
            Answer::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: Answer,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &Answer) -> bool {
        match self.kind {
            QuestionKind::TrueFalse => {
                // Anything that isn't a recognizable "true" counts as false.
                let given = answer.as_bool().unwrap_or(false);
                self.correct_answer.as_bool() == Some(given)
            }
            QuestionKind::Mcq => {
                answer.to_string().to_lowercase() == self.correct_answer.to_string().to_lowercase()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedQuiz {
    pub questions: Vec<QuizQuestion>,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshedQuestion {
    pub new_question: QuizQuestion,
    pub refresh_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    session_id: String,
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<Answer>>,
    refresh_counts: Vec<u32>,
}

impl QuizSession {
    pub fn new(quiz: GeneratedQuiz) -> Self {
        let len = quiz.questions.len();
        Self {
            session_id: quiz.session_id,
            questions: quiz.questions,
            answers: vec![None; len],
            refresh_counts: vec![0; len],
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<Answer>] {
        &self.answers
    }

    /// Record an answer. Returns false for an index outside the quiz.
    pub fn answer(&mut self, index: usize, answer: Answer) -> bool {
        match self.answers.get_mut(index) {
            Some(slot) => {
                *slot = Some(answer);
                true
            }
            None => false,
        }
    }

    /// `None` until the question has been answered.
    pub fn check(&self, index: usize) -> Option<bool> {
        let question = self.questions.get(index)?;
        let answer = self.answers.get(index)?.as_ref()?;
        Some(question.is_correct(answer))
    }

    pub fn refreshes_left(&self, index: usize) -> u32 {
        self.refresh_counts
            .get(index)
            .map_or(0, |used| MAX_REFRESHES.saturating_sub(*used))
    }

    pub fn can_refresh(&self, index: usize) -> bool {
        self.refreshes_left(index) > 0
    }

    /// Swap in a regenerated question. Its previous answer is cleared.
    pub fn apply_refresh(&mut self, index: usize, refreshed: RefreshedQuestion) -> bool {
        if index >= self.questions.len() {
            return false;
        }
        self.questions[index] = refreshed.new_question;
        self.refresh_counts[index] = refreshed.refresh_count;
        self.answers[index] = None;
        true
    }

    pub fn ready_to_submit(&self) -> bool {
        !self.answers.is_empty() && self.answers.iter().all(Option::is_some)
    }
}
