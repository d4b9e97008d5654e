//! Timed course quizzes.
//!
//! A `QuizAttempt` walks through a `Quiz`, records answers, counts the time
//! limit down one second per `tick`, and submits itself when the time runs
//! out. Scores are whole percentages compared against the quiz's passing
//! score.

pub mod attempt;

pub use attempt::{format_time, Question, Quiz, QuizAttempt, QuizResult};
