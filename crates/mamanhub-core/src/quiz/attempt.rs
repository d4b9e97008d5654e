use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub course_title: String,
    /// Time limit in seconds
    pub time_limit: u32,
    /// Minimum score, in percent, needed to pass
    pub passing_score: u32,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    /// Percentage of correct answers, rounded to the nearest whole number
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub passed: bool,
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One run through a quiz
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    quiz: Quiz,
    current: usize,
    answers: HashMap<String, usize>,
    time_remaining: u32,
    submitted: bool,
}

impl QuizAttempt {
    pub fn new(quiz: Quiz) -> Self {
        let time_remaining = quiz.time_limit;
        Self {
            quiz,
            current: 0,
            answers: HashMap::new(),
            time_remaining,
            submitted: false,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.current)
    }

    /// Record the chosen option for a question, replacing an earlier choice.
    /// Ignored once the attempt is submitted.
    pub fn answer(&mut self, question_id: &str, option: usize) {
        if self.submitted {
            return;
        }
        self.answers.insert(question_id.to_string(), option);
    }

    pub fn answer_for(&self, question_id: &str) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Move to the next question. Returns false on the last one.
    pub fn next_question(&mut self) -> bool {
        if self.current + 1 < self.quiz.questions.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous question. Returns false on the first one.
    pub fn prev_question(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Position through the quiz in percent, counting the current question
    pub fn progress(&self) -> f64 {
        if self.quiz.questions.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.quiz.questions.len() as f64 * 100.0
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Advance the countdown by one second. When the last second runs out
    /// the attempt is submitted and its result returned.
    pub fn tick(&mut self) -> Option<QuizResult> {
        if self.submitted {
            return None;
        }
        if self.time_remaining <= 1 {
            self.time_remaining = 0;
            debug!(quiz_id = %self.quiz.id, "Quiz time is up");
            return Some(self.submit());
        }
        self.time_remaining -= 1;
        None
    }

    /// Finish the attempt and score it
    pub fn submit(&mut self) -> QuizResult {
        self.submitted = true;
        let result = self.result();
        info!(
            quiz_id = %self.quiz.id,
            score = result.score,
            passed = result.passed,
            "Quiz submitted"
        );
        result
    }

    pub fn correct_count(&self) -> usize {
        self.quiz
            .questions
            .iter()
            .filter(|q| self.answers.get(&q.id) == Some(&q.correct_answer))
            .count()
    }

    /// Score of the answers given so far. A quiz without questions scores 0.
    pub fn result(&self) -> QuizResult {
        let total = self.quiz.questions.len();
        let correct = self.correct_count();
        let score = if total == 0 {
            0
        } else {
            (correct as f64 / total as f64 * 100.0).round() as u32
        };
        QuizResult {
            score,
            correct,
            total,
            passed: score >= self.quiz.passing_score,
        }
    }

    /// Start over: answers cleared, first question, full time
    pub fn retry(&mut self) {
        self.answers.clear();
        self.current = 0;
        self.time_remaining = self.quiz.time_limit;
        self.submitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, correct: usize) -> Question {
        Question {
            id: id.to_string(),
            question: format!("Question {}", id),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            explanation: String::new(),
        }
    }

    fn quiz(questions: usize, time_limit: u32) -> Quiz {
        Quiz {
            id: "quiz1".to_string(),
            title: "HTML Fundamentals".to_string(),
            course_title: "Web Development".to_string(),
            time_limit,
            passing_score: 70,
            questions: (0..questions)
                .map(|i| question(&format!("q{}", i + 1), i % 4))
                .collect(),
        }
    }

    #[test]
    fn test_score_rounds_to_whole_percent() {
        let mut attempt = QuizAttempt::new(quiz(3, 600));
        attempt.answer("q1", 0);
        attempt.answer("q2", 1);
        attempt.answer("q3", 0);

        let result = attempt.result();
        assert_eq!(result.correct, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.score, 67);
        assert!(!result.passed);
    }

    #[test]
    fn test_passing_score_is_inclusive() {
        let mut q = quiz(10, 600);
        q.passing_score = 70;
        let mut attempt = QuizAttempt::new(q);
        for i in 0..7 {
            attempt.answer(&format!("q{}", i + 1), i % 4);
        }
        let result = attempt.submit();
        assert_eq!(result.score, 70);
        assert!(result.passed);
    }

    #[test]
    fn test_changing_an_answer_replaces_it() {
        let mut attempt = QuizAttempt::new(quiz(2, 600));
        attempt.answer("q1", 3);
        attempt.answer("q1", 0);
        assert_eq!(attempt.answer_for("q1"), Some(0));
        assert_eq!(attempt.answered_count(), 1);
        assert_eq!(attempt.result().score, 50);
    }

    #[test]
    fn test_countdown_submits_at_zero() {
        let mut attempt = QuizAttempt::new(quiz(5, 3));
        attempt.answer("q1", 0);

        assert_eq!(attempt.tick(), None);
        assert_eq!(attempt.tick(), None);
        assert_eq!(attempt.time_remaining(), 1);

        let result = attempt.tick().expect("time up should submit");
        assert!(attempt.is_submitted());
        assert_eq!(attempt.time_remaining(), 0);
        assert_eq!(result.score, 20);

        // The timer stops and answers are frozen after submission
        assert_eq!(attempt.tick(), None);
        attempt.answer("q2", 1);
        assert_eq!(attempt.answered_count(), 1);
    }

    #[test]
    fn test_navigation_and_progress() {
        let mut attempt = QuizAttempt::new(quiz(4, 600));
        assert!(!attempt.prev_question());
        assert_eq!(attempt.progress(), 25.0);

        assert!(attempt.next_question());
        assert!(attempt.next_question());
        assert!(attempt.next_question());
        assert!(!attempt.next_question());
        assert_eq!(attempt.current_question().unwrap().id, "q4");
        assert_eq!(attempt.progress(), 100.0);
    }

    #[test]
    fn test_retry_resets_everything() {
        let mut attempt = QuizAttempt::new(quiz(2, 10));
        attempt.answer("q1", 0);
        attempt.next_question();
        attempt.tick();
        attempt.submit();

        attempt.retry();
        assert!(!attempt.is_submitted());
        assert_eq!(attempt.answered_count(), 0);
        assert_eq!(attempt.current_index(), 0);
        assert_eq!(attempt.time_remaining(), 10);
    }

    #[test]
    fn test_empty_quiz_scores_zero() {
        let attempt = QuizAttempt::new(quiz(0, 60));
        assert_eq!(attempt.result().score, 0);
        assert_eq!(attempt.progress(), 0.0);
        assert!(attempt.current_question().is_none());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(600), "10:00");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(0), "0:00");
    }

    #[test]
    fn test_parse_quiz() {
        let quiz: Quiz = serde_json::from_str(
            r#"{"id":"quiz1","title":"HTML","timeLimit":600,"passingScore":70,"questions":[{"id":"q1","question":"What does HTML stand for?","options":["Hyper Text Markup Language","High Tech Modern Language"],"correctAnswer":0}]}"#,
        )
        .unwrap();
        assert_eq!(quiz.time_limit, 600);
        assert_eq!(quiz.questions[0].correct_answer, 0);
    }
}
