//! The questionnaire: prompts, options and which questions are shown.
//!
//! Option values come straight from the preference delta table, so every
//! option offered here moves the preference vector.

use serde::Serialize;

use crate::preference::{AnswerSet, Question};

/// Pairing answer that opens the meal follow-up.
pub const MEAL_PAIRING: &str = "食事と一緒に";
/// Pairing answer that opens the dessert follow-up.
pub const DESSERT_PAIRING: &str = "デザートと一緒に";

/// One question as presented to the user.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSpec {
    /// Question.
    pub question: Question,
    /// Prompt text.
    pub prompt: &'static str,
    /// Accepted answer values.
    pub options: Vec<&'static str>,
}

impl QuestionSpec {
    fn new(question: Question) -> Self {
        Self {
            question,
            prompt: prompt(question),
            options: question.options().collect(),
        }
    }

    /// Returns `true` when `answer` is one of the options.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        self.options.contains(&answer)
    }
}

fn prompt(question: Question) -> &'static str {
    match question {
        Question::Pairing => "今日は、何に合わせてお酒を選びましょうか。",
        Question::RiceDetail => "お料理は、どんなものを召し上がりますか。",
        Question::DessertDetail => "甘いものは、どんなものを召し上がりますか。",
        Question::SweetDry => "甘口と辛口でしたら、どちらがお好みですか。",
        Question::Richness => "味わいの印象はどれがお好みでしょうか。",
        Question::Aroma => "香りは、どんなタイプがお好きですか？",
    }
}

/// Whether `question` is shown given the answers so far.
///
/// The meal and dessert follow-ups only appear after the matching pairing.
#[must_use]
pub fn is_visible(question: Question, answers: &AnswerSet) -> bool {
    match question {
        Question::RiceDetail => answers.get(Question::Pairing) == Some(MEAL_PAIRING),
        Question::DessertDetail => answers.get(Question::Pairing) == Some(DESSERT_PAIRING),
        _ => true,
    }
}

/// All questions in presentation order.
#[must_use]
pub fn questions() -> Vec<QuestionSpec> {
    Question::ALL.into_iter().map(QuestionSpec::new).collect()
}

/// Questions shown for the given answers, in presentation order.
#[must_use]
pub fn visible_questions(answers: &AnswerSet) -> Vec<QuestionSpec> {
    Question::ALL
        .into_iter()
        .filter(|q| is_visible(*q, answers))
        .map(QuestionSpec::new)
        .collect()
}

/// Returns `true` when every visible question has a valid answer.
#[must_use]
pub fn is_complete(answers: &AnswerSet) -> bool {
    visible_questions(answers).iter().all(|spec| {
        answers
            .get(spec.question)
            .is_some_and(|answer| spec.accepts(answer))
    })
}

/// The visible questions still missing a valid answer.
#[must_use]
pub fn unanswered(answers: &AnswerSet) -> Vec<Question> {
    visible_questions(answers)
        .into_iter()
        .filter(|spec| !answers.get(spec.question).is_some_and(|a| spec.accepts(a)))
        .map(|spec| spec.question)
        .collect()
}
