use serde::{Deserialize, Serialize};

use super::Difficulty;
use crate::{
    contract::{Contract, ContractViolation, FieldType, Schema, ViolationKind},
    flow::{invoke, FailureCause, Flow, FlowError},
    prompts, Studio,
};

pub const MAX_QUESTIONS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizInput {
    pub topic: String,
    pub difficulty: Difficulty,
    pub num_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: u32,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Schema for QuizInput {
    fn contract() -> Contract {
        Contract::new("QuizInput")
            .required("topic", FieldType::text())
            .required("difficulty", Difficulty::field())
            .required("numQuestions", FieldType::integer(1, MAX_QUESTIONS as i64))
    }
}

impl Schema for QuizQuestion {
    fn contract() -> Contract {
        Contract::new("QuizQuestion")
            .required("question", FieldType::text())
            .required("options", FieldType::exactly(FieldType::text(), 4))
            .required("answerIndex", FieldType::integer(0, 3))
            .describe("zero-based index into options")
            .required("explanation", FieldType::text())
    }
}

impl Schema for Quiz {
    fn contract() -> Contract {
        Contract::new("Quiz").required(
            "questions",
            FieldType::list_between(FieldType::object::<QuizQuestion>(), 1, MAX_QUESTIONS),
        )
    }
}

pub struct GenerateQuiz;

impl Flow for GenerateQuiz {
    const NAME: &'static str = "generate_quiz";
    const TEMPLATE: &'static str = prompts::QUIZ;
    type Input = QuizInput;
    type Output = Quiz;
}

/// The quiz must contain exactly the requested number of questions.
pub async fn generate_quiz(studio: &Studio, input: &QuizInput) -> Result<Quiz, FlowError> {
    let quiz = invoke::<GenerateQuiz>(studio, input).await?;
    let count = quiz.questions.len();
    if count != input.num_questions as usize {
        return Err(FlowError::new(
            GenerateQuiz::NAME,
            FailureCause::InvalidOutput(ContractViolation {
                contract: "Quiz",
                path: "$.questions".into(),
                kind: ViolationKind::Cardinality {
                    count,
                    bounds: input.num_questions.to_string(),
                },
            }),
        ));
    }
    Ok(quiz)
}
