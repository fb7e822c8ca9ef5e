use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Difficulty;
use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

const READING_WRITING: &str = "Reading & Writing";
const MATH: &str = "Math";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SatCategory {
    #[serde(rename = "Reading & Writing")]
    ReadingWriting,
    #[serde(rename = "Math")]
    Math,
}

impl SatCategory {
    /// Odd-length seeds select Reading & Writing, even-length seeds Math.
    pub fn for_seed(seed: &str) -> Self {
        if seed.chars().count() % 2 == 1 {
            SatCategory::ReadingWriting
        } else {
            SatCategory::Math
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SatCategory::ReadingWriting => READING_WRITING,
            SatCategory::Math => MATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatQuestionInput {
    pub seed: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatQuestion {
    pub category: SatCategory,
    #[serde(default)]
    pub passage: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl Schema for SatQuestionInput {
    fn contract() -> Contract {
        Contract::new("SatQuestionInput")
            .required("seed", FieldType::text())
            .optional("difficulty", Difficulty::field())
    }
}

impl Schema for SatQuestion {
    fn contract() -> Contract {
        Contract::new("SatQuestion")
            .required("category", FieldType::one_of(&[READING_WRITING, MATH]))
            .optional("passage", FieldType::string())
            .required("question", FieldType::text())
            .required("options", FieldType::exactly(FieldType::text(), 4))
            .required("correctAnswer", FieldType::one_of(&["A", "B", "C", "D"]))
            .required("explanation", FieldType::text())
    }
}

pub struct GenerateSatQuestion;

impl Flow for GenerateSatQuestion {
    const NAME: &'static str = "generate_sat_question";
    const TEMPLATE: &'static str = prompts::SAT_QUESTION;
    type Input = SatQuestionInput;
    type Output = SatQuestion;

    fn context(input: &SatQuestionInput, mut serialized: Value) -> Value {
        serialized["category"] = json!(SatCategory::for_seed(&input.seed).as_str());
        serialized
    }
}

pub async fn generate_sat_question(
    studio: &Studio,
    input: &SatQuestionInput,
) -> Result<SatQuestion, FlowError> {
    invoke::<GenerateSatQuestion>(studio, input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flow::FailureCause, flows::testing::studio, provider::ScriptedClient};

    fn question(category: &str, options: usize) -> Value {
        json!({
            "category": category,
            "passage": null,
            "question": "If 2x + 3 = 11, what is x?",
            "options": (1..=options).map(|n| n.to_string()).collect::<Vec<_>>(),
            "correctAnswer": "D",
            "explanation": "2x = 8, so x = 4.",
        })
    }

    #[test]
    fn seed_parity_selects_category() {
        assert_eq!(SatCategory::for_seed("abc"), SatCategory::ReadingWriting);
        assert_eq!(SatCategory::for_seed("abcd"), SatCategory::Math);
        assert_eq!(SatCategory::for_seed("é"), SatCategory::ReadingWriting);
    }

    #[tokio::test]
    async fn odd_seed_prompts_for_reading_and_writing() {
        let (studio, client) =
            studio(ScriptedClient::new().respond_json(question(READING_WRITING, 4)));
        let input = SatQuestionInput {
            seed: "abc".into(),
            difficulty: None,
        };
        let out = generate_sat_question(&studio, &input).await.unwrap();
        assert_eq!(out.category, SatCategory::ReadingWriting);

        let prompt = client.last_prompt().unwrap();
        assert!(prompt.contains("Write one Reading & Writing question."));
        assert!(prompt.contains("short passage"));
    }

    #[tokio::test]
    async fn even_seed_prompts_for_math() {
        let (studio, client) = studio(ScriptedClient::new().respond_json(question(MATH, 4)));
        let input = SatQuestionInput {
            seed: "abcd".into(),
            difficulty: Some(Difficulty::Hard),
        };
        let out = generate_sat_question(&studio, &input).await.unwrap();
        assert_eq!(out.options.len(), 4);

        let prompt = client.last_prompt().unwrap();
        assert!(prompt.contains("Write one Math question at hard difficulty."));
    }

    #[tokio::test]
    async fn five_options_fail_validation() {
        let (studio, _) = studio(ScriptedClient::new().respond_json(question(MATH, 5)));
        let input = SatQuestionInput {
            seed: "ab".into(),
            difficulty: None,
        };
        let err = generate_sat_question(&studio, &input).await.unwrap_err();
        assert!(matches!(err.cause, FailureCause::InvalidOutput(_)));
    }
}
