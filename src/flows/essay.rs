use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EssayType {
    Argumentative,
    Expository,
    Narrative,
    Descriptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayInput {
    pub topic: String,
    pub essay_type: EssayType,
    pub word_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Essay {
    pub title: String,
    pub outline: Vec<String>,
    pub essay: String,
}

impl Schema for EssayInput {
    fn contract() -> Contract {
        Contract::new("EssayInput")
            .required("topic", FieldType::text())
            .required(
                "essayType",
                FieldType::one_of(&["argumentative", "expository", "narrative", "descriptive"]),
            )
            .required("wordCount", FieldType::integer(100, 2000))
    }
}

impl Schema for Essay {
    fn contract() -> Contract {
        Contract::new("Essay")
            .required("title", FieldType::text())
            .required("outline", FieldType::list_between(FieldType::text(), 1, 10))
            .required("essay", FieldType::text())
    }
}

pub struct GenerateEssay;

impl Flow for GenerateEssay {
    const NAME: &'static str = "generate_essay";
    const TEMPLATE: &'static str = prompts::ESSAY;
    type Input = EssayInput;
    type Output = Essay;
}

pub async fn generate_essay(studio: &Studio, input: &EssayInput) -> Result<Essay, FlowError> {
    invoke::<GenerateEssay>(studio, input).await
}
