use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    data_uri::DataUri,
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnerLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainConceptInput {
    pub concept: String,
    pub level: LearnerLevel,
    #[serde(default)]
    pub image_data_uri: Option<DataUri>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptExplanation {
    pub explanation: String,
    pub analogy: String,
    pub check_question: String,
}

impl Schema for ExplainConceptInput {
    fn contract() -> Contract {
        Contract::new("ExplainConceptInput")
            .required("concept", FieldType::text())
            .required(
                "level",
                FieldType::one_of(&["beginner", "intermediate", "advanced"]),
            )
            .optional("imageDataUri", FieldType::text())
    }
}

impl Schema for ConceptExplanation {
    fn contract() -> Contract {
        Contract::new("ConceptExplanation")
            .required("explanation", FieldType::text())
            .required("analogy", FieldType::text())
            .required("checkQuestion", FieldType::text())
    }
}

pub struct ExplainConcept;

impl Flow for ExplainConcept {
    const NAME: &'static str = "explain_concept";
    const TEMPLATE: &'static str = prompts::EXPLAIN_CONCEPT;
    type Input = ExplainConceptInput;
    type Output = ConceptExplanation;

    fn attachments(input: &ExplainConceptInput) -> Vec<DataUri> {
        input.image_data_uri.iter().cloned().collect()
    }
}

pub async fn explain_concept(
    studio: &Studio,
    input: &ExplainConceptInput,
) -> Result<ConceptExplanation, FlowError> {
    invoke::<ExplainConcept>(studio, input).await
}
