use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeNotesInput {
    pub notes: String,
    #[serde(default)]
    pub focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesSummary {
    pub summary: String,
    pub key_points: Vec<String>,
}

impl Schema for SummarizeNotesInput {
    fn contract() -> Contract {
        Contract::new("SummarizeNotesInput")
            .required("notes", FieldType::text())
            .optional("focus", FieldType::string())
    }
}

impl Schema for NotesSummary {
    fn contract() -> Contract {
        Contract::new("NotesSummary")
            .required("summary", FieldType::text())
            .required(
                "keyPoints",
                FieldType::list_between(FieldType::text(), 1, 10),
            )
    }
}

pub struct SummarizeNotes;

impl Flow for SummarizeNotes {
    const NAME: &'static str = "summarize_notes";
    const TEMPLATE: &'static str = prompts::SUMMARIZE_NOTES;
    type Input = SummarizeNotesInput;
    type Output = NotesSummary;
}

pub async fn summarize_notes(
    studio: &Studio,
    input: &SummarizeNotesInput,
) -> Result<NotesSummary, FlowError> {
    invoke::<SummarizeNotes>(studio, input).await
}
