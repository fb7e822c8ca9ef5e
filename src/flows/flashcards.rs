use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardInput {
    pub topic: String,
    pub count: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub cards: Vec<Flashcard>,
}

impl Schema for FlashcardInput {
    fn contract() -> Contract {
        Contract::new("FlashcardInput")
            .required("topic", FieldType::text())
            .required("count", FieldType::integer(1, 30))
            .optional("notes", FieldType::string())
    }
}

impl Schema for Flashcard {
    fn contract() -> Contract {
        Contract::new("Flashcard")
            .required("front", FieldType::text())
            .required("back", FieldType::text())
    }
}

impl Schema for FlashcardDeck {
    fn contract() -> Contract {
        Contract::new("FlashcardDeck").required(
            "cards",
            FieldType::list_between(FieldType::object::<Flashcard>(), 1, 30),
        )
    }
}

pub struct GenerateFlashcards;

impl Flow for GenerateFlashcards {
    const NAME: &'static str = "generate_flashcards";
    const TEMPLATE: &'static str = prompts::FLASHCARDS;
    type Input = FlashcardInput;
    type Output = FlashcardDeck;
}

pub async fn generate_flashcards(
    studio: &Studio,
    input: &FlashcardInput,
) -> Result<FlashcardDeck, FlowError> {
    invoke::<GenerateFlashcards>(studio, input).await
}
