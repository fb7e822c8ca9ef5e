use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindfulnessInput {
    pub mood: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindfulnessExercise {
    pub title: String,
    pub steps: Vec<String>,
    pub affirmation: String,
}

impl Schema for MindfulnessInput {
    fn contract() -> Contract {
        Contract::new("MindfulnessInput")
            .required("mood", FieldType::text_up_to(200))
            .required("minutes", FieldType::integer(1, 60))
    }
}

impl Schema for MindfulnessExercise {
    fn contract() -> Contract {
        Contract::new("MindfulnessExercise")
            .required("title", FieldType::text())
            .required("steps", FieldType::list_between(FieldType::text(), 3, 10))
            .required("affirmation", FieldType::text())
    }
}

pub struct GenerateMindfulness;

impl Flow for GenerateMindfulness {
    const NAME: &'static str = "generate_mindfulness";
    const TEMPLATE: &'static str = prompts::MINDFULNESS;
    type Input = MindfulnessInput;
    type Output = MindfulnessExercise;
}

pub async fn generate_mindfulness(
    studio: &Studio,
    input: &MindfulnessInput,
) -> Result<MindfulnessExercise, FlowError> {
    invoke::<GenerateMindfulness>(studio, input).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{flows::testing::studio, provider::ScriptedClient};

    #[tokio::test]
    async fn pluralises_minutes() {
        let exercise = json!({
            "title": "Box breathing",
            "steps": ["Inhale for 4", "Hold for 4", "Exhale for 4"],
            "affirmation": "I am ready.",
        });
        let (studio, client) = studio(
            ScriptedClient::new()
                .respond_json(exercise.clone())
                .respond_json(exercise),
        );

        let mut input = MindfulnessInput {
            mood: "anxious before an exam".into(),
            minutes: 1,
        };
        generate_mindfulness(&studio, &input).await.unwrap();
        assert!(client.last_prompt().unwrap().contains("Available time: 1 minute\n"));

        input.minutes = 5;
        let out = generate_mindfulness(&studio, &input).await.unwrap();
        assert_eq!(out.steps.len(), 3);
        assert!(client.last_prompt().unwrap().contains("Available time: 5 minutes"));
    }

    #[tokio::test]
    async fn two_steps_are_not_enough() {
        let (studio, _) = studio(ScriptedClient::new().respond_json(json!({
            "title": "Quick reset",
            "steps": ["Breathe", "Relax"],
            "affirmation": "Calm.",
        })));
        let input = MindfulnessInput {
            mood: "tired".into(),
            minutes: 2,
        };
        assert!(generate_mindfulness(&studio, &input).await.is_err());
    }
}
