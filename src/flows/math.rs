use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MathProblemInput {
    pub problem: String,
    #[serde(default = "show_steps_default")]
    pub show_steps: bool,
}

fn show_steps_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MathSolution {
    pub steps: Vec<String>,
    pub final_answer: String,
}

impl Schema for MathProblemInput {
    fn contract() -> Contract {
        Contract::new("MathProblemInput")
            .required("problem", FieldType::text_up_to(2_000))
            .required("showSteps", FieldType::Boolean)
    }
}

impl Schema for MathSolution {
    fn contract() -> Contract {
        Contract::new("MathSolution")
            .required("steps", FieldType::list_between(FieldType::text(), 0, 20))
            .required("finalAnswer", FieldType::text())
    }
}

pub struct SolveMath;

impl Flow for SolveMath {
    const NAME: &'static str = "solve_math";
    const TEMPLATE: &'static str = prompts::SOLVE_MATH;
    type Input = MathProblemInput;
    type Output = MathSolution;
}

pub async fn solve_math(
    studio: &Studio,
    input: &MathProblemInput,
) -> Result<MathSolution, FlowError> {
    invoke::<SolveMath>(studio, input).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{flows::testing::studio, provider::ScriptedClient};

    #[tokio::test]
    async fn steps_toggle_changes_instructions() {
        let (studio, client) = studio(
            ScriptedClient::new()
                .respond_json(json!({ "steps": ["2x = 8", "x = 4"], "finalAnswer": "4" }))
                .respond_json(json!({ "steps": [], "finalAnswer": "4" })),
        );

        let mut input = MathProblemInput {
            problem: "2x + 3 = 11".into(),
            show_steps: true,
        };
        let out = solve_math(&studio, &input).await.unwrap();
        assert_eq!(out.steps.len(), 2);
        assert!(client.last_prompt().unwrap().contains("Show your working"));

        input.show_steps = false;
        let out = solve_math(&studio, &input).await.unwrap();
        assert!(out.steps.is_empty());
        assert!(client.last_prompt().unwrap().contains("Return an empty list of steps."));
    }

    #[test]
    fn show_steps_defaults_on() {
        let input: MathProblemInput =
            serde_json::from_value(json!({ "problem": "1 + 1" })).unwrap();
        assert!(input.show_steps);
    }
}
