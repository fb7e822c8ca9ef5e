use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAssignmentInput {
    pub assignment: String,
    #[serde(default)]
    pub rubric: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAssignmentOutput {
    pub score: u32,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

impl Schema for GradeAssignmentInput {
    fn contract() -> Contract {
        Contract::new("GradeAssignmentInput")
            .required("assignment", FieldType::text())
            .optional("rubric", FieldType::string())
    }
}

impl Schema for GradeAssignmentOutput {
    fn contract() -> Contract {
        Contract::new("GradeAssignmentOutput")
            .required("score", FieldType::integer(0, 100))
            .describe("overall grade out of 100")
            .required("feedback", FieldType::text())
            .required("strengths", FieldType::list(FieldType::text()))
            .required("improvements", FieldType::list(FieldType::text()))
    }
}

pub struct GradeAssignment;

impl Flow for GradeAssignment {
    const NAME: &'static str = "grade_assignment";
    const TEMPLATE: &'static str = prompts::GRADE_ASSIGNMENT;
    type Input = GradeAssignmentInput;
    type Output = GradeAssignmentOutput;
}

pub async fn grade_assignment(
    studio: &Studio,
    input: &GradeAssignmentInput,
) -> Result<GradeAssignmentOutput, FlowError> {
    invoke::<GradeAssignment>(studio, input).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{flow::FailureCause, flows::testing::studio, provider::ScriptedClient};

    fn graded(score: i64) -> serde_json::Value {
        json!({
            "score": score,
            "feedback": "Clear but brief.",
            "strengths": ["Concise"],
            "improvements": ["Add supporting detail"],
        })
    }

    #[tokio::test]
    async fn missing_rubric_uses_standard_fallback() {
        let (studio, client) = studio(ScriptedClient::new().respond_json(graded(72)));
        let input = GradeAssignmentInput {
            assignment: "The cat sat.".into(),
            rubric: None,
        };
        let out = grade_assignment(&studio, &input).await.unwrap();
        assert_eq!(out.score, 72);

        let prompt = client.last_prompt().unwrap();
        assert!(prompt.contains("standard academic rubric"));
        assert!(!prompt.contains("undefined"));
    }

    #[tokio::test]
    async fn provided_rubric_is_quoted() {
        let (studio, client) = studio(ScriptedClient::new().respond_json(graded(90)));
        let input = GradeAssignmentInput {
            assignment: "Essay text".into(),
            rubric: Some("Thesis 50%, evidence 50%".into()),
        };
        grade_assignment(&studio, &input).await.unwrap();
        let prompt = client.last_prompt().unwrap();
        assert!(prompt.contains("Thesis 50%, evidence 50%"));
        assert!(!prompt.contains("standard academic rubric"));
    }

    #[tokio::test]
    async fn score_above_hundred_is_rejected() {
        let (studio, _) = studio(ScriptedClient::new().respond_json(graded(120)));
        let input = GradeAssignmentInput {
            assignment: "Essay".into(),
            rubric: None,
        };
        let err = grade_assignment(&studio, &input).await.unwrap_err();
        assert!(matches!(err.cause, FailureCause::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn float_form_score_decodes() {
        let mut response = graded(0);
        response["score"] = json!(85.0);
        let (studio, _) = studio(ScriptedClient::new().respond_json(response));
        let input = GradeAssignmentInput {
            assignment: "Essay".into(),
            rubric: None,
        };
        let out = grade_assignment(&studio, &input).await.unwrap();
        assert_eq!(out.score, 85);
    }
}
