use serde::{Deserialize, Serialize};

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError},
    prompts, Studio,
};

pub const TASKS_PER_PLAN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanInput {
    pub subject: String,
    pub goal: String,
    #[serde(default)]
    pub weakest_topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyTask {
    pub title: String,
    pub description: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub focus: String,
    pub tasks: Vec<StudyTask>,
}

impl Schema for StudyPlanInput {
    fn contract() -> Contract {
        Contract::new("StudyPlanInput")
            .required("subject", FieldType::text())
            .required("goal", FieldType::text())
            .optional("weakestTopics", FieldType::list(FieldType::text()))
    }
}

impl Schema for StudyTask {
    fn contract() -> Contract {
        Contract::new("StudyTask")
            .required("title", FieldType::text())
            .required("description", FieldType::text())
            .required("minutes", FieldType::integer(5, 180))
    }
}

impl Schema for StudyPlan {
    fn contract() -> Contract {
        Contract::new("StudyPlan")
            .required("focus", FieldType::text())
            .required(
                "tasks",
                FieldType::exactly(FieldType::object::<StudyTask>(), TASKS_PER_PLAN),
            )
    }
}

pub struct GenerateStudyPlan;

impl Flow for GenerateStudyPlan {
    const NAME: &'static str = "generate_study_plan";
    const TEMPLATE: &'static str = prompts::STUDY_PLAN;
    type Input = StudyPlanInput;
    type Output = StudyPlan;
}

pub async fn generate_study_plan(
    studio: &Studio,
    input: &StudyPlanInput,
) -> Result<StudyPlan, FlowError> {
    invoke::<GenerateStudyPlan>(studio, input).await
}
