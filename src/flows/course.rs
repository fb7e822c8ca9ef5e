//! Composite course generation: one outline call, then one illustration per
//! chapter. Chapter images are generated concurrently and degrade one by
//! one; a missing picture never fails the course.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::image::{generate_image, ImageInput};
use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, Flow, FlowError, Generation},
    prompts, Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub topic: String,
    pub chapters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineChapter {
    pub title: String,
    pub content: String,
    pub image_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub title: String,
    pub chapters: Vec<OutlineChapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseChapter {
    pub title: String,
    pub content: String,
    /// Empty when the illustration could not be generated.
    pub image_data_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub chapters: Vec<CourseChapter>,
}

impl Course {
    pub fn missing_images(&self) -> usize {
        self.chapters
            .iter()
            .filter(|c| c.image_error.is_some())
            .count()
    }
}

impl Schema for CourseInput {
    fn contract() -> Contract {
        Contract::new("CourseInput")
            .required("topic", FieldType::text())
            .required("chapters", FieldType::integer(1, 8))
    }
}

impl Schema for OutlineChapter {
    fn contract() -> Contract {
        Contract::new("OutlineChapter")
            .required("title", FieldType::text())
            .required("content", FieldType::text())
            .required("imagePrompt", FieldType::text())
            .describe("one sentence describing an illustration")
    }
}

impl Schema for CourseOutline {
    fn contract() -> Contract {
        Contract::new("CourseOutline")
            .required("title", FieldType::text())
            .required(
                "chapters",
                FieldType::list_between(FieldType::object::<OutlineChapter>(), 1, 8),
            )
    }
}

pub struct OutlineCourse;

impl Flow for OutlineCourse {
    const NAME: &'static str = "outline_course";
    const TEMPLATE: &'static str = prompts::COURSE_OUTLINE;
    type Input = CourseInput;
    type Output = CourseOutline;
}

pub async fn outline_course(
    studio: &Studio,
    input: &CourseInput,
) -> Result<CourseOutline, FlowError> {
    invoke::<OutlineCourse>(studio, input).await
}

/// Fails only when the outline fails. Chapter order follows the outline.
pub async fn generate_course(studio: &Studio, input: &CourseInput) -> Result<Course, FlowError> {
    let outline = outline_course(studio, input).await?;

    let images = join_all(outline.chapters.iter().map(|chapter| {
        let request = ImageInput {
            prompt: chapter.image_prompt.clone(),
            style: None,
        };
        async move { generate_image(studio, &request).await }
    }))
    .await;

    let chapters: Vec<CourseChapter> = outline
        .chapters
        .into_iter()
        .zip(images)
        .map(|(chapter, image)| {
            let (image_data_uri, image_error) = match image {
                Generation::Ready(out) => (out.image_data_uri, None),
                Generation::Degraded(d) => (String::new(), Some(d.reason)),
            };
            CourseChapter {
                title: chapter.title,
                content: chapter.content,
                image_data_uri,
                image_error,
            }
        })
        .collect();

    let course = Course {
        title: outline.title,
        chapters,
    };
    info!(
        topic = input.topic.as_str(),
        chapters = course.chapters.len(),
        missing_images = course.missing_images(),
        "course generated"
    );
    Ok(course)
}
