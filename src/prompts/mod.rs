use minijinja::{Environment, UndefinedBehavior};
use once_cell::sync::Lazy;
use serde::Serialize;

// NOTE:
// Templates are compiled once into a strict environment. A placeholder that
// does not resolve against the render context is an error, so optional
// inputs must be guarded with `{% if %}` in the template.

macro_rules! template_file {
    ($name:literal) => {
        (
            $name,
            include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/templates/",
                $name,
                ".jinja"
            )),
        )
    };
}

pub const GRADE_ASSIGNMENT: &str = "grade_assignment";
pub const SAT_QUESTION: &str = "sat_question";
pub const QUIZ: &str = "quiz";
pub const FLASHCARDS: &str = "flashcards";
pub const STUDY_PLAN: &str = "study_plan";
pub const SUMMARIZE_NOTES: &str = "summarize_notes";
pub const ESSAY: &str = "essay";
pub const MINDFULNESS: &str = "mindfulness";
pub const EXPLAIN_CONCEPT: &str = "explain_concept";
pub const SOLVE_MATH: &str = "solve_math";
pub const SUMMARIZE_VIDEO: &str = "summarize_video";
pub const IMAGE: &str = "image";
pub const SPEECH: &str = "speech";
pub const VIDEO: &str = "video";
pub const COURSE_OUTLINE: &str = "course_outline";

const TEMPLATES: &[(&str, &str)] = &[
    template_file!("grade_assignment"),
    template_file!("sat_question"),
    template_file!("quiz"),
    template_file!("flashcards"),
    template_file!("study_plan"),
    template_file!("summarize_notes"),
    template_file!("essay"),
    template_file!("mindfulness"),
    template_file!("explain_concept"),
    template_file!("solve_math"),
    template_file!("summarize_video"),
    template_file!("image"),
    template_file!("speech"),
    template_file!("video"),
    template_file!("course_outline"),
];

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown prompt template `{0}`")]
    Unknown(String),
    #[error("prompt template `{name}` failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

static PROMPTS: Lazy<Environment<'static>> = Lazy::new(load_environment);

fn load_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)
            .unwrap_or_else(|err| panic!("failed to compile prompt template {name}: {err}"));
    }
    env
}

pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|(name, _)| *name)
}

/// Renders a named template against a serializable context.
pub fn render(name: &str, ctx: &impl Serialize) -> Result<String, TemplateError> {
    let template = PROMPTS
        .get_template(name)
        .map_err(|_| TemplateError::Unknown(name.to_string()))?;
    let rendered = template.render(ctx).map_err(|source| TemplateError::Render {
        name: name.to_string(),
        source,
    })?;
    Ok(rendered.trim().to_string())
}
