//! Public entry points, one per study-content flow.
//!
//! Each module pairs an input and output contract with a prompt template and
//! exposes a single async function taking `&Studio`. Flows are independent
//! leaves; only [`course`] composes other entry points.

pub mod course;
pub mod essay;
pub mod explain;
pub mod flashcards;
pub mod grade;
pub mod image;
pub mod math;
pub mod mindfulness;
pub mod quiz;
pub mod sat;
pub mod speech;
pub mod study_plan;
pub mod summarize;
pub mod video;
pub mod video_summary;

pub use course::generate_course;
pub use essay::generate_essay;
pub use explain::explain_concept;
pub use flashcards::generate_flashcards;
pub use grade::grade_assignment;
pub use image::generate_image;
pub use math::solve_math;
pub use mindfulness::generate_mindfulness;
pub use quiz::generate_quiz;
pub use sat::generate_sat_question;
pub use speech::text_to_speech;
pub use study_plan::generate_study_plan;
pub use summarize::summarize_notes;
pub use video::generate_video;
pub use video_summary::{summarize_video, summarize_youtube};

use serde::{Deserialize, Serialize};

use crate::contract::FieldType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub(crate) fn field() -> FieldType {
        FieldType::one_of(&["easy", "medium", "hard"])
    }
}
