use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    contract::{Contract, FieldType, Schema},
    flow::{degrade, invoke_media, Generation, MediaFlow, Placeholder},
    prompts,
    provider::OutputMode,
    Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    pub prompt: String,
    #[serde(default)]
    pub style: Option<String>,
}

/// `imageDataUri` is empty when generation degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOutput {
    pub image_data_uri: String,
}

impl Schema for ImageInput {
    fn contract() -> Contract {
        Contract::new("ImageInput")
            .required("prompt", FieldType::text_up_to(2_000))
            .optional("style", FieldType::string())
    }
}

impl Placeholder for ImageOutput {
    fn placeholder() -> Self {
        Self {
            image_data_uri: String::new(),
        }
    }
}

pub struct GenerateImage;

impl MediaFlow for GenerateImage {
    const NAME: &'static str = "generate_image";
    const TEMPLATE: &'static str = prompts::IMAGE;
    type Input = ImageInput;

    fn model(config: &AppConfig) -> String {
        config.image_model.clone()
    }

    fn output_mode(_input: &ImageInput, _config: &AppConfig) -> OutputMode {
        OutputMode::Image
    }
}

/// Generates one illustration. Never fails outright: provider errors and
/// empty responses come back as [`Generation::Degraded`].
pub async fn generate_image(studio: &Studio, input: &ImageInput) -> Generation<ImageOutput> {
    degrade(invoke_media::<GenerateImage>(studio, input).await).map(|media| ImageOutput {
        image_data_uri: media.to_string(),
    })
}
