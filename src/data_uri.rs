//! Inline media encoding shared by every media-bearing flow.
//!
//! Images, audio and video always cross the model boundary as
//! `data:<mimetype>;base64,<payload>` strings, never as raw bytes or remote
//! references.

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const DEFAULT_MIME: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataUriError {
    #[error("data uri must start with `data:`")]
    MissingScheme,
    #[error("data uri has no `,` separating header and payload")]
    MissingPayload,
    #[error("only base64 data uris are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    data: Vec<u8>,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn from_base64(mime_type: impl Into<String>, payload: &str) -> Result<Self, DataUriError> {
        let data = decode_payload(payload)?;
        Ok(Self::new(mime_type, data))
    }

    pub fn parse(raw: &str) -> Result<Self, DataUriError> {
        let trimmed = raw.trim();
        let rest = trimmed
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &trimmed[5..])
            .ok_or(DataUriError::MissingScheme)?;

        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

        Self::from_base64(mime, payload)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The media type without parameters, e.g. `audio/L16` for `audio/L16;rate=24000`.
    pub fn essence(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or(&self.mime_type)
            .trim()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

fn decode_payload(payload: &str) -> Result<Vec<u8>, DataUriError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| DataUriError::Decode(err.to_string()))
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl FromStr for DataUri {
    type Err = DataUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DataUri::parse(&raw).map_err(de::Error::custom)
    }
}
