//! Generated image records and generation requests.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Output dimensions accepted by the generation backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    Square256,
    #[serde(rename = "512x512")]
    Square512,
    #[default]
    #[serde(rename = "1024x1024")]
    Square1024,
    #[serde(rename = "1024x1792")]
    Portrait,
    #[serde(rename = "1792x1024")]
    Landscape,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square256 => "256x256",
            Self::Square512 => "512x512",
            Self::Square1024 => "1024x1024",
            Self::Portrait => "1024x1792",
            Self::Landscape => "1792x1024",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    Standard,
    Hd,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Hd => "hd",
        }
    }
}

/// Image row from the record store. Never mutated by this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRecord {
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    pub prompt: String,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default)]
    pub quality: ImageQuality,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ImageRecord {
    pub fn prompt_field(&self) -> Option<&str> {
        Some(&self.prompt)
    }

    pub fn user_id_field(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    pub fn created_at_field(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// Generation request submitted by a signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateImage {
    #[validate(length(min = 1, max = 4000, message = "prompt must be 1-4000 characters"))]
    pub prompt: String,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default)]
    pub quality: ImageQuality,
}
