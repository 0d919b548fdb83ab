use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Preset shown when no background has ever been chosen.
pub const DEFAULT_BACKGROUND_VALUE: &str = "background1.jpg";

/// How a background value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    /// `background_value` is the name of a bundled preset.
    Preset,
    /// `background_value` is a blob name in the blob store.
    Custom,
}

impl BackgroundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preset => "preset",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "preset" => Some(Self::Preset),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A background setting. The most recently created one is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    #[serde(rename = "_id")]
    pub id: String,
    pub background_type: BackgroundType,
    pub background_value: String,
    pub created_at: DateTime<Utc>,
}

impl Background {
    /// Blob owned by this background, if it is a custom one.
    pub fn blob_ref(&self) -> Option<&str> {
        match self.background_type {
            BackgroundType::Custom => Some(self.background_value.as_str()),
            BackgroundType::Preset => None,
        }
    }
}

/// A background setting without record identity, used for the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSetting {
    pub background_type: BackgroundType,
    pub background_value: String,
}

/// The background clients should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActiveBackground {
    Stored(Background),
    Default(BackgroundSetting),
}

impl ActiveBackground {
    /// Resolve the latest stored background, falling back to the default preset.
    pub fn from_latest(latest: Option<Background>) -> Self {
        match latest {
            Some(background) => Self::Stored(background),
            None => Self::Default(BackgroundSetting {
                background_type: BackgroundType::Preset,
                background_value: DEFAULT_BACKGROUND_VALUE.to_string(),
            }),
        }
    }
}
