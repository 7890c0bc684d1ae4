//! Model selection and pricing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResearchError;

/// Model-quality selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTier {
    #[default]
    HighQuality,
    Economy,
}

impl ModelTier {
    pub const NAMES: [&'static str; 2] = ["high-quality", "economy"];

    /// Model id sent to the API.
    pub fn api_model(&self) -> &'static str {
        match self {
            ModelTier::HighQuality => "o3-deep-research",
            ModelTier::Economy => "o4-mini-deep-research",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::HighQuality => "high-quality",
            ModelTier::Economy => "economy",
        }
    }

    /// Tier for an API model id. Unknown ids (including dated snapshots of
    /// other models) are treated as high-quality.
    pub fn from_api_model(model: &str) -> Self {
        if model.starts_with("o4-mini-deep-research") {
            ModelTier::Economy
        } else {
            ModelTier::HighQuality
        }
    }

    pub fn pricing(&self) -> Pricing {
        match self {
            ModelTier::HighQuality => Pricing {
                input_per_million: 10.00,
                output_per_million: 40.00,
            },
            ModelTier::Economy => Pricing {
                input_per_million: 2.00,
                output_per_million: 8.00,
            },
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = ResearchError;

    /// Accepts tier names and the API model ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high-quality" | "high" | "o3-deep-research" => Ok(ModelTier::HighQuality),
            "economy" | "o4-mini-deep-research" => Ok(ModelTier::Economy),
            _ => Err(ResearchError::InvalidModel(s.to_string())),
        }
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Pricing {
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (output_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

/// Estimated cost in USD for a run of `model` (an API model id).
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    ModelTier::from_api_model(model)
        .pricing()
        .cost(input_tokens, output_tokens)
}
