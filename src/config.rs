use std::path::Path;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::attention::AttentionKind;
use crate::model::YoloBody;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Anchor boxes per detection scale.
    pub num_anchors: usize,
    pub num_classes: usize,
    /// `None` builds the body without any attention modules.
    #[serde(default)]
    pub attention: Option<AttentionKind>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            num_anchors: 3,
            num_classes: 80,
            attention: None,
        }
    }
}

impl ModelConfig {
    pub fn new(num_anchors: usize, num_classes: usize, attention: Option<AttentionKind>) -> Self {
        Self {
            num_anchors,
            num_classes,
            attention,
        }
    }

    /// Builds a config from the integer attention selector (0 = none, 1..=5 = variant).
    pub fn with_phi(num_anchors: usize, num_classes: usize, phi: i64) -> Result<Self> {
        Ok(Self::new(num_anchors, num_classes, AttentionKind::from_phi(phi)?))
    }

    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ModelConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_anchors == 0 {
            return Err(Error::InvalidConfig("num_anchors must be at least 1".into()));
        }
        if self.num_classes == 0 {
            return Err(Error::InvalidConfig("num_classes must be at least 1".into()));
        }
        Ok(())
    }

    /// Channels of every head output: `num_anchors * (5 + num_classes)`.
    pub fn output_channels(&self) -> usize {
        self.num_anchors * (5 + self.num_classes)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<YoloBody<B>> {
        self.validate()?;
        Ok(YoloBody::new(
            device,
            self.num_anchors,
            self.num_classes,
            self.attention,
        ))
    }
}
