use crate::effects::policy::{InputLayout, PolicyKind};
use crate::foundation::error::{MixError, MixResult};
use crate::frame::format::VideoFormat;
use crate::mixer::sync::SyncPolicy;

/// Configuration for [`crate::MixerController`].
///
/// Only `input_count` and `output_format_hint` are required when loading from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MixerConfig {
    /// Number of input channels (at least one).
    pub input_count: usize,
    /// Preferred output pixel format and the output canvas size.
    pub output_format_hint: VideoFormat,
    /// One layout per input. Empty means every input covers the full canvas.
    #[serde(default)]
    pub layouts: Vec<InputLayout>,
    /// Premultiplied RGBA colour behind all inputs.
    #[serde(default)]
    pub background: [u8; 4],
    /// Compositing strategy.
    #[serde(default)]
    pub policy: PolicyKind,
    /// How frames from different inputs are grouped into one mix round.
    #[serde(default)]
    pub sync: SyncPolicy,
    /// Run sibling graph nodes on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl MixerConfig {
    /// Config with defaults for everything but the two required fields.
    pub fn new(input_count: usize, output_format_hint: VideoFormat) -> Self {
        Self {
            input_count,
            output_format_hint,
            layouts: Vec::new(),
            background: [0, 0, 0, 0],
            policy: PolicyKind::default(),
            sync: SyncPolicy::default(),
            parallel: false,
        }
    }

    /// Parse a JSON config and validate it.
    pub fn from_json_str(s: &str) -> MixResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| MixError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check field ranges.
    pub fn validate(&self) -> MixResult<()> {
        if self.input_count == 0 {
            return Err(MixError::invalid_format("input_count must be > 0"));
        }
        let hint = self.output_format_hint;
        VideoFormat::new(hint.width, hint.height, hint.pixel_format)?;
        if !self.layouts.is_empty() && self.layouts.len() != self.input_count {
            return Err(MixError::invalid_format(format!(
                "expected {} layouts, got {}",
                self.input_count,
                self.layouts.len()
            )));
        }
        for (i, l) in self.layouts.iter().enumerate() {
            if let Some((w, h)) = l.size
                && (w == 0 || h == 0)
            {
                return Err(MixError::invalid_format(format!(
                    "layout {i} size must be positive, got {w}x{h}"
                )));
            }
            if !l.opacity.is_finite() {
                return Err(MixError::invalid_format(format!(
                    "layout {i} opacity must be finite"
                )));
            }
        }
        Ok(())
    }

    /// Layout for every input, filling defaults when none were given.
    pub fn resolved_layouts(&self) -> Vec<InputLayout> {
        if self.layouts.is_empty() {
            vec![InputLayout::default(); self.input_count]
        } else {
            self.layouts.clone()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/config.rs"]
mod tests;
