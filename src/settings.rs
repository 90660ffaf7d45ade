use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::{max_sprites_per_buffer, DEFAULT_MAX_BATCH_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    #[serde(default = "RenderSettings::default_clear_color")]
    pub clear_color: [f64; 4],
    #[serde(default = "RenderSettings::default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            present_mode: PresentModeSetting::default(),
            clear_color: Self::default_clear_color(),
            max_batch_size: Self::default_max_batch_size(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.max_batch_size == 0 {
            warn!("Batch size must be greater than zero. Using default value.");
            self.max_batch_size = Self::default_max_batch_size();
        }

        let limit = Self::batch_size_limit();
        if self.max_batch_size > limit {
            warn!(
                "Batch size {} exceeds the GPU buffer limit. Clamping to {}.",
                self.max_batch_size, limit
            );
            self.max_batch_size = limit;
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            warn!("Clear color components must be within [0, 1]. Clamping.");
            for c in &mut self.clear_color {
                *c = if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
            }
        }

        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }

    const fn default_clear_color() -> [f64; 4] {
        [0.08, 0.08, 0.1, 1.0]
    }

    const fn default_max_batch_size() -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Largest batch the default device limits can hold.
    pub fn batch_size_limit() -> usize {
        max_sprites_per_buffer(wgpu::Limits::default().max_buffer_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    #[default]
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(&self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let invalid = RenderSettings {
            resolution: Resolution {
                width: 0,
                height: 0,
            },
            present_mode: PresentModeSetting::Immediate,
            clear_color: [2.0, -1.0, 0.5, f64::NAN],
            max_batch_size: 0,
        };

        let validated = invalid.validate();

        assert_eq!(validated.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(validated.resolution.width, Resolution::default().width);
        assert_eq!(validated.resolution.height, Resolution::default().height);
        assert_eq!(validated.clear_color, [1.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = RenderSettings {
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            present_mode: PresentModeSetting::Mailbox,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            max_batch_size: 250,
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.max_batch_size, 250);
        assert_eq!(validated.resolution.width, valid.resolution.width);
        assert_eq!(validated.clear_color, valid.clear_color);
    }

    #[test]
    fn oversized_batches_are_clamped_to_the_buffer_limit() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{ "max_batch_size": 2000000 }"#).unwrap();

        let validated = settings.validate();

        let limit = RenderSettings::batch_size_limit();
        assert_eq!(validated.max_batch_size, limit);
        assert!(limit >= DEFAULT_MAX_BATCH_SIZE);
        assert!(limit < 2_000_000);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{ "max_batch_size": 64 }"#).unwrap();
        assert_eq!(settings.max_batch_size, 64);
        assert_eq!(settings.resolution.width, 1280);
        assert!(matches!(settings.present_mode, PresentModeSetting::Fifo));
    }

    #[test]
    fn present_mode_falls_back_to_fifo_when_desired_missing() {
        let settings = RenderSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..RenderSettings::default()
        };

        let available = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];

        assert_eq!(settings.present_mode(&available), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn present_mode_uses_first_available_when_fifo_missing() {
        let settings = RenderSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..RenderSettings::default()
        };

        let available = [wgpu::PresentMode::Immediate];

        assert_eq!(
            settings.present_mode(&available),
            wgpu::PresentMode::Immediate
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = RenderSettings::load_from_path("definitely/not/here/settings.json");
        assert_eq!(settings.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
    }
}
