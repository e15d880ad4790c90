use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::accumulator::DEFAULT_MAX_DRAW_COMMANDS;

/// Fixed capacities of the batching arena and its command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    #[serde(default = "BatchLimits::default_max_vertex_count")]
    pub max_vertex_count: usize,
    #[serde(default = "BatchLimits::default_max_index_count")]
    pub max_index_count: usize,
    #[serde(default = "BatchLimits::default_max_draw_commands")]
    pub max_draw_commands: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_vertex_count: Self::default_max_vertex_count(),
            max_index_count: Self::default_max_index_count(),
            max_draw_commands: Self::default_max_draw_commands(),
        }
    }
}

impl BatchLimits {
    const fn default_max_vertex_count() -> usize {
        65_536
    }

    // Room for 1.5 indices per vertex, enough for quads (4 vertices / 6 indices).
    const fn default_max_index_count() -> usize {
        98_304
    }

    const fn default_max_draw_commands() -> usize {
        DEFAULT_MAX_DRAW_COMMANDS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub batch: BatchLimits,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    #[serde(default = "RenderSettings::default_clear_color")]
    pub clear_color: [f64; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            batch: BatchLimits::default(),
            resolution: Resolution::default(),
            present_mode: PresentModeSetting::default(),
            clear_color: Self::default_clear_color(),
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
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }),
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

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let settings = serde_json::from_str::<RenderSettings>(contents)?;
        Ok(settings.validate())
    }

    fn validate(mut self) -> Self {
        let defaults = BatchLimits::default();

        if self.batch.max_vertex_count == 0 {
            warn!("max_vertex_count must be greater than zero. Using default value.");
            self.batch.max_vertex_count = defaults.max_vertex_count;
        }

        if self.batch.max_index_count == 0 {
            warn!("max_index_count must be greater than zero. Using default value.");
            self.batch.max_index_count = defaults.max_index_count;
        }

        if self.batch.max_draw_commands == 0 {
            warn!("max_draw_commands must be greater than zero. Using default value.");
            self.batch.max_draw_commands = defaults.max_draw_commands;
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
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

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }

    const fn default_clear_color() -> [f64; 4] {
        [0.05, 0.07, 0.10, 1.0]
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

    fn invalid_settings() -> RenderSettings {
        RenderSettings {
            batch: BatchLimits {
                max_vertex_count: 0,
                max_index_count: 0,
                max_draw_commands: 0,
            },
            resolution: Resolution {
                width: 0,
                height: 0,
            },
            present_mode: PresentModeSetting::Immediate,
            clear_color: [0.0; 4],
        }
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let validated = invalid_settings().validate();

        assert_eq!(validated.batch, BatchLimits::default());
        assert_eq!(validated.resolution.width, Resolution::default().width);
        assert_eq!(validated.resolution.height, Resolution::default().height);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = RenderSettings {
            batch: BatchLimits {
                max_vertex_count: 1024,
                max_index_count: 2048,
                max_draw_commands: 4,
            },
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            present_mode: PresentModeSetting::Mailbox,
            clear_color: [1.0, 0.0, 0.0, 1.0],
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.batch, valid.batch);
        assert_eq!(validated.resolution.width, valid.resolution.width);
        assert_eq!(validated.resolution.height, valid.resolution.height);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings = RenderSettings::from_json(r#"{ "batch": { "max_vertex_count": 4 } }"#).unwrap();

        assert_eq!(settings.batch.max_vertex_count, 4);
        assert_eq!(settings.batch.max_index_count, 98_304);
        assert_eq!(settings.batch.max_draw_commands, DEFAULT_MAX_DRAW_COMMANDS);
        assert_eq!(settings.clear_color, [0.05, 0.07, 0.10, 1.0]);
    }

    #[test]
    fn present_mode_parses_snake_case() {
        let settings = RenderSettings::from_json(r#"{ "present_mode": "auto_no_vsync" }"#).unwrap();
        assert!(matches!(
            settings.present_mode,
            PresentModeSetting::AutoNoVsync
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = RenderSettings::load_from_path("does/not/exist/settings.json");
        assert_eq!(settings.batch, BatchLimits::default());
    }

    #[test]
    fn present_mode_falls_back_to_fifo_then_first_available() {
        let settings = RenderSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..RenderSettings::default()
        };
        use wgpu::PresentMode::*;

        let cases: [(&[wgpu::PresentMode], wgpu::PresentMode); 3] = [
            (&[Fifo, Mailbox, Immediate], Mailbox),
            (&[Fifo, Immediate], Fifo),
            (&[Immediate], Immediate),
        ];
        for (available, expected) in cases {
            assert_eq!(settings.present_mode(available), expected, "{available:?}");
        }
    }
}
