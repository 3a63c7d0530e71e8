//! Viewer settings: input sensitivities, sky and light colors, window
//! size, last browsed path. Persisted as whitespace-separated text in
//! the same field order the save file has always used, so existing
//! files keep loading.

use std::fmt::Write as _;
use std::path::Path;

use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config value: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub pan_sensitivity: f32,
    pub rotate_sensitivity: f32,
    pub forward_sensitivity: f32,

    pub sky_color: [f32; 3],
    pub dir_light_ambient: [f32; 3],
    pub dir_light_diffuse: [f32; 3],
    pub dir_light_specular: [f32; 3],

    pub point_light_ambient: [f32; 3],
    pub point_light_diffuse: [f32; 3],
    pub point_light_specular: [f32; 3],
    pub point_light_linear: f32,
    pub point_light_quadratic: f32,

    pub window_width: u32,
    pub window_height: u32,

    /// Last directory the file browser showed.
    pub browse_path: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            pan_sensitivity: 1.0,
            rotate_sensitivity: 1.0,
            forward_sensitivity: 1.0,
            sky_color: [0.4, 0.4, 0.9],
            dir_light_ambient: [0.2, 0.2, 0.2],
            dir_light_diffuse: [0.5, 0.5, 0.5],
            dir_light_specular: [1.0, 1.0, 1.0],
            point_light_ambient: [0.05, 0.05, 0.05],
            point_light_diffuse: [0.8, 0.8, 0.8],
            point_light_specular: [1.0, 1.0, 1.0],
            point_light_linear: 0.09,
            point_light_quadratic: 0.032,
            window_width: 1280,
            window_height: 720,
            browse_path: String::from("."),
        }
    }
}

impl ViewerConfig {
    /// Restores every field to its default, mirroring the in-UI reset
    /// button.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Loads settings, or returns defaults when no file exists yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("no settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Self::parse(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.serialize())?;
        info!("settings saved to {}", path.display());
        Ok(())
    }

    fn serialize(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.pan_sensitivity);
        let _ = writeln!(out, "{}", self.rotate_sensitivity);
        let _ = writeln!(out, "{}", self.forward_sensitivity);
        for color in [
            self.sky_color,
            self.dir_light_ambient,
            self.dir_light_diffuse,
            self.dir_light_specular,
            self.point_light_ambient,
            self.point_light_diffuse,
            self.point_light_specular,
        ] {
            let _ = writeln!(out, "{} {} {}", color[0], color[1], color[2]);
        }
        let _ = writeln!(out, "{}", self.point_light_linear);
        let _ = writeln!(out, "{}", self.point_light_quadratic);
        // A minimized window records a 1x1 size; persist the default
        // instead so the next launch opens usable.
        let height = if self.window_height <= 1 { 720 } else { self.window_height };
        let width = if self.window_width <= 1 { 1280 } else { self.window_width };
        // Height before width, as the file has always been laid out.
        let _ = writeln!(out, "{}", height);
        let _ = writeln!(out, "{}", width);
        let _ = writeln!(out, "{}", self.browse_path);
        out
    }

    fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text.lines();
        // Everything except the browse path is numeric and
        // whitespace-separated; the path is the final line and may
        // contain spaces.
        let numeric: Vec<&str> = lines.by_ref().take(14).collect();
        let mut tokens = numeric.iter().flat_map(|l| l.split_whitespace());

        let mut next_f32 = |what: &str| -> Result<f32, ConfigError> {
            tokens
                .next()
                .ok_or_else(|| ConfigError::Parse(format!("missing {}", what)))?
                .parse()
                .map_err(|_| ConfigError::Parse(format!("bad {}", what)))
        };

        let mut config = Self::default();
        config.pan_sensitivity = next_f32("pan sensitivity")?;
        config.rotate_sensitivity = next_f32("rotate sensitivity")?;
        config.forward_sensitivity = next_f32("forward sensitivity")?;
        for c in 0..3 {
            config.sky_color[c] = next_f32("sky color")?;
        }
        for c in 0..3 {
            config.dir_light_ambient[c] = next_f32("dir light ambient")?;
        }
        for c in 0..3 {
            config.dir_light_diffuse[c] = next_f32("dir light diffuse")?;
        }
        for c in 0..3 {
            config.dir_light_specular[c] = next_f32("dir light specular")?;
        }
        for c in 0..3 {
            config.point_light_ambient[c] = next_f32("point light ambient")?;
        }
        for c in 0..3 {
            config.point_light_diffuse[c] = next_f32("point light diffuse")?;
        }
        for c in 0..3 {
            config.point_light_specular[c] = next_f32("point light specular")?;
        }
        config.point_light_linear = next_f32("light linear")?;
        config.point_light_quadratic = next_f32("light quadratic")?;

        let mut next_u32 = |what: &str| -> Result<u32, ConfigError> {
            tokens
                .next()
                .ok_or_else(|| ConfigError::Parse(format!("missing {}", what)))?
                .parse()
                .map_err(|_| ConfigError::Parse(format!("bad {}", what)))
        };
        config.window_height = next_u32("window height")?;
        config.window_width = next_u32("window width")?;

        if let Some(path) = lines.next() {
            if !path.trim().is_empty() {
                config.browse_path = path.trim().to_string();
            }
        }
        Ok(config)
    }
}
