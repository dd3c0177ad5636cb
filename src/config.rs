// Global configuration and constants

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::types::Rgba;

/// File names probed by [`GrowthConfig::from_default_paths`], in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["rootweave.yaml", "rootweave.yml", "rootweave.json"];

pub const DEFAULT_SURFACE_WIDTH: f32 = 1280.0;
pub const DEFAULT_SURFACE_HEIGHT: f32 = 720.0;

/// Relative weights for picking the edge a new root grows from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeights {
    pub bottom: f64,
    pub top: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            bottom: 0.7,
            top: 0.1,
            left: 0.1,
            right: 0.1,
        }
    }
}

impl EdgeWeights {
    pub fn total(&self) -> f64 {
        self.bottom + self.top + self.left + self.right
    }
}

// Configuration struct for simulation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    // Surface used by headless and snapshot hosts
    pub surface_width: f32,
    pub surface_height: f32,

    // Growth
    pub growth_speed: f32, // progress per millisecond
    pub root_depth_factor: f32,
    pub child_depth_factor: f32,

    // Branching: generation-0 parents
    pub root_spawn_threshold: f32,
    pub root_spawn_chance: f64,
    pub root_child_angle_range: f32,
    pub root_child_width_factor: f32,
    pub root_child_max_children: (u32, u32),

    // Branching: deeper parents
    pub branch_spawn_threshold: f32,
    pub branch_spawn_chance: f64,
    pub branch_child_angle_range: f32,
    pub branch_child_width_factor: f32,
    pub branch_child_max_children: (u32, u32),

    pub child_length_factor: (f32, f32),
    pub generation_ceiling: u32,

    // Roots
    pub root_length_fraction: (f32, f32), // of max(surface width, height)
    pub root_width_jitter: f32,
    pub root_max_children: (u32, u32),

    // Initial layout
    pub initial_bottom_roots: usize,
    pub initial_bottom_width: f32,
    pub initial_side_width: f32,
    pub initial_bottom_angle_jitter: f32,
    pub initial_side_angle_jitter: f32,

    // Edge seeding
    pub edge_seed_chances: Vec<f64>, // one independent check per entry, every tick
    pub max_roots: usize,
    pub edge_weights: EdgeWeights,
    pub edge_angle_jitter: f32,
    pub edge_root_width: (f32, f32),

    // Optional hard cap on the total number of branches; None keeps growing forever
    pub max_branches: Option<usize>,

    // Rendering
    pub stroke_color: Rgba,
    pub background_color: Rgba,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
            growth_speed: 0.0007,
            root_depth_factor: 1.0,
            child_depth_factor: 0.8,
            root_spawn_threshold: 0.7,
            root_spawn_chance: 0.03,
            root_child_angle_range: 0.8,
            root_child_width_factor: 0.7,
            root_child_max_children: (1, 3),
            branch_spawn_threshold: 0.75,
            branch_spawn_chance: 0.015,
            branch_child_angle_range: 0.9,
            branch_child_width_factor: 0.8,
            branch_child_max_children: (1, 2),
            child_length_factor: (0.6, 0.8),
            generation_ceiling: 10,
            root_length_fraction: (0.08, 0.18),
            root_width_jitter: 3.0,
            root_max_children: (2, 4),
            initial_bottom_roots: 3,
            initial_bottom_width: 12.0,
            initial_side_width: 10.0,
            initial_bottom_angle_jitter: 0.3,
            initial_side_angle_jitter: 0.2,
            edge_seed_chances: vec![0.008, 0.015],
            max_roots: 50,
            edge_weights: EdgeWeights::default(),
            edge_angle_jitter: 0.3,
            edge_root_width: (3.0, 8.0),
            max_branches: None,
            stroke_color: Rgba::WHITE,
            background_color: Rgba::new(0.02, 0.02, 0.03, 1.0),
        }
    }
}

impl GrowthConfig {
    /// Load a config file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let config: Self = match ext.as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Some("json") => serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        config.validate()?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try the default file names in the working directory; fall back to defaults.
    pub fn from_default_paths() -> Self {
        for candidate in DEFAULT_CONFIG_PATHS {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => return config,
                Err(e) => warn!(error = %e, "ignoring config file, using defaults"),
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.surface_width > 0.0 && self.surface_height > 0.0) {
            return Err(ConfigError::invalid(
                "surface_width/surface_height",
                "surface dimensions must be positive",
            ));
        }
        if !(self.growth_speed > 0.0 && self.growth_speed.is_finite()) {
            return Err(ConfigError::invalid("growth_speed", "must be positive"));
        }
        // Negative factors would make progress run backwards
        let factors = [
            ("root_depth_factor", self.root_depth_factor),
            ("child_depth_factor", self.child_depth_factor),
        ];
        for (field, factor) in factors {
            if !(factor >= 0.0 && factor.is_finite()) {
                return Err(ConfigError::invalid(
                    field,
                    format!("{factor} must be finite and non-negative"),
                ));
            }
        }

        let chances = [
            ("root_spawn_chance", self.root_spawn_chance),
            ("branch_spawn_chance", self.branch_spawn_chance),
        ];
        for (field, p) in chances {
            check_probability(field, p)?;
        }
        for &p in &self.edge_seed_chances {
            check_probability("edge_seed_chances", p)?;
        }

        check_int_range("root_child_max_children", self.root_child_max_children)?;
        check_int_range("branch_child_max_children", self.branch_child_max_children)?;
        check_int_range("root_max_children", self.root_max_children)?;
        check_float_range("child_length_factor", self.child_length_factor)?;
        check_float_range("root_length_fraction", self.root_length_fraction)?;
        check_float_range("edge_root_width", self.edge_root_width)?;

        let w = &self.edge_weights;
        let weights_ok = [w.bottom, w.top, w.left, w.right]
            .iter()
            .all(|v| *v >= 0.0 && v.is_finite());
        let total = w.total();
        if !weights_ok || !(total > 0.0 && total.is_finite()) {
            return Err(ConfigError::invalid(
                "edge_weights",
                "weights must be finite and non-negative with a positive sum",
            ));
        }
        Ok(())
    }
}

fn check_probability(field: &'static str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{p} is not in [0, 1]")))
    }
}

fn check_int_range(field: &'static str, (min, max): (u32, u32)) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("min {min} > max {max}")))
    }
}

fn check_float_range(field: &'static str, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    if min <= max && min >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("expected 0 <= min <= max, got ({min}, {max})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = GrowthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.edge_seed_chances, vec![0.008, 0.015]);
        assert_eq!(config.max_roots, 50);
        assert!(config.max_branches.is_none());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "growth_speed: 0.001\nmax_branches: 500").unwrap();

        let config = GrowthConfig::from_file(file.path()).unwrap();
        assert_eq!(config.growth_speed, 0.001);
        assert_eq!(config.max_branches, Some(500));
        assert_eq!(config.root_spawn_chance, 0.03);
    }

    #[test]
    fn json_is_supported() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "max_roots": 12, "edge_seed_chances": [0.5] }}"#).unwrap();

        let config = GrowthConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_roots, 12);
        assert_eq!(config.edge_seed_chances, vec![0.5]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = GrowthConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let config = GrowthConfig {
            branch_spawn_chance: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "branch_spawn_chance",
                ..
            }
        ));
    }

    #[test]
    fn negative_depth_factor_is_rejected() {
        let config = GrowthConfig {
            root_depth_factor: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "root_depth_factor",
                ..
            }
        ));

        let config = GrowthConfig {
            child_depth_factor: f32::NAN,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "child_depth_factor",
                ..
            }
        ));
    }

    #[test]
    fn negative_depth_factor_in_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "root_depth_factor: -1.0").unwrap();
        let err = GrowthConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn infinite_edge_weight_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "edge_seed_chances: [1.0]\nedge_weights:\n  bottom: .inf\n  top: 0.1\n  left: 0.1\n  right: 0.1"
        )
        .unwrap();
        let err = GrowthConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "edge_weights",
                ..
            }
        ));

        let config = GrowthConfig {
            edge_weights: EdgeWeights {
                bottom: f64::MAX,
                top: f64::MAX,
                left: 0.0,
                right: 0.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = GrowthConfig {
            root_max_children: (4, 2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
