//! Simulation parameters. Everything is a plain value; files are YAML.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::deck::{TileGroup, TileType};
use crate::economy::CostCurve;
use crate::error::ConfigError;
use crate::grid::GridBounds;
use crate::runtime::TemplateHandle;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub build: BuildCosts,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub deck: DeckConfig,
    #[serde(default)]
    pub starting_template: Option<TemplateHandle>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_grid_size")]
    pub rows: u32,
    #[serde(default = "default_grid_size")]
    pub cols: u32,
    #[serde(default = "default_footprint")]
    pub width: f32,
    #[serde(default = "default_footprint")]
    pub depth: f32,
    #[serde(default)]
    pub center: Vec3,
}

fn default_grid_size() -> u32 {
    200
}

fn default_footprint() -> f32 {
    1.0
}

impl GridConfig {
    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            center: self.center,
            width: self.width,
            depth: self.depth,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_grid_size(),
            cols: default_grid_size(),
            width: default_footprint(),
            depth: default_footprint(),
            center: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildCosts {
    #[serde(default)]
    pub grass: CostCurve,
    #[serde(default)]
    pub bush: CostCurve,
    #[serde(default)]
    pub tree: CostCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub starting_currency: f64,
    /// Seconds per income tick.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f64,
    #[serde(default = "default_expansion")]
    pub expansion: CostCurve,
}

fn default_tick_interval() -> f64 {
    0.5
}

fn default_expansion() -> CostCurve {
    CostCurve::new(1.0, 5.0)
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_currency: 0.0,
            tick_interval: default_tick_interval(),
            expansion: default_expansion(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default = "default_deck_size")]
    pub size: usize,
    #[serde(default = "default_rebuild_on_start")]
    pub rebuild_on_start: bool,
    #[serde(default)]
    pub groups: Vec<TileGroup>,
}

fn default_deck_size() -> usize {
    30
}

fn default_rebuild_on_start() -> bool {
    true
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            size: default_deck_size(),
            rebuild_on_start: default_rebuild_on_start(),
            groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let curves = [
            ("build.grass", self.build.grass),
            ("build.bush", self.build.bush),
            ("build.tree", self.build.tree),
            ("economy.expansion", self.economy.expansion),
        ];
        for (name, curve) in curves {
            if !curve.starting_cost.is_finite() || curve.starting_cost < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name}.starting_cost must be a non-negative number"
                )));
            }
            if !curve.cost_multiplier.is_finite() || curve.cost_multiplier < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name}.cost_multiplier must be a non-negative number"
                )));
            }
        }

        if !self.economy.starting_currency.is_finite() || self.economy.starting_currency < 0.0 {
            return Err(ConfigError::Validation(
                "economy.starting_currency must be a non-negative number".into(),
            ));
        }
        if !self.economy.tick_interval.is_finite() {
            return Err(ConfigError::Validation(
                "economy.tick_interval must be finite".into(),
            ));
        }
        if !(self.grid.width > 0.0 && self.grid.depth > 0.0) {
            return Err(ConfigError::Validation(
                "grid footprint must have a positive width and depth".into(),
            ));
        }
        if self.deck.size == 0 {
            return Err(ConfigError::Validation(
                "deck.size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// A small meadow with one group per plantable type.
    pub fn meadow() -> Self {
        Self {
            grid: GridConfig {
                rows: 9,
                cols: 9,
                width: 18.0,
                depth: 14.0,
                center: Vec3::ZERO,
            },
            build: BuildCosts {
                grass: CostCurve::new(5.0, 1.15),
                bush: CostCurve::new(20.0, 1.25),
                tree: CostCurve::new(60.0, 1.4),
            },
            economy: EconomyConfig {
                starting_currency: 25.0,
                tick_interval: 1.0,
                expansion: default_expansion(),
            },
            deck: DeckConfig {
                size: 12,
                rebuild_on_start: true,
                groups: vec![
                    TileGroup {
                        tile_type: TileType::Field,
                        templates: vec![TemplateHandle(1), TemplateHandle(2)],
                        display_name: None,
                    },
                    TileGroup {
                        tile_type: TileType::Forest,
                        templates: vec![TemplateHandle(3)],
                        display_name: None,
                    },
                    TileGroup {
                        tile_type: TileType::Water,
                        templates: vec![TemplateHandle(4)],
                        display_name: Some("Pond".into()),
                    },
                ],
            },
            starting_template: Some(TemplateHandle(1)),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.grid.rows, 200);
        assert_eq!(config.economy.tick_interval, 0.5);
        assert_eq!(config.economy.expansion, CostCurve::new(1.0, 5.0));
        assert_eq!(config.deck.size, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let yaml = r#"
grid:
  rows: 3
  cols: 4
build:
  grass:
    starting_cost: 10
    cost_multiplier: 2
deck:
  groups:
    - tile_type: forest
      templates: [7, 8]
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!((config.grid.rows, config.grid.cols), (3, 4));
        assert_eq!(config.grid.width, 1.0);
        assert_eq!(config.build.grass, CostCurve::new(10.0, 2.0));
        assert_eq!(config.build.tree, CostCurve::FREE);
        assert_eq!(config.deck.groups[0].tile_type, TileType::Forest);
        assert_eq!(config.deck.groups[0].templates, vec![TemplateHandle(7), TemplateHandle(8)]);
    }

    #[test]
    fn negative_costs_are_rejected() {
        let yaml = "build:\n  bush:\n    starting_cost: -1\n    cost_multiplier: 1\n";
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("build.bush")));
    }

    #[test]
    fn zero_deck_size_is_rejected() {
        assert!(Config::from_yaml_str("deck:\n  size: 0\n").is_err());
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let config = Config::meadow();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meadow.yaml");
        config.to_yaml(&path).unwrap();
        let loaded = Config::from_yaml(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
