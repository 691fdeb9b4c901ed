//! Core data types for maze configurations.
//!
//! This module defines the canonical [`Configuration`] and the small value types it
//! is built from. Every value of these types is kept within its domain; the
//! constructors and parsers here are the only way in.

use crate::constants;
use crate::features::FeatureSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maze generation algorithm, selected by its exact name in the fragment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Randomised Kruskal's algorithm
    Kruskal,
    /// Growing tree algorithm
    #[default]
    GrowingTree,
}

impl Algorithm {
    /// All algorithms, in the order a picker would list them.
    pub const ALL: [Algorithm; 2] = [Algorithm::Kruskal, Algorithm::GrowingTree];

    /// The name used for this algorithm in the fragment.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Kruskal => "Kruskal",
            Algorithm::GrowingTree => "GrowingTree",
        }
    }

    /// Looks up an algorithm by its exact, case-sensitive fragment name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional visual feature drawn on top of a maze.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    /// Colour cells by their distance from the entrance
    Stain,
    /// Draw the solution path
    Solve,
}

impl Feature {
    /// All features.
    pub const ALL: [Feature; 2] = [Feature::Stain, Feature::Solve];
}

/// Discriminator selecting which numeric domain and conversion rule a shape uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Square grid
    Rectilinear,
    /// Concentric rings
    Theta,
    /// Hexagonal cells
    Sigma,
}

/// The shape of a maze together with its size.
///
/// Construct through [`Shape::rectilinear`], [`Shape::theta`] or [`Shape::sigma`],
/// which clamp into the kind's domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Rectilinear maze of `(width, height)` cells
    Rectilinear(u32, u32),
    /// Circular maze with the given number of rings
    Theta(u32),
    /// Hexagonal maze with the given number of rings
    Sigma(u32),
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Rectilinear(constants::DEFAULT_MAZE_SIZE, constants::DEFAULT_MAZE_SIZE)
    }
}

/// Seed driving the external generator deterministically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Seed(pub u64);

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A six hex digit colour, stored upper-case without a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebColour(String);

impl WebColour {
    /// Parses `RRGGBB` or `#RRGGBB`, ignoring case.
    ///
    /// # Returns
    ///
    /// `None` unless the input is exactly six hex digits after the optional `#`.
    pub fn parse(input: &str) -> Option<Self> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(WebColour(digits.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// The six hex digits, without `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WebColour {
    fn default() -> Self {
        WebColour(constants::DEFAULT_COLOUR.to_string())
    }
}

impl fmt::Display for WebColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WebColour {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WebColour::parse(&value).ok_or_else(|| format!("'{value}' is not a six digit hex colour"))
    }
}

impl From<WebColour> for String {
    fn from(value: WebColour) -> Self {
        value.0
    }
}

/// A rendered maze as SVG markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Svg(pub String);

/// Returns true if `width` is usable as a stroke width.
pub fn is_valid_stroke_width(width: f64) -> bool {
    width.is_finite() && width > 0.0
}

/// The canonical, always-valid maze configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    /// Generation algorithm
    pub algorithm: Algorithm,
    /// Wall colour
    pub colour: WebColour,
    /// Enabled visual features
    pub features: FeatureSet,
    /// Generator seed
    pub seed: Seed,
    /// Shape and size
    pub shape: Shape,
    /// Wall stroke width (UI only, never encoded in the fragment)
    pub stroke_width: f64,
}

impl Configuration {
    /// Builds a configuration from the given defaults and seed.
    pub fn from_defaults(defaults: &Defaults, seed: Seed) -> Self {
        Self {
            algorithm: defaults.algorithm,
            colour: defaults.colour.clone(),
            features: defaults.features.clone(),
            seed,
            shape: defaults.shape,
            stroke_width: defaults.stroke_width,
        }
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a configuration from JSON, clamping the shape into its domain.
    ///
    /// # Arguments
    ///
    /// * `json` - JSON produced by [`Configuration::to_json`] or written by hand
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut configuration: Self = serde_json::from_str(json)?;
        configuration.shape = configuration.shape.clamped();
        if !is_valid_stroke_width(configuration.stroke_width) {
            configuration.stroke_width = constants::DEFAULT_STROKE_WIDTH;
        }
        Ok(configuration)
    }
}

/// Values used for any field the fragment does not provide.
///
/// Loaded from JSON; missing keys keep the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Defaults {
    /// Shape used when the fragment has no valid shape token
    pub shape: Shape,
    /// Algorithm used when the fragment has no valid algorithm token
    pub algorithm: Algorithm,
    /// Initial wall colour
    pub colour: WebColour,
    /// Initially enabled features
    pub features: FeatureSet,
    /// Initial stroke width
    pub stroke_width: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            algorithm: Algorithm::default(),
            colour: WebColour::default(),
            features: FeatureSet::default(),
            stroke_width: constants::DEFAULT_STROKE_WIDTH,
        }
    }
}

impl Defaults {
    /// Deserializes defaults from JSON and brings every value into domain.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let defaults: Self = serde_json::from_str(json)?;
        Ok(defaults.sanitized())
    }

    /// Clamps the shape and replaces an unusable stroke width.
    pub fn sanitized(mut self) -> Self {
        self.shape = self.shape.clamped();
        if !is_valid_stroke_width(self.stroke_width) {
            log::warn!(
                "ignoring invalid default stroke width {}; using {}",
                self.stroke_width,
                constants::DEFAULT_STROKE_WIDTH
            );
            self.stroke_width = constants::DEFAULT_STROKE_WIDTH;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_are_exact() {
        assert_eq!(Algorithm::from_name("Kruskal"), Some(Algorithm::Kruskal));
        assert_eq!(Algorithm::from_name("GrowingTree"), Some(Algorithm::GrowingTree));
        assert_eq!(Algorithm::from_name("kruskal"), None);
        assert_eq!(Algorithm::from_name(""), None);
    }

    #[test]
    fn web_colour_accepts_hash_and_lowercase() {
        assert_eq!(WebColour::parse("#ff00aa").map(|c| c.to_string()), Some("FF00AA".into()));
        assert_eq!(WebColour::parse("EEEEEE").map(|c| c.to_string()), Some("EEEEEE".into()));
        assert!(WebColour::parse("EEEEE").is_none());
        assert!(WebColour::parse("GGGGGG").is_none());
    }

    #[test]
    fn configuration_json_roundtrip_keeps_external_shape_tag() {
        let configuration = Configuration {
            algorithm: Algorithm::Kruskal,
            colour: WebColour::default(),
            features: [Feature::Solve].into_iter().collect(),
            seed: Seed(1234),
            shape: Shape::Theta(7),
            stroke_width: 8.0,
        };
        let json = configuration.to_json().unwrap();
        assert!(json.contains("\"Theta\": 7"));
        assert_eq!(Configuration::from_json(&json).unwrap(), configuration);
    }

    #[test]
    fn configuration_from_json_clamps_shape() {
        let json = r#"{
            "algorithm": "GrowingTree",
            "colour": "000000",
            "features": [],
            "seed": 1,
            "shape": {"Theta": 90},
            "stroke_width": -1.0
        }"#;
        let configuration = Configuration::from_json(json).unwrap();
        assert_eq!(configuration.shape, Shape::Theta(constants::MAX_THETA_RINGS));
        assert_eq!(configuration.stroke_width, constants::DEFAULT_STROKE_WIDTH);
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let defaults = Defaults::from_json(r#"{"algorithm": "Kruskal"}"#).unwrap();
        assert_eq!(defaults.algorithm, Algorithm::Kruskal);
        assert_eq!(defaults.shape, Shape::default());
        assert_eq!(defaults.colour, WebColour::default());
    }

    #[test]
    fn defaults_reject_bad_colour() {
        assert!(Defaults::from_json(r#"{"colour": "nope"}"#).is_err());
    }

    #[test]
    fn defaults_from_json_are_already_in_domain() {
        let defaults =
            Defaults::from_json(r#"{"shape": {"Sigma": 500}, "stroke_width": 0.0}"#).unwrap();
        assert_eq!(defaults.shape, Shape::Sigma(constants::MAX_SIGMA_RINGS));
        assert_eq!(defaults.stroke_width, constants::DEFAULT_STROKE_WIDTH);
        assert_eq!(defaults.clone().sanitized(), defaults);
    }
}
