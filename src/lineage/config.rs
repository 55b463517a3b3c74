//! Viewer configuration, deserialized from an optional `lineage.json`.

use serde::Deserialize;

use super::error::LineageError;
use super::level::{LevelCodec, StepPolicy};

/// Name of the configuration file inside an artifact bundle.
pub const CONFIG_FILE: &str = "lineage.json";

/// RGB colour, written as `#rrggbb`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
}

impl Color {
	/// Colour from its channels.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses `#rrggbb`. Shorthand forms are not accepted.
	pub fn from_hex(raw: &str) -> Option<Self> {
		let hex = raw.strip_prefix('#')?;
		if hex.len() != 6 || !hex.is_ascii() {
			return None;
		}
		let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
		Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
	}

	/// Lowercase `#rrggbb` for canvas styles.
	pub fn css(&self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl TryFrom<String> for Color {
	type Error = String;

	fn try_from(raw: String) -> Result<Self, Self::Error> {
		Self::from_hex(&raw).ok_or_else(|| format!("`{raw}` is not a #rrggbb colour"))
	}
}

/// Colours used by the highlight session. Vertices revert to a default that
/// depends on whether their mesh is the primary level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Palette {
	/// Resting colour of vertices on the primary mesh.
	pub primary_default: Color,
	/// Resting colour of vertices on every other mesh.
	pub auxiliary_default: Color,
	/// Colour of highlighted vertices.
	pub highlight: Color,
	/// Colour of auxiliary edges.
	pub edge: Color,
}

impl Palette {
	/// Resting colour for a vertex of a primary or auxiliary mesh.
	pub fn default_for(&self, primary: bool) -> Color {
		if primary {
			self.primary_default
		} else {
			self.auxiliary_default
		}
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self {
			primary_default: Color::rgb(0x1f, 0x77, 0xb4),
			auxiliary_default: Color::rgb(0x7f, 0x7f, 0x7f),
			highlight: Color::rgb(0x2c, 0xa0, 0x2c),
			edge: Color::rgb(0x2c, 0xa0, 0x2c),
		}
	}
}

/// Settings of one artifact bundle. Missing keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
	/// Base name every artifact of the hierarchy starts with.
	pub graph_name: String,
	/// Reduction tag between `Coarsened` and the depths in artifact names.
	pub reduction_tag: String,
	/// How uneven depth changes are walked.
	pub step_policy: StepPolicy,
	/// Auxiliary edges are named `<edge_prefix><n>`.
	pub edge_prefix: String,
	/// Session colours.
	pub palette: Palette,
}

impl Default for LineageConfig {
	fn default() -> Self {
		Self {
			graph_name: "graph".into(),
			reduction_tag: String::new(),
			step_policy: StepPolicy::default(),
			edge_prefix: "lineage-edge-".into(),
			palette: Palette::default(),
		}
	}
}

impl LineageConfig {
	/// Reads `lineage.json`.
	pub fn from_json(raw: &str) -> Result<Self, LineageError> {
		serde_json::from_str(raw).map_err(|e| LineageError::MalformedDocument {
			name: CONFIG_FILE.to_string(),
			reason: e.to_string(),
		})
	}

	/// Artifact naming for this bundle.
	pub fn codec(&self) -> LevelCodec {
		LevelCodec::new(&self.graph_name, &self.reduction_tag, self.step_policy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_keeps_defaults() {
		let cfg = LineageConfig::from_json(
			r##"{"graph_name": "movies", "step_policy": "lockstep",
				"palette": {"highlight": "#ff0000"}}"##,
		)
		.unwrap();
		assert_eq!(cfg.graph_name, "movies");
		assert_eq!(cfg.step_policy, StepPolicy::Lockstep);
		assert_eq!(cfg.palette.highlight, Color::rgb(255, 0, 0));
		assert_eq!(cfg.palette.edge, Palette::default().edge);
		assert_eq!(cfg.edge_prefix, "lineage-edge-");
	}

	#[test]
	fn bad_colour_is_a_config_error() {
		let err = LineageConfig::from_json(r#"{"palette": {"edge": "green"}}"#).unwrap_err();
		assert!(matches!(err, LineageError::MalformedDocument { .. }));
	}

	#[test]
	fn colours_round_trip_through_css() {
		let c = Color::from_hex("#0a1B2c").unwrap();
		assert_eq!(c, Color::rgb(10, 27, 44));
		assert_eq!(c.css(), "#0a1b2c");
		assert_eq!(Color::from_hex("0a1b2c"), None);
	}
}
