use log::warn;

use crate::lineage::{CONFIG_FILE, LineageConfig};

/// Artifact files of one coarsening run, keyed by file name.
#[derive(Clone, Debug, Default)]
pub struct HierarchyData {
	/// `(file name, contents)` pairs.
	pub files: Vec<(String, String)>,
}

impl HierarchyData {
	/// Configuration shipped with the bundle, or the defaults.
	pub fn config(&self) -> LineageConfig {
		let Some((_, raw)) = self.files.iter().find(|(name, _)| name == CONFIG_FILE) else {
			return LineageConfig::default();
		};
		LineageConfig::from_json(raw).unwrap_or_else(|e| {
			warn!("ignoring {CONFIG_FILE}: {e}");
			LineageConfig::default()
		})
	}
}
