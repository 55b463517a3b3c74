//! Level identities and the artifact naming scheme.
//!
//! A level is identified by two independent coarsening depths, one per vertex
//! set of the bipartite graph. [`LevelCodec`] maps identities to the names the
//! coarsening pipeline stores artifacts under, and computes the single step
//! a resolution takes when walking from one level toward another.

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use super::error::LineageError;

const COARSENED_MARKER: &str = "Coarsened";
const DEPTH_A_MARKER: &str = "nl";
const DEPTH_B_MARKER: &str = "nr";
const ARTIFACT_EXTENSIONS: &[&str] = &[".json", ".s"];

/// One of the two vertex sets of the bipartite graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
	/// First vertex set (the "left" layer).
	A,
	/// Second vertex set (the "right" layer).
	B,
}

/// Coarsening depths of both vertex sets. `{0,0}` is the original graph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId {
	/// Depth of vertex set A.
	pub depth_a: u32,
	/// Depth of vertex set B.
	pub depth_b: u32,
}

impl LevelId {
	/// The uncoarsened graph.
	pub const BASE: LevelId = LevelId {
		depth_a: 0,
		depth_b: 0,
	};

	/// Level at the given depths.
	pub const fn new(depth_a: u32, depth_b: u32) -> Self {
		Self { depth_a, depth_b }
	}

	/// Whether this is the uncoarsened graph.
	pub fn is_base(&self) -> bool {
		*self == Self::BASE
	}

	/// Number of steps a walk between the two levels takes.
	pub fn distance(&self, other: &LevelId) -> u32 {
		self.depth_a
			.abs_diff(other.depth_a)
			.max(self.depth_b.abs_diff(other.depth_b))
	}

	/// Position of the level on the coarsening chain; larger is coarser.
	pub fn coarseness(&self) -> (u32, u32) {
		(
			self.depth_a.max(self.depth_b),
			self.depth_a + self.depth_b,
		)
	}
}

impl fmt::Display for LevelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{{},{}}}", self.depth_a, self.depth_b)
	}
}

/// How [`LevelCodec::step_toward`] chooses the next level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPolicy {
	/// Mirrors the pipeline: both sets coarsen together until one reaches
	/// its final depth, then only the other one continues. Uncoarsening
	/// therefore drains the side that is further from its target first.
	#[default]
	Balanced,
	/// Every depth that differs from the target moves by one.
	Lockstep,
}

/// What an artifact file of a level holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
	/// The level document (`.json`).
	Document,
	/// The render-order permutation (`.s`).
	Permutation,
}

/// Encodes level identities to artifact tokens and walks between levels.
#[derive(Clone, Debug)]
pub struct LevelCodec {
	graph_name: String,
	reduction_tag: String,
	policy: StepPolicy,
}

impl LevelCodec {
	/// Codec for the artifacts of `graph_name` written under `reduction_tag`.
	pub fn new(
		graph_name: impl Into<String>,
		reduction_tag: impl Into<String>,
		policy: StepPolicy,
	) -> Self {
		Self {
			graph_name: graph_name.into(),
			reduction_tag: reduction_tag.into(),
			policy,
		}
	}

	/// Base name of every artifact.
	pub fn graph_name(&self) -> &str {
		&self.graph_name
	}

	/// Step policy used by [`LevelCodec::step_toward`].
	pub fn policy(&self) -> StepPolicy {
		self.policy
	}

	/// Artifact token for a level. The base level is named after the graph
	/// alone; coarsened levels carry both depths.
	pub fn encode(&self, level: LevelId) -> String {
		if level.is_base() {
			return self.graph_name.clone();
		}
		format!(
			"{}{COARSENED_MARKER}{}{DEPTH_A_MARKER}{}{DEPTH_B_MARKER}{}",
			self.graph_name, self.reduction_tag, level.depth_a, level.depth_b
		)
	}

	/// File name of the level document.
	pub fn document_name(&self, level: LevelId) -> String {
		format!("{}.json", self.encode(level))
	}

	/// File name of the level's permutation table.
	pub fn permutation_name(&self, level: LevelId) -> String {
		format!("{}.s", self.encode(level))
	}

	/// Best-effort inverse of [`encode`](Self::encode). Accepts a trailing
	/// artifact extension and any reduction tag.
	pub fn decode(&self, token: &str) -> Result<LevelId, LineageError> {
		let malformed = || LineageError::MalformedLevelToken(token.to_string());
		let stem = ARTIFACT_EXTENSIONS
			.iter()
			.find_map(|ext| token.strip_suffix(ext))
			.unwrap_or(token);

		let Some(pos) = stem.rfind(COARSENED_MARKER) else {
			return if stem == self.graph_name {
				Ok(LevelId::BASE)
			} else {
				Err(malformed())
			};
		};
		let depths = &stem[pos + COARSENED_MARKER.len()..];
		let start = depths.rfind(DEPTH_A_MARKER).ok_or_else(malformed)?;
		let (a, b) = depths[start + DEPTH_A_MARKER.len()..]
			.split_once(DEPTH_B_MARKER)
			.ok_or_else(malformed)?;
		let depth_a = a.parse::<u32>().map_err(|_| malformed())?;
		let depth_b = b.parse::<u32>().map_err(|_| malformed())?;
		Ok(LevelId::new(depth_a, depth_b))
	}

	/// Level and kind of an artifact file of this graph. Foreign files,
	/// including other graphs' artifacts, yield `None`. Any reduction tag is
	/// accepted.
	pub fn classify(&self, name: &str) -> Option<(LevelId, ArtifactKind)> {
		let kind = if name.ends_with(".json") {
			ArtifactKind::Document
		} else if name.ends_with(".s") {
			ArtifactKind::Permutation
		} else {
			return None;
		};
		if !name.starts_with(&self.graph_name) {
			return None;
		}
		self.decode(name).ok().map(|level| (level, kind))
	}

	/// The level adjacent to `current` that is one step closer to `target`.
	pub fn step_toward(&self, current: LevelId, target: LevelId) -> LevelId {
		if current == target {
			return current;
		}
		let lockstep = LevelId::new(
			approach(current.depth_a, target.depth_a),
			approach(current.depth_b, target.depth_b),
		);
		let uncoarsening =
			target.depth_a <= current.depth_a && target.depth_b <= current.depth_b;
		if self.policy == StepPolicy::Lockstep || !uncoarsening {
			return lockstep;
		}

		let (left_a, left_b) = (
			current.depth_a - target.depth_a,
			current.depth_b - target.depth_b,
		);
		match left_a.cmp(&left_b) {
			Ordering::Greater => LevelId::new(current.depth_a - 1, current.depth_b),
			Ordering::Less => LevelId::new(current.depth_a, current.depth_b - 1),
			Ordering::Equal => lockstep,
		}
	}

	/// Every level visited when walking from `start` to `target`, excluding
	/// `start` and ending with `target`.
	pub fn path(&self, start: LevelId, target: LevelId) -> Vec<LevelId> {
		let mut path = Vec::with_capacity(start.distance(&target) as usize);
		let mut current = start;
		while current != target && path.len() < start.distance(&target) as usize {
			current = self.step_toward(current, target);
			path.push(current);
		}
		path
	}
}

fn approach(from: u32, to: u32) -> u32 {
	match from.cmp(&to) {
		Ordering::Less => from + 1,
		Ordering::Greater => from - 1,
		Ordering::Equal => from,
	}
}
