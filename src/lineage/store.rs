//! Access to the artifacts the coarsening pipeline persisted.
//!
//! The core only needs a synchronous lookup; how the artifacts get into
//! memory is up to the implementation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

use log::{debug, warn};

use super::artifact::LevelArtifact;
use super::error::LineageError;
use super::hierarchy::Hierarchy;
use super::level::{ArtifactKind, LevelCodec, LevelId};
use super::permutation::PermutationTable;

/// Blocking artifact lookup.
pub trait LevelStore {
	/// Fails with [`LineageError::LevelNotFound`] if no artifact exists.
	fn load_level(&self, level: LevelId) -> Result<Rc<LevelArtifact>, LineageError>;

	/// Fails with [`LineageError::PermutationNotFound`] if no table exists.
	fn load_permutation(&self, level: LevelId) -> Result<PermutationTable, LineageError>;

	/// Whether `level` can be loaded.
	fn has_level(&self, level: LevelId) -> bool {
		self.load_level(level).is_ok()
	}
}

/// Store holding already-built artifacts.
#[derive(Debug, Default)]
pub struct MemoryLevelStore {
	levels: HashMap<LevelId, Rc<LevelArtifact>>,
	permutations: HashMap<LevelId, PermutationTable>,
}

impl MemoryLevelStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the artifact of its level.
	pub fn insert_level(&mut self, artifact: LevelArtifact) {
		self.levels.insert(artifact.level, Rc::new(artifact));
	}

	/// Adds or replaces the table of `level`.
	pub fn insert_permutation(&mut self, level: LevelId, table: PermutationTable) {
		self.permutations.insert(level, table);
	}

	/// Forgets the artifact of `level`. Its table stays.
	pub fn remove_level(&mut self, level: LevelId) {
		self.levels.remove(&level);
	}

	/// Every stored level, base first.
	pub fn hierarchy(&self) -> Hierarchy {
		Hierarchy::new(self.levels.keys().copied())
	}
}

impl LevelStore for MemoryLevelStore {
	fn load_level(&self, level: LevelId) -> Result<Rc<LevelArtifact>, LineageError> {
		self.levels
			.get(&level)
			.cloned()
			.ok_or(LineageError::LevelNotFound(level))
	}

	fn load_permutation(&self, level: LevelId) -> Result<PermutationTable, LineageError> {
		self.permutations
			.get(&level)
			.cloned()
			.ok_or(LineageError::PermutationNotFound(level))
	}

	fn has_level(&self, level: LevelId) -> bool {
		self.levels.contains_key(&level)
	}
}

/// One raw artifact file of a bundle.
#[derive(Debug)]
struct ArtifactFile {
	name: String,
	raw: String,
}

/// Store over a bundle of raw artifact files keyed by file name, parsed
/// lazily and cached.
///
/// Files are indexed by the level their name decodes to, so a level is
/// loadable exactly when it is part of [`hierarchy`](Self::hierarchy),
/// whatever reduction tag the pipeline wrote. When two files name the same
/// level, the one spelled with the codec's own tag wins.
#[derive(Debug)]
pub struct BundleStore {
	hierarchy: Hierarchy,
	documents: HashMap<LevelId, ArtifactFile>,
	permutations: HashMap<LevelId, ArtifactFile>,
	parsed: RefCell<HashMap<LevelId, Rc<LevelArtifact>>>,
}

impl BundleStore {
	/// Indexes `files` (name, contents) by level. Foreign files are ignored.
	pub fn new(codec: LevelCodec, files: impl IntoIterator<Item = (String, String)>) -> Self {
		let mut documents = HashMap::new();
		let mut permutations = HashMap::new();
		for (name, raw) in files {
			let Some((level, kind)) = codec.classify(&name) else {
				debug!("ignoring `{name}`");
				continue;
			};
			let (index, own_name) = match kind {
				ArtifactKind::Document => (&mut documents, codec.document_name(level)),
				ArtifactKind::Permutation => (&mut permutations, codec.permutation_name(level)),
			};
			match index.entry(level) {
				Entry::Vacant(slot) => {
					slot.insert(ArtifactFile { name, raw });
				}
				Entry::Occupied(mut slot) if name == own_name => {
					warn!("`{name}` replaces `{}` for level {level}", slot.get().name);
					slot.insert(ArtifactFile { name, raw });
				}
				Entry::Occupied(slot) => {
					warn!("ignoring `{name}`, level {level} already has `{}`", slot.get().name);
				}
			}
		}

		let hierarchy = Hierarchy::new(documents.keys().copied());
		debug!(
			"bundle for `{}` holds {} levels",
			codec.graph_name(),
			hierarchy.len()
		);
		Self {
			hierarchy,
			documents,
			permutations,
			parsed: RefCell::new(HashMap::new()),
		}
	}

	/// Every level with a document in the bundle.
	pub fn hierarchy(&self) -> &Hierarchy {
		&self.hierarchy
	}
}

impl LevelStore for BundleStore {
	fn load_level(&self, level: LevelId) -> Result<Rc<LevelArtifact>, LineageError> {
		if let Some(artifact) = self.parsed.borrow().get(&level) {
			return Ok(artifact.clone());
		}
		let file = self
			.documents
			.get(&level)
			.ok_or(LineageError::LevelNotFound(level))?;
		let artifact = Rc::new(LevelArtifact::from_json(
			&file.name,
			level,
			&file.raw,
			self.hierarchy.rendered_layers(level),
		)?);
		self.parsed.borrow_mut().insert(level, artifact.clone());
		Ok(artifact)
	}

	fn load_permutation(&self, level: LevelId) -> Result<PermutationTable, LineageError> {
		let file = self
			.permutations
			.get(&level)
			.ok_or(LineageError::PermutationNotFound(level))?;
		PermutationTable::parse(&file.raw)
	}

	fn has_level(&self, level: LevelId) -> bool {
		self.documents.contains_key(&level)
	}
}
