//! Cross-level correspondence resolution.
//!
//! Given vertex ids at one level, walk level by level toward a target level,
//! following predecessor lists (toward finer levels) or successor lists
//! (toward coarser ones), and return the ids reached at the target.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::artifact::VertexId;
use super::error::LineageError;
use super::level::{LevelCodec, LevelId};
use super::store::LevelStore;

/// Which list of a [`VertexRecord`](super::artifact::VertexRecord) a
/// resolution follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
	/// Follow predecessors, toward finer levels.
	ToAncestor,
	/// Follow successors, toward coarser levels.
	ToDescendant,
}

/// A chain that broke before reaching its target. Carries the furthest
/// level reached and the ids found there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialResolution {
	/// Furthest level the walk reached.
	pub reached: LevelId,
	/// Ids held at `reached`.
	pub frontier: Vec<VertexId>,
	/// Why the next level could not be read.
	pub cause: LineageError,
}

/// Outcome of [`CorrespondenceResolver::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
	ids: Vec<VertexId>,
	partial: Option<PartialResolution>,
}

impl Resolution {
	fn complete(ids: Vec<VertexId>) -> Self {
		Self { ids, partial: None }
	}

	fn broken(reached: LevelId, frontier: Vec<VertexId>, cause: LineageError) -> Self {
		Self {
			ids: Vec::new(),
			partial: Some(PartialResolution {
				reached,
				frontier,
				cause,
			}),
		}
	}

	/// Ids at the target level. Empty when the chain broke or nothing
	/// corresponds.
	pub fn ids(&self) -> &[VertexId] {
		&self.ids
	}

	/// Where and why the chain broke, if it did.
	pub fn partial(&self) -> Option<&PartialResolution> {
		self.partial.as_ref()
	}

	/// Whether the walk reached its target.
	pub fn is_complete(&self) -> bool {
		self.partial.is_none()
	}
}

/// Resolves vertex sets between levels through a [`LevelStore`].
pub struct CorrespondenceResolver<'a, S: LevelStore + ?Sized> {
	store: &'a S,
	codec: &'a LevelCodec,
}

impl<'a, S: LevelStore + ?Sized> CorrespondenceResolver<'a, S> {
	/// Resolver reading levels from `store`, walking as `codec` steps.
	pub fn new(store: &'a S, codec: &'a LevelCodec) -> Self {
		Self { store, codec }
	}

	/// Ids at `target` corresponding to `ids` at `start`.
	///
	/// Never fails: a missing level between `start` and `target`, or a
	/// missing `target`, yields an empty result carrying a
	/// [`PartialResolution`]. The walk takes exactly
	/// [`LevelId::distance`] steps.
	pub fn resolve(
		&self,
		start: LevelId,
		ids: &[VertexId],
		target: LevelId,
		direction: Direction,
	) -> Resolution {
		if start == target {
			return Resolution::complete(ids.to_vec());
		}
		let mut frontier: BTreeSet<VertexId> = ids.iter().copied().collect();
		if !self.store.has_level(target) {
			warn!("cannot resolve toward level {target}: no artifact");
			return Resolution::broken(
				start,
				frontier.into_iter().collect(),
				LineageError::LevelNotFound(target),
			);
		}

		debug!(
			"{direction:?} {start} -> {target} via {:?}",
			self.codec.path(start, target)
		);
		let mut current = start;
		for _ in 0..start.distance(&target) {
			if current == target || frontier.is_empty() {
				break;
			}
			let artifact = match self.store.load_level(current) {
				Ok(artifact) => artifact,
				Err(cause) => {
					warn!("resolution {start} -> {target} broke at {current}: {cause}");
					return Resolution::broken(current, frontier.into_iter().collect(), cause);
				}
			};

			let mut next = BTreeSet::new();
			for &id in &frontier {
				let Some(record) = artifact.vertex(id) else {
					debug!("level {current} has no vertex {id}, skipping");
					continue;
				};
				let links = match direction {
					Direction::ToAncestor => &record.predecessors,
					Direction::ToDescendant => &record.successors,
				};
				next.extend(links.iter().copied());
			}

			let step = self.codec.step_toward(current, target);
			debug!(
				"{direction:?} {current} -> {step}: {} ids -> {}",
				frontier.len(),
				next.len()
			);
			current = step;
			frontier = next;
		}

		Resolution::complete(frontier.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lineage::artifact::{LevelArtifact, RenderedLayers, VertexRecord};
	use crate::lineage::level::StepPolicy;
	use crate::lineage::store::MemoryLevelStore;

	// {0,0}: A = 0, 1; B = 2, 3. {0,1}: set B merged into vertex 0.
	fn merged_b() -> MemoryLevelStore {
		let mut store = MemoryLevelStore::new();
		store.insert_level(LevelArtifact::new(
			LevelId::BASE,
			(2, 2),
			RenderedLayers::BOTH,
			vec![
				VertexRecord::new(0),
				VertexRecord::new(1),
				VertexRecord::new(2).with_successors([0]),
				VertexRecord::new(3).with_successors([0]),
			],
			vec![(0, 2), (1, 3)],
		));
		store.insert_level(LevelArtifact::new(
			LevelId::new(0, 1),
			(0, 1),
			RenderedLayers { a: false, b: true },
			vec![VertexRecord::new(0).with_predecessors([2, 3])],
			Vec::new(),
		));
		store
	}

	fn codec() -> LevelCodec {
		LevelCodec::new("g", "", StepPolicy::Balanced)
	}

	#[test]
	fn resolves_the_merged_pair_both_ways() {
		let store = merged_b();
		let codec = codec();
		let resolver = CorrespondenceResolver::new(&store, &codec);

		let up = resolver.resolve(LevelId::new(0, 1), &[0], LevelId::BASE, Direction::ToAncestor);
		assert!(up.is_complete());
		assert_eq!(up.ids(), &[2, 3]);

		let down = resolver.resolve(
			LevelId::BASE,
			&[2, 3],
			LevelId::new(0, 1),
			Direction::ToDescendant,
		);
		assert_eq!(down.ids(), &[0]);
	}

	#[test]
	fn same_level_returns_ids_unchanged() {
		let store = MemoryLevelStore::new();
		let codec = codec();
		let resolver = CorrespondenceResolver::new(&store, &codec);
		let res = resolver.resolve(LevelId::new(3, 3), &[5, 1], LevelId::new(3, 3), Direction::ToAncestor);
		assert!(res.is_complete());
		assert_eq!(res.ids(), &[5, 1]);
	}

	#[test]
	fn unknown_vertices_are_skipped() {
		let store = merged_b();
		let codec = codec();
		let resolver = CorrespondenceResolver::new(&store, &codec);
		let res = resolver.resolve(LevelId::BASE, &[2, 42], LevelId::new(0, 1), Direction::ToDescendant);
		assert!(res.is_complete());
		assert_eq!(res.ids(), &[0]);
	}

	#[test]
	fn vertex_without_correspondence_resolves_to_empty() {
		let store = merged_b();
		let codec = codec();
		let resolver = CorrespondenceResolver::new(&store, &codec);
		let res = resolver.resolve(LevelId::BASE, &[0], LevelId::new(0, 1), Direction::ToDescendant);
		assert!(res.is_complete());
		assert!(res.ids().is_empty());
	}

	#[test]
	fn missing_target_is_partial_and_empty() {
		let store = merged_b();
		let codec = codec();
		let resolver = CorrespondenceResolver::new(&store, &codec);
		let res = resolver.resolve(LevelId::BASE, &[2], LevelId::new(4, 4), Direction::ToDescendant);
		assert!(res.ids().is_empty());
		let partial = res.partial().unwrap();
		assert_eq!(partial.cause, LineageError::LevelNotFound(LevelId::new(4, 4)));
		assert_eq!(partial.frontier, vec![2]);
	}

	#[test]
	fn broken_chain_reports_best_partial_result() {
		let mut store = merged_b();
		store.insert_level(LevelArtifact::new(
			LevelId::new(0, 1),
			(0, 1),
			RenderedLayers { a: false, b: true },
			vec![VertexRecord::new(0).with_predecessors([2, 3]).with_successors([0])],
			Vec::new(),
		));
		store.insert_level(LevelArtifact::new(
			LevelId::new(0, 3),
			(0, 1),
			RenderedLayers { a: false, b: true },
			vec![VertexRecord::new(0)],
			Vec::new(),
		));
		let codec = codec();
		let resolver = CorrespondenceResolver::new(&store, &codec);
		let res = resolver.resolve(LevelId::BASE, &[2, 3], LevelId::new(0, 3), Direction::ToDescendant);
		assert!(res.ids().is_empty());
		let partial = res.partial().unwrap();
		assert_eq!(partial.reached, LevelId::new(0, 2));
		assert_eq!(partial.cause, LineageError::LevelNotFound(LevelId::new(0, 2)));
		assert_eq!(partial.frontier, vec![0]);
	}
}
