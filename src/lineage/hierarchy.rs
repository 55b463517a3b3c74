//! The ordered set of levels a coarsening run produced.

use super::artifact::RenderedLayers;
use super::level::LevelId;

/// Known levels, ordered from the base graph to the most coarsened one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hierarchy {
	levels: Vec<LevelId>,
}

impl Hierarchy {
	/// Sorts by coarseness and drops duplicate levels.
	pub fn new(levels: impl IntoIterator<Item = LevelId>) -> Self {
		let mut levels: Vec<LevelId> = levels.into_iter().collect();
		levels.sort_by_key(|l| (l.coarseness(), *l));
		levels.dedup();
		Self { levels }
	}

	/// Levels from the base to the most coarsened.
	pub fn levels(&self) -> &[LevelId] {
		&self.levels
	}

	/// Number of known levels.
	pub fn len(&self) -> usize {
		self.levels.len()
	}

	/// Whether no level is known.
	pub fn is_empty(&self) -> bool {
		self.levels.is_empty()
	}

	/// Whether `level` is known.
	pub fn contains(&self, level: LevelId) -> bool {
		self.position(level).is_some()
	}

	/// Index of `level` in [`Hierarchy::levels`].
	pub fn position(&self, level: LevelId) -> Option<usize> {
		self.levels.iter().position(|&l| l == level)
	}

	/// Adjacent finer level.
	pub fn finer(&self, level: LevelId) -> Option<LevelId> {
		let pos = self.position(level)?;
		pos.checked_sub(1).map(|p| self.levels[p])
	}

	/// Adjacent coarser level.
	pub fn coarser(&self, level: LevelId) -> Option<LevelId> {
		let pos = self.position(level)?;
		self.levels.get(pos + 1).copied()
	}

	/// Last level, or `None` when empty.
	pub fn most_coarsened(&self) -> Option<LevelId> {
		self.levels.last().copied()
	}

	/// Sets drawn at `level`: those whose depth changed since the adjacent
	/// finer level.
	pub fn rendered_layers(&self, level: LevelId) -> RenderedLayers {
		RenderedLayers::between(self.finer(level), level)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn levels_are_ordered_from_base_to_coarsest() {
		let h = Hierarchy::new([
			LevelId::new(3, 2),
			LevelId::BASE,
			LevelId::new(2, 2),
			LevelId::new(1, 1),
			LevelId::new(2, 2),
		]);
		assert_eq!(
			h.levels(),
			&[
				LevelId::BASE,
				LevelId::new(1, 1),
				LevelId::new(2, 2),
				LevelId::new(3, 2)
			]
		);
		assert_eq!(h.most_coarsened(), Some(LevelId::new(3, 2)));
		assert_eq!(h.finer(LevelId::new(2, 2)), Some(LevelId::new(1, 1)));
		assert_eq!(h.coarser(LevelId::new(3, 2)), None);
	}

	#[test]
	fn only_changed_sides_are_rendered() {
		let h = Hierarchy::new([LevelId::BASE, LevelId::new(1, 1), LevelId::new(2, 1)]);
		assert_eq!(h.rendered_layers(LevelId::BASE), RenderedLayers::BOTH);
		assert_eq!(
			h.rendered_layers(LevelId::new(2, 1)),
			RenderedLayers { a: true, b: false }
		);
	}
}
