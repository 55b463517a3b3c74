//! Render-order permutations.
//!
//! Levels reorder their vertices for visual clustering, so a vertex id is not
//! its position on screen. A [`PermutationTable`] holds, at position `k`, the
//! id drawn in render slot `k`. [`RenderOrder`] caches one table per level for
//! the lifetime of a loaded hierarchy.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use super::artifact::{VertexId, parse_id_list};
use super::error::LineageError;
use super::level::LevelId;
use super::store::LevelStore;

/// Bijection between render slots `[0, len)` and vertex ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationTable {
	slots: Vec<VertexId>,
	slot_of: HashMap<VertexId, usize>,
}

impl PermutationTable {
	/// Table where `slots[k]` is drawn in slot `k`. Fails when an id repeats.
	pub fn from_slots(slots: Vec<VertexId>) -> Result<Self, LineageError> {
		let mut slot_of = HashMap::with_capacity(slots.len());
		for (slot, &id) in slots.iter().enumerate() {
			if let Some(first) = slot_of.insert(id, slot) {
				return Err(LineageError::InvalidPermutation(format!(
					"vertex {id} occupies slots {first} and {slot}"
				)));
			}
		}
		Ok(Self { slots, slot_of })
	}

	/// Every vertex drawn in the slot matching its id.
	pub fn identity(len: usize) -> Self {
		Self {
			slots: (0..len).collect(),
			slot_of: (0..len).map(|i| (i, i)).collect(),
		}
	}

	/// Parses the comma-joined form written by the pipeline.
	pub fn parse(raw: &str) -> Result<Self, LineageError> {
		Self::from_slots(parse_id_list(raw))
	}

	/// Number of render slots.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether the level draws nothing.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Slot `vertex` is drawn in.
	pub fn render_index(&self, vertex: VertexId) -> Option<usize> {
		self.slot_of.get(&vertex).copied()
	}

	/// Vertex drawn in slot `index`.
	pub fn vertex_at(&self, index: usize) -> Option<VertexId> {
		self.slots.get(index).copied()
	}

	/// Vertex ids in slot order.
	pub fn slots(&self) -> &[VertexId] {
		&self.slots
	}
}

/// Outcome of a render-slot lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderSlot {
	/// Drawn in this slot.
	Rendered(usize),
	/// The vertex has no position at this level.
	NotRendered,
}

impl RenderSlot {
	/// The slot, if drawn.
	pub fn index(self) -> Option<usize> {
		match self {
			RenderSlot::Rendered(i) => Some(i),
			RenderSlot::NotRendered => None,
		}
	}
}

/// Per-level permutation cache. Missing tables are remembered too, so a
/// level without one is reported once.
#[derive(Debug, Default)]
pub struct RenderOrder {
	tables: HashMap<LevelId, Option<Rc<PermutationTable>>>,
}

impl RenderOrder {
	/// An empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Table for `level`, loading it on first use.
	pub fn table<S: LevelStore + ?Sized>(
		&mut self,
		store: &S,
		level: LevelId,
	) -> Option<Rc<PermutationTable>> {
		self.tables
			.entry(level)
			.or_insert_with(|| match store.load_permutation(level) {
				Ok(table) => {
					debug!("cached {} render slots for level {level}", table.len());
					Some(Rc::new(table))
				}
				Err(e) => {
					warn!("skipping highlights at level {level}: {e}");
					None
				}
			})
			.clone()
	}

	/// Slot of `vertex` at `level`. Vertices of an undrawn set and vertices
	/// missing from the permutation have none.
	pub fn to_render_index<S: LevelStore + ?Sized>(
		&mut self,
		store: &S,
		level: LevelId,
		vertex: VertexId,
	) -> RenderSlot {
		let rendered = match store.load_level(level) {
			Ok(artifact) => artifact.is_rendered(vertex),
			Err(e) => {
				debug!("no render slot for vertex {vertex}: {e}");
				false
			}
		};
		if !rendered {
			return RenderSlot::NotRendered;
		}
		let Some(table) = self.table(store, level) else {
			return RenderSlot::NotRendered;
		};
		match table.render_index(vertex) {
			Some(index) => RenderSlot::Rendered(index),
			None => {
				warn!("vertex {vertex} is rendered at level {level} but absent from its permutation");
				RenderSlot::NotRendered
			}
		}
	}

	/// Vertex drawn in slot `index` of `level`.
	pub fn to_vertex_id<S: LevelStore + ?Sized>(
		&mut self,
		store: &S,
		level: LevelId,
		index: usize,
	) -> Option<VertexId> {
		self.table(store, level)?.vertex_at(index)
	}

	/// Drops every cached table; called when a new hierarchy replaces the
	/// current one.
	pub fn invalidate(&mut self) {
		self.tables.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lineage::artifact::{LevelArtifact, RenderedLayers, VertexRecord};
	use crate::lineage::store::MemoryLevelStore;

	#[test]
	fn duplicate_slots_are_rejected() {
		assert!(matches!(
			PermutationTable::parse("3,1,3"),
			Err(LineageError::InvalidPermutation(_))
		));
	}

	#[test]
	fn lookups_are_mutual_inverses() {
		let table = PermutationTable::parse("2, 0, 3, 1").unwrap();
		assert_eq!(table.len(), 4);
		for k in 0..table.len() {
			let id = table.vertex_at(k).unwrap();
			assert_eq!(table.render_index(id), Some(k));
		}
		assert_eq!(table.vertex_at(4), None);
		assert_eq!(table.render_index(9), None);
	}

	fn store_with_unrendered_b() -> MemoryLevelStore {
		let level = LevelId::new(1, 1);
		let mut store = MemoryLevelStore::new();
		store.insert_level(LevelArtifact::new(
			level,
			(2, 2),
			RenderedLayers { a: true, b: false },
			(0..4).map(VertexRecord::new).collect(),
			Vec::new(),
		));
		store.insert_permutation(level, PermutationTable::from_slots(vec![1, 0]).unwrap());
		store
	}

	#[test]
	fn unrendered_side_has_no_render_slot() {
		let store = store_with_unrendered_b();
		let mut order = RenderOrder::new();
		let level = LevelId::new(1, 1);
		assert_eq!(order.to_render_index(&store, level, 0), RenderSlot::Rendered(1));
		assert_eq!(order.to_render_index(&store, level, 1), RenderSlot::Rendered(0));
		assert_eq!(order.to_render_index(&store, level, 2), RenderSlot::NotRendered);
		assert_eq!(order.to_vertex_id(&store, level, 0), Some(1));
	}

	#[test]
	fn missing_table_degrades_to_not_rendered() {
		let mut store = MemoryLevelStore::new();
		store.insert_level(LevelArtifact::new(
			LevelId::BASE,
			(1, 1),
			RenderedLayers::BOTH,
			vec![VertexRecord::new(0), VertexRecord::new(1)],
			Vec::new(),
		));
		let mut order = RenderOrder::new();
		assert_eq!(
			order.to_render_index(&store, LevelId::BASE, 0),
			RenderSlot::NotRendered
		);
		assert!(order.table(&store, LevelId::BASE).is_none());
	}

	#[test]
	fn invalidate_reloads_tables() {
		let mut store = store_with_unrendered_b();
		let mut order = RenderOrder::new();
		let level = LevelId::new(1, 1);
		assert_eq!(order.to_vertex_id(&store, level, 0), Some(1));

		store.insert_permutation(level, PermutationTable::identity(2));
		assert_eq!(order.to_vertex_id(&store, level, 0), Some(1));
		order.invalidate();
		assert_eq!(order.to_vertex_id(&store, level, 0), Some(0));
	}
}
