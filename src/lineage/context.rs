//! Everything a highlight session reads from the loaded hierarchy.

use super::artifact::VertexId;
use super::hierarchy::Hierarchy;
use super::level::{LevelCodec, LevelId};
use super::permutation::RenderOrder;
use super::resolver::CorrespondenceResolver;
use super::store::LevelStore;

/// The drawn copy of one level. Exactly one level is drawn as the primary
/// mesh; every other level is auxiliary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshId {
	/// Level drawn by this mesh.
	pub level: LevelId,
	/// Whether this is the primary mesh.
	pub primary: bool,
}

/// A vertex as drawn: its mesh and render slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexPosition {
	/// Mesh the vertex is drawn on.
	pub mesh: MeshId,
	/// Slot within the mesh.
	pub render_index: usize,
}

/// Store, naming scheme, level order and the render-order cache of the
/// current hierarchy.
pub struct LineageContext<S> {
	/// Artifact source.
	pub store: S,
	/// Naming scheme and step policy.
	pub codec: LevelCodec,
	/// Known levels, base first.
	pub hierarchy: Hierarchy,
	/// Cached permutations of the known levels.
	pub render_order: RenderOrder,
	primary: LevelId,
}

impl<S: LevelStore> LineageContext<S> {
	/// The most coarsened level becomes the primary mesh.
	pub fn new(store: S, codec: LevelCodec, hierarchy: Hierarchy) -> Self {
		let primary = hierarchy.most_coarsened().unwrap_or(LevelId::BASE);
		Self {
			store,
			codec,
			hierarchy,
			render_order: RenderOrder::new(),
			primary,
		}
	}

	/// Level drawn as the primary mesh.
	pub fn primary(&self) -> LevelId {
		self.primary
	}

	/// Mesh that draws `level`.
	pub fn mesh(&self, level: LevelId) -> MeshId {
		MeshId {
			level,
			primary: level == self.primary,
		}
	}

	/// Resolver over this context's store.
	pub fn resolver(&self) -> CorrespondenceResolver<'_, S> {
		CorrespondenceResolver::new(&self.store, &self.codec)
	}

	/// Where `vertex` is drawn at `level`, if it is drawn there at all.
	pub fn position(&mut self, level: LevelId, vertex: VertexId) -> Option<VertexPosition> {
		let render_index = self
			.render_order
			.to_render_index(&self.store, level, vertex)
			.index()?;
		Some(VertexPosition {
			mesh: self.mesh(level),
			render_index,
		})
	}

	/// Vertex drawn in `render_index` of `level`.
	pub fn vertex_at(&mut self, level: LevelId, render_index: usize) -> Option<VertexId> {
		self.render_order
			.to_vertex_id(&self.store, level, render_index)
	}

	/// Swaps in a new hierarchy and drops every cached permutation.
	pub fn replace(&mut self, store: S, codec: LevelCodec, hierarchy: Hierarchy) {
		self.primary = hierarchy.most_coarsened().unwrap_or(LevelId::BASE);
		self.store = store;
		self.codec = codec;
		self.hierarchy = hierarchy;
		self.render_order.invalidate();
	}
}
