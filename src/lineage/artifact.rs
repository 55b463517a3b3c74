//! Level artifacts as produced by the coarsening pipeline.

use std::collections::HashMap;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::error::LineageError;
use super::level::{LevelId, Side};

/// Stable vertex id within one level.
pub type VertexId = usize;

/// One vertex of a level and its links to the adjacent levels.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexRecord {
	/// Id within the level.
	pub id: VertexId,
	/// Finer-level vertices this vertex aggregates. Empty at the base level.
	pub predecessors: Vec<VertexId>,
	/// Coarser-level vertices this vertex was merged into. Empty at the
	/// coarsest level.
	pub successors: Vec<VertexId>,
	/// Number of base vertices folded into this one. Defaults to 1.
	pub weight: f64,
}

impl VertexRecord {
	/// A unit-weight vertex with no links.
	pub fn new(id: VertexId) -> Self {
		Self {
			id,
			predecessors: Vec::new(),
			successors: Vec::new(),
			weight: 1.0,
		}
	}

	/// Replaces the finer-level links.
	pub fn with_predecessors(mut self, ids: impl IntoIterator<Item = VertexId>) -> Self {
		self.predecessors = ids.into_iter().collect();
		self
	}

	/// Replaces the coarser-level links.
	pub fn with_successors(mut self, ids: impl IntoIterator<Item = VertexId>) -> Self {
		self.successors = ids.into_iter().collect();
		self
	}
}

/// Which vertex sets were drawn at a level. A set whose depth did not change
/// from the adjacent finer level is not drawn again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RenderedLayers {
	/// Set A was drawn.
	pub a: bool,
	/// Set B was drawn.
	pub b: bool,
}

impl RenderedLayers {
	/// Both sets drawn, as at the base level.
	pub const BOTH: RenderedLayers = RenderedLayers { a: true, b: true };

	/// Whether `side` was drawn.
	pub fn contains(&self, side: Side) -> bool {
		match side {
			Side::A => self.a,
			Side::B => self.b,
		}
	}

	/// Derives the rendered sets from the depths of `level` and of the
	/// adjacent finer level, if any.
	pub fn between(finer: Option<LevelId>, level: LevelId) -> Self {
		match finer {
			Some(finer) => Self {
				a: finer.depth_a != level.depth_a,
				b: finer.depth_b != level.depth_b,
			},
			None => Self::BOTH,
		}
	}
}

/// Everything the core reads about one level.
#[derive(Clone, Debug)]
pub struct LevelArtifact {
	/// Level this artifact describes.
	pub level: LevelId,
	/// Number of vertices of set A and of set B. Ids below the first count
	/// belong to set A, the next ids to set B.
	pub layer_sizes: (usize, usize),
	/// Sets drawn at this level.
	pub rendered: RenderedLayers,
	vertices: Vec<VertexRecord>,
	links: Vec<(VertexId, VertexId)>,
	adjacency: HashMap<VertexId, Vec<VertexId>>,
}

impl LevelArtifact {
	/// Builds an artifact from parts. Vertices are sorted by id and
	/// duplicate ids keep their first record.
	pub fn new(
		level: LevelId,
		layer_sizes: (usize, usize),
		rendered: RenderedLayers,
		mut vertices: Vec<VertexRecord>,
		links: Vec<(VertexId, VertexId)>,
	) -> Self {
		vertices.sort_by_key(|v| v.id);
		vertices.dedup_by_key(|v| v.id);

		let mut adjacency: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
		for &(src, tgt) in links.iter().filter(|(src, tgt)| src != tgt) {
			adjacency.entry(src).or_default().push(tgt);
			adjacency.entry(tgt).or_default().push(src);
		}
		for list in adjacency.values_mut() {
			list.sort_unstable();
			list.dedup();
		}

		Self {
			level,
			layer_sizes,
			rendered,
			vertices,
			links,
			adjacency,
		}
	}

	/// Parses a level document. `fallback` is used when the document does
	/// not record its rendered sets.
	pub fn from_json(
		name: &str,
		level: LevelId,
		raw: &str,
		fallback: RenderedLayers,
	) -> Result<Self, LineageError> {
		let doc: LevelDocument =
			serde_json::from_str(raw).map_err(|e| LineageError::MalformedDocument {
				name: name.to_string(),
				reason: e.to_string(),
			})?;

		let mut vertices = Vec::with_capacity(doc.nodes.len());
		for (position, node) in doc.nodes.iter().enumerate() {
			let id = node.id.as_ref().and_then(as_vertex_id).unwrap_or(position);
			vertices.push(VertexRecord {
				id,
				predecessors: node.predecessor.as_ref().map(id_list).unwrap_or_default(),
				successors: node.successor.as_ref().map(id_list).unwrap_or_default(),
				weight: node.weight.unwrap_or(1.0),
			});
		}

		// Without usable set sizes the vertices are split evenly, which
		// decides the set, and so the rendering, of every vertex.
		let even = (vertices.len() / 2, vertices.len() - vertices.len() / 2);
		let layer_sizes = match doc.graph_info.as_ref().and_then(|info| info.vlayer.as_deref()) {
			Some(raw) => parse_layer_sizes(raw).unwrap_or_else(|| {
				warn!(
					"`{name}` has malformed set sizes `{raw}`, splitting {} vertices evenly",
					vertices.len()
				);
				even
			}),
			None => {
				warn!(
					"`{name}` records no set sizes, splitting {} vertices evenly",
					vertices.len()
				);
				even
			}
		};

		let links = doc
			.links
			.iter()
			.filter_map(|l| Some((as_vertex_id(&l.source)?, as_vertex_id(&l.target)?)))
			.collect();

		Ok(Self::new(
			level,
			layer_sizes,
			doc.rendered_layers.unwrap_or(fallback),
			vertices,
			links,
		))
	}

	/// Looks up a vertex by id.
	pub fn vertex(&self, id: VertexId) -> Option<&VertexRecord> {
		self.vertices
			.binary_search_by_key(&id, |v| v.id)
			.ok()
			.map(|i| &self.vertices[i])
	}

	/// All vertices, ordered by id.
	pub fn vertices(&self) -> &[VertexRecord] {
		&self.vertices
	}

	/// Same-level links as recorded in the document.
	pub fn links(&self) -> &[(VertexId, VertexId)] {
		&self.links
	}

	/// Set `id` belongs to, or `None` past the last vertex.
	pub fn side_of(&self, id: VertexId) -> Option<Side> {
		let (a, b) = self.layer_sizes;
		if id < a {
			Some(Side::A)
		} else if id < a + b {
			Some(Side::B)
		} else {
			None
		}
	}

	/// Whether the vertex's set was drawn at this level.
	pub fn is_rendered(&self, id: VertexId) -> bool {
		self.side_of(id)
			.is_some_and(|side| self.rendered.contains(side))
	}

	/// Same-level graph neighbours, sorted and without duplicates.
	pub fn neighbors(&self, id: VertexId) -> &[VertexId] {
		self.adjacency.get(&id).map_or(&[], Vec::as_slice)
	}
}

/// Parses a comma-joined id list. Malformed entries are dropped.
pub fn parse_id_list(raw: &str) -> Vec<VertexId> {
	raw.split(',')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.filter_map(|entry| match entry.parse::<VertexId>() {
			Ok(id) => Some(id),
			Err(_) => {
				warn!("dropping malformed vertex id `{entry}`");
				None
			}
		})
		.collect()
}

fn parse_layer_sizes(raw: &str) -> Option<(usize, usize)> {
	let mut parts = raw.split_whitespace().map(str::parse::<usize>);
	match (parts.next(), parts.next()) {
		(Some(Ok(a)), Some(Ok(b))) => Some((a, b)),
		_ => None,
	}
}

fn as_vertex_id(value: &Value) -> Option<VertexId> {
	match value {
		Value::Number(n) => n.as_u64().and_then(|n| VertexId::try_from(n).ok()),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn id_list(value: &Value) -> Vec<VertexId> {
	match value {
		Value::String(raw) => parse_id_list(raw),
		Value::Array(items) => items
			.iter()
			.filter_map(|item| {
				let id = as_vertex_id(item);
				if id.is_none() {
					warn!("dropping malformed vertex id `{item}`");
				}
				id
			})
			.collect(),
		Value::Null => Vec::new(),
		other => as_vertex_id(other).into_iter().collect(),
	}
}

#[derive(Deserialize)]
struct LevelDocument {
	#[serde(rename = "graphInfo", default)]
	graph_info: Option<GraphInfo>,
	nodes: Vec<NodeEntry>,
	#[serde(default)]
	links: Vec<LinkEntry>,
	#[serde(rename = "renderedLayers", default)]
	rendered_layers: Option<RenderedLayers>,
}

#[derive(Deserialize)]
struct GraphInfo {
	#[serde(default)]
	vlayer: Option<String>,
}

#[derive(Deserialize)]
struct NodeEntry {
	#[serde(default)]
	id: Option<Value>,
	#[serde(default)]
	predecessor: Option<Value>,
	#[serde(default)]
	successor: Option<Value>,
	#[serde(default)]
	weight: Option<f64>,
}

#[derive(Deserialize)]
struct LinkEntry {
	source: Value,
	target: Value,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn malformed_entries_are_dropped_not_fatal() {
		assert_eq!(parse_id_list("3, 1,x,,7"), vec![3, 1, 7]);
		assert!(parse_id_list("").is_empty());
	}

	#[test]
	fn document_accepts_string_and_array_lists() {
		let raw = r#"{
			"graphInfo": {"vlayer": "2 1"},
			"nodes": [
				{"id": 0, "predecessor": "0,1", "successor": "0"},
				{"id": 1, "predecessor": [2, "3", null], "weight": 2.5},
				{"id": "2", "successor": ""}
			],
			"links": [{"source": 0, "target": 2}, {"source": "1", "target": 2}]
		}"#;
		let art = LevelArtifact::from_json("g", LevelId::new(1, 1), raw, RenderedLayers::BOTH)
			.unwrap();
		assert_eq!(art.layer_sizes, (2, 1));
		assert_eq!(art.vertex(0).unwrap().predecessors, vec![0, 1]);
		assert_eq!(art.vertex(1).unwrap().predecessors, vec![2, 3]);
		assert_eq!(art.vertex(1).unwrap().weight, 2.5);
		assert!(art.vertex(2).unwrap().successors.is_empty());
		assert_eq!(art.neighbors(2), &[0, 1]);
		assert!(art.neighbors(9).is_empty());
		assert_eq!(art.side_of(1), Some(Side::A));
		assert_eq!(art.side_of(2), Some(Side::B));
		assert_eq!(art.side_of(3), None);
	}

	#[test]
	fn recorded_rendered_layers_override_the_fallback() {
		let raw = r#"{"nodes": [{}, {}], "renderedLayers": {"a": false, "b": true}}"#;
		let art = LevelArtifact::from_json("g", LevelId::new(0, 1), raw, RenderedLayers::BOTH)
			.unwrap();
		assert_eq!(art.layer_sizes, (1, 1));
		assert!(!art.is_rendered(0));
		assert!(art.is_rendered(1));
	}

	#[test]
	fn malformed_set_sizes_fall_back_to_an_even_split() {
		let raw = r#"{"graphInfo": {"vlayer": "2 x"}, "nodes": [{}, {}, {}]}"#;
		let art = LevelArtifact::from_json("g", LevelId::BASE, raw, RenderedLayers::BOTH).unwrap();
		assert_eq!(art.layer_sizes, (1, 2));
	}

	#[test]
	fn neighbours_ignore_self_loops_and_repeated_links() {
		let art = LevelArtifact::new(
			LevelId::BASE,
			(2, 2),
			RenderedLayers::BOTH,
			(0..4).map(VertexRecord::new).collect(),
			vec![(0, 2), (2, 0), (0, 3), (1, 1), (0, 2)],
		);
		assert_eq!(art.neighbors(0), &[2, 3]);
		assert_eq!(art.neighbors(2), &[0]);
		assert!(art.neighbors(1).is_empty());
	}

	#[test]
	fn ids_outside_the_platform_range_are_dropped() {
		assert_eq!(as_vertex_id(&Value::from(7u64)), Some(7));
		assert_eq!(
			as_vertex_id(&Value::from(u64::MAX)),
			VertexId::try_from(u64::MAX).ok()
		);
		assert_eq!(as_vertex_id(&Value::from(-1i64)), None);
		assert_eq!(as_vertex_id(&Value::from(1.5)), None);
	}

	#[test]
	fn unparsable_document_reports_its_name() {
		let err = LevelArtifact::from_json("broken.json", LevelId::BASE, "{", RenderedLayers::BOTH)
			.unwrap_err();
		assert!(matches!(err, LineageError::MalformedDocument { ref name, .. } if name == "broken.json"));
	}

	#[test]
	fn rendered_layers_follow_depth_changes() {
		assert_eq!(RenderedLayers::between(None, LevelId::BASE), RenderedLayers::BOTH);
		assert_eq!(
			RenderedLayers::between(Some(LevelId::new(2, 2)), LevelId::new(3, 2)),
			RenderedLayers { a: true, b: false }
		);
	}
}
