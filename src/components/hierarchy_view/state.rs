use std::collections::{HashMap, HashSet};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use crate::lineage::{
	Color, EdgeHandle, HighlightSession, LevelId, LevelStore, LineageContext, LineageError, MeshId,
	Palette, RenderingSurface, VertexPosition,
};

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;
const BAND_GAP: f64 = 140.0;
const SLOT_SPACING: f64 = 22.0;
const MAX_LABELS: usize = 40;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub label: Option<String>,
	pub color: String,
	pub level: LevelId,
	pub render_index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A level drawn as a horizontal band.
#[derive(Clone, Debug)]
pub struct Band {
	pub level: LevelId,
	pub y: f32,
	pub primary: bool,
}

/// Cross-level edge added by a highlight session.
#[derive(Clone, Debug)]
pub struct AuxEdge {
	pub name: String,
	pub from: DefaultNodeIdx,
	pub to: DefaultNodeIdx,
	pub color: String,
}

/// Layered drawing of every level: one band per level, render slots laid
/// out left to right and relaxed by the force simulation along x only.
pub struct HierarchyViewState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<DefaultNodeIdx>,
	pub bands: Vec<Band>,
	pub aux_edges: Vec<AuxEdge>,
	pub highlighted: HashSet<DefaultNodeIdx>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	slots: HashMap<(LevelId, usize), DefaultNodeIdx>,
}

impl HierarchyViewState {
	pub fn new<S: LevelStore>(
		ctx: &mut LineageContext<S>,
		palette: &Palette,
		width: f64,
		height: f64,
	) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 120.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut slots = HashMap::new();
		let mut bands = Vec::new();
		let levels = ctx.hierarchy.levels().to_vec();
		let top = levels.len().saturating_sub(1) as f64 / 2.0;

		// Coarsest level on top.
		for (i, &level) in levels.iter().enumerate() {
			let y = ((top - i as f64) * BAND_GAP) as f32;
			let mesh = ctx.mesh(level);
			bands.push(Band {
				level,
				y,
				primary: mesh.primary,
			});
			let Some(table) = ctx.render_order.table(&ctx.store, level) else {
				continue;
			};
			let color = palette.default_for(mesh.primary).css();
			let half = table.len() as f64 / 2.0;
			for (k, &vertex) in table.slots().iter().enumerate() {
				let idx = graph.add_node(NodeData {
					x: ((k as f64 - half) * SLOT_SPACING) as f32,
					y,
					mass: 10.0,
					is_anchor: false,
					user_data: NodeInfo {
						label: (table.len() <= MAX_LABELS).then(|| vertex.to_string()),
						color: color.clone(),
						level,
						render_index: k,
					},
				});
				slots.insert((level, k), idx);
			}

			let Ok(artifact) = ctx.store.load_level(level) else {
				continue;
			};
			for &(src, tgt) in artifact.links() {
				let (Some(a), Some(b)) = (ctx.position(level, src), ctx.position(level, tgt)) else {
					continue;
				};
				if let (Some(&a), Some(&b)) = (
					slots.get(&(level, a.render_index)),
					slots.get(&(level, b.render_index)),
				) {
					graph.add_edge(a, b, EdgeData::default());
				}
			}
		}
		debug!("laid out {} levels, {} vertices", bands.len(), slots.len());

		Self {
			graph,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			bands,
			aux_edges: Vec::new(),
			highlighted: HashSet::new(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			slots,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	/// Level and render slot of the vertex under the cursor.
	pub fn slot_at_position(&self, sx: f64, sy: f64) -> Option<(LevelId, usize)> {
		let idx = self.node_at_position(sx, sy)?;
		let mut slot = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				slot = Some((node.data.user_data.level, node.data.user_data.render_index));
			}
		});
		slot
	}

	pub fn node_positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			out.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		out
	}

	pub fn has_active_highlight(&self) -> bool {
		!self.highlighted.is_empty()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;
		let bands: HashMap<LevelId, f32> = self.bands.iter().map(|b| (b.level, b.y)).collect();
		self.graph.visit_nodes_mut(|node| {
			if let Some(&y) = bands.get(&node.data.user_data.level) {
				node.data.y = y;
			}
		});
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn node(&self, mesh: MeshId, render_index: usize) -> Result<DefaultNodeIdx, LineageError> {
		self.slots
			.get(&(mesh.level, render_index))
			.copied()
			.ok_or_else(|| {
				LineageError::Surface(format!("no vertex drawn in slot {render_index} of {}", mesh.level))
			})
	}

	fn paint(&mut self, idx: DefaultNodeIdx, color: Color) {
		let css = color.css();
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.user_data.color = css.clone();
			}
		});
	}
}

impl RenderingSurface for HierarchyViewState {
	fn highlight(&mut self, mesh: MeshId, render_index: usize, color: Color) -> Result<(), LineageError> {
		let idx = self.node(mesh, render_index)?;
		self.paint(idx, color);
		self.highlighted.insert(idx);
		Ok(())
	}

	fn unhighlight(
		&mut self,
		mesh: MeshId,
		render_index: usize,
		restore: Color,
	) -> Result<(), LineageError> {
		let idx = self.node(mesh, render_index)?;
		self.paint(idx, restore);
		self.highlighted.remove(&idx);
		Ok(())
	}

	fn add_edge(
		&mut self,
		name: &str,
		from: VertexPosition,
		to: VertexPosition,
		color: Color,
	) -> Result<EdgeHandle, LineageError> {
		let (from, to) = (
			self.node(from.mesh, from.render_index)?,
			self.node(to.mesh, to.render_index)?,
		);
		self.aux_edges.push(AuxEdge {
			name: name.to_string(),
			from,
			to,
			color: color.css(),
		});
		Ok(self.aux_edges.len() - 1)
	}

	fn remove_edge(&mut self, name: &str) -> Result<(), LineageError> {
		let pos = self
			.aux_edges
			.iter()
			.position(|e| e.name == name)
			.ok_or_else(|| LineageError::Surface(format!("no edge named {name}")))?;
		self.aux_edges.remove(pos);
		Ok(())
	}
}

/// Everything the canvas owns for one loaded hierarchy.
pub struct Viewer<S> {
	pub ctx: LineageContext<S>,
	pub session: HighlightSession,
	pub state: HierarchyViewState,
}
