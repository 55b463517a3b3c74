//! The interactive highlight session.
//!
//! Activating a vertex walks the hierarchy outward from the clicked level,
//! one known level at a time in both directions, highlights every
//! corresponding vertex that is drawn, and connects consecutive hops with
//! auxiliary edges. Activating the same vertex again reverts every colour
//! change and removes every edge the session created; activating another
//! vertex reverts first, so at most one lineage is shown at a time.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};

use super::artifact::VertexId;
use super::config::{Color, LineageConfig, Palette};
use super::context::{LineageContext, MeshId, VertexPosition};
use super::error::LineageError;
use super::level::LevelId;
use super::resolver::Direction;
use super::store::LevelStore;

/// Opaque handle a surface returns for an added edge.
pub type EdgeHandle = usize;

/// Side-effecting drawing target of a session.
pub trait RenderingSurface {
	/// Colours a drawn vertex.
	fn highlight(&mut self, mesh: MeshId, render_index: usize, color: Color)
	-> Result<(), LineageError>;

	/// Resets a highlighted vertex to `restore`.
	fn unhighlight(
		&mut self,
		mesh: MeshId,
		render_index: usize,
		restore: Color,
	) -> Result<(), LineageError>;

	/// Draws an auxiliary edge between two drawn vertices under `name`.
	fn add_edge(
		&mut self,
		name: &str,
		from: VertexPosition,
		to: VertexPosition,
		color: Color,
	) -> Result<EdgeHandle, LineageError>;

	/// Removes the edge added under `name`.
	fn remove_edge(&mut self, name: &str) -> Result<(), LineageError>;
}

/// Whether a lineage is shown, and for which vertex.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
	/// Nothing highlighted.
	#[default]
	Idle,
	/// The lineage of `vertex` at `level` is shown.
	Active {
		/// Clicked vertex.
		vertex: VertexId,
		/// Level it was clicked at.
		level: LevelId,
	},
}

/// Summary of one activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivationReport {
	/// Vertices currently highlighted.
	pub highlighted: usize,
	/// Auxiliary edges currently drawn.
	pub edges: usize,
	/// Finer levels reached.
	pub ancestor_hops: usize,
	/// Coarser levels reached.
	pub descendant_hops: usize,
	/// Whether a broken chain cut a walk short.
	pub partial: bool,
}

/// Result of [`HighlightSession::activate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
	/// Idle to active.
	Activated(ActivationReport),
	/// Same vertex clicked again: back to idle.
	Deactivated,
	/// Another vertex clicked: the previous lineage was reverted first.
	Switched(ActivationReport),
	/// The clicked level is not part of the hierarchy; the session is idle.
	Ignored,
}

struct Walk {
	terminal: LevelId,
	ids: Vec<VertexId>,
	hops: usize,
	broken: bool,
}

/// Toggleable highlight state owned by the interaction layer.
#[derive(Debug)]
pub struct HighlightSession {
	state: SessionState,
	tracked: Vec<VertexPosition>,
	tracked_set: HashSet<VertexPosition>,
	edge_count: usize,
	connected: HashSet<(VertexPosition, VertexPosition)>,
	palette: Palette,
	edge_prefix: String,
}

impl Default for HighlightSession {
	fn default() -> Self {
		Self::new(&LineageConfig::default())
	}
}

impl HighlightSession {
	/// Idle session using the palette and edge prefix of `config`.
	pub fn new(config: &LineageConfig) -> Self {
		Self {
			state: SessionState::Idle,
			tracked: Vec::new(),
			tracked_set: HashSet::new(),
			edge_count: 0,
			connected: HashSet::new(),
			palette: config.palette,
			edge_prefix: config.edge_prefix.clone(),
		}
	}

	/// Current state.
	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Whether a lineage is shown.
	pub fn is_active(&self) -> bool {
		matches!(self.state, SessionState::Active { .. })
	}

	/// Vertices this session highlighted, in highlight order.
	pub fn tracked(&self) -> &[VertexPosition] {
		&self.tracked
	}

	/// Auxiliary edges currently drawn.
	pub fn edge_count(&self) -> usize {
		self.edge_count
	}

	/// Deterministic name of the `n`-th auxiliary edge.
	pub fn edge_name(&self, n: usize) -> String {
		format!("{}{n}", self.edge_prefix)
	}

	/// Click entry point. Toggles off when the active vertex is clicked
	/// again, otherwise reverts any active lineage and shows the new one.
	pub fn activate<S, R>(
		&mut self,
		ctx: &mut LineageContext<S>,
		surface: &mut R,
		vertex: VertexId,
		level: LevelId,
	) -> Transition
	where
		S: LevelStore,
		R: RenderingSurface + ?Sized,
	{
		match self.state {
			SessionState::Active {
				vertex: active,
				level: active_level,
			} if active == vertex && active_level == level => {
				self.deactivate(surface);
				Transition::Deactivated
			}
			SessionState::Active { .. } => {
				self.deactivate(surface);
				self.light_up(ctx, surface, vertex, level)
					.map_or(Transition::Ignored, Transition::Switched)
			}
			SessionState::Idle => self
				.light_up(ctx, surface, vertex, level)
				.map_or(Transition::Ignored, Transition::Activated),
		}
	}

	/// Reverts every colour change and removes every auxiliary edge.
	pub fn deactivate<R: RenderingSurface + ?Sized>(&mut self, surface: &mut R) {
		self.tracked_set.clear();
		for pos in std::mem::take(&mut self.tracked) {
			let restore = self.palette.default_for(pos.mesh.primary);
			if let Err(e) = surface.unhighlight(pos.mesh, pos.render_index, restore) {
				warn!("could not reset vertex {} at {}: {e}", pos.render_index, pos.mesh.level);
			}
		}
		for n in 0..self.edge_count {
			let name = self.edge_name(n);
			if let Err(e) = surface.remove_edge(&name) {
				warn!("could not remove edge {name}: {e}");
			}
		}
		self.edge_count = 0;
		self.connected.clear();
		if self.state != SessionState::Idle {
			info!("lineage cleared");
		}
		self.state = SessionState::Idle;
	}

	fn light_up<S, R>(
		&mut self,
		ctx: &mut LineageContext<S>,
		surface: &mut R,
		vertex: VertexId,
		level: LevelId,
	) -> Option<ActivationReport>
	where
		S: LevelStore,
		R: RenderingSurface + ?Sized,
	{
		let Some(at) = ctx.hierarchy.position(level) else {
			warn!("level {level} is not part of the loaded hierarchy");
			return None;
		};
		self.state = SessionState::Active { vertex, level };

		let anchor = ctx
			.position(level, vertex)
			.filter(|&pos| self.mark(surface, pos));
		let finer: Vec<LevelId> = ctx.hierarchy.levels()[..at].iter().rev().copied().collect();
		let coarser: Vec<LevelId> = ctx.hierarchy.levels()[at + 1..].to_vec();

		let up = self.walk(ctx, surface, level, vertex, anchor, &finer, Direction::ToAncestor);
		let down = self.walk(ctx, surface, level, vertex, anchor, &coarser, Direction::ToDescendant);

		self.fan_out(ctx, surface, up.terminal, &up.ids);
		if (down.terminal, &down.ids) != (up.terminal, &up.ids) {
			self.fan_out(ctx, surface, down.terminal, &down.ids);
		}

		let report = ActivationReport {
			highlighted: self.tracked.len(),
			edges: self.edge_count,
			ancestor_hops: up.hops,
			descendant_hops: down.hops,
			partial: up.broken || down.broken,
		};
		info!(
			"lineage of vertex {vertex} at {level}: {} vertices, {} edges{}",
			report.highlighted,
			report.edges,
			if report.partial { " (partial)" } else { "" }
		);
		Some(report)
	}

	/// Follows `levels` in order from `start`, highlighting and connecting
	/// each hop. A vertex that is not drawn at a level keeps the position of
	/// its closest drawn relative, so the next drawn hop connects to that.
	#[allow(clippy::too_many_arguments)]
	fn walk<S, R>(
		&mut self,
		ctx: &mut LineageContext<S>,
		surface: &mut R,
		start: LevelId,
		vertex: VertexId,
		anchor: Option<VertexPosition>,
		levels: &[LevelId],
		direction: Direction,
	) -> Walk
	where
		S: LevelStore,
		R: RenderingSurface + ?Sized,
	{
		let mut walk = Walk {
			terminal: start,
			ids: vec![vertex],
			hops: 0,
			broken: false,
		};
		let mut frontier = BTreeMap::from([(vertex, anchor)]);

		for &next in levels {
			let mut reached: BTreeMap<VertexId, Option<VertexPosition>> = BTreeMap::new();
			for (&id, &from) in &frontier {
				let resolution = ctx.resolver().resolve(walk.terminal, &[id], next, direction);
				if let Some(partial) = resolution.partial() {
					warn!(
						"{direction:?} walk stopped at {}: {}",
						partial.reached, partial.cause
					);
					walk.broken = true;
					continue;
				}
				for &target in resolution.ids() {
					let drawn = ctx
						.position(next, target)
						.filter(|&pos| self.mark(surface, pos));
					match (from, drawn) {
						(Some(from), Some(to)) => {
							self.connect(surface, from, to);
							reached.insert(target, Some(to));
						}
						(None, Some(to)) => {
							reached.insert(target, Some(to));
						}
						(_, None) => {
							reached.entry(target).or_insert(from);
						}
					}
				}
			}

			if reached.is_empty() {
				break;
			}
			debug!("{direction:?} hop {} -> {next}: {} vertices", walk.terminal, reached.len());
			walk.terminal = next;
			walk.ids = reached.keys().copied().collect();
			walk.hops += 1;
			frontier = reached;
			if walk.broken {
				break;
			}
		}
		walk
	}

	/// Highlights same-level neighbours of the outermost vertices. No edges
	/// are drawn for them.
	fn fan_out<S, R>(
		&mut self,
		ctx: &mut LineageContext<S>,
		surface: &mut R,
		level: LevelId,
		ids: &[VertexId],
	) where
		S: LevelStore,
		R: RenderingSurface + ?Sized,
	{
		let artifact = match ctx.store.load_level(level) {
			Ok(artifact) => artifact,
			Err(e) => {
				warn!("no neighbours at {level}: {e}");
				return;
			}
		};
		for &id in ids {
			for &neighbor in artifact.neighbors(id) {
				if let Some(pos) = ctx.position(level, neighbor) {
					self.mark(surface, pos);
				}
			}
		}
	}

	/// Highlights `pos` once per session. Returns whether it is highlighted.
	fn mark<R: RenderingSurface + ?Sized>(&mut self, surface: &mut R, pos: VertexPosition) -> bool {
		if self.tracked_set.contains(&pos) {
			return true;
		}
		match surface.highlight(pos.mesh, pos.render_index, self.palette.highlight) {
			Ok(()) => {
				self.tracked.push(pos);
				self.tracked_set.insert(pos);
				true
			}
			Err(e) => {
				warn!("skipping vertex {} at {}: {e}", pos.render_index, pos.mesh.level);
				false
			}
		}
	}

	fn connect<R: RenderingSurface + ?Sized>(
		&mut self,
		surface: &mut R,
		from: VertexPosition,
		to: VertexPosition,
	) {
		if !self.connected.insert((from, to)) {
			return;
		}
		let name = self.edge_name(self.edge_count);
		match surface.add_edge(&name, from, to, self.palette.edge) {
			Ok(handle) => {
				debug!("edge {name} drawn as {handle}");
				self.edge_count += 1;
			}
			Err(e) => {
				self.connected.remove(&(from, to));
				warn!("skipping edge {name}: {e}");
			}
		}
	}
}
