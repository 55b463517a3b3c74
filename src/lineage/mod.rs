//! Cross-level lineage of a hierarchically coarsened bipartite graph.
//!
//! [`LevelCodec`] names levels and steps between them, [`LevelStore`] loads
//! their artifacts, [`CorrespondenceResolver`] maps vertex sets from one
//! level to another, [`RenderOrder`] turns vertex ids into render slots and
//! [`HighlightSession`] drives all of it from user clicks.

mod artifact;
mod config;
mod context;
mod error;
mod hierarchy;
mod level;
mod permutation;
mod resolver;
mod session;
mod store;

pub use artifact::{LevelArtifact, RenderedLayers, VertexId, VertexRecord, parse_id_list};
pub use config::{CONFIG_FILE, Color, LineageConfig, Palette};
pub use context::{LineageContext, MeshId, VertexPosition};
pub use error::LineageError;
pub use hierarchy::Hierarchy;
pub use level::{ArtifactKind, LevelCodec, LevelId, Side, StepPolicy};
pub use permutation::{PermutationTable, RenderOrder, RenderSlot};
pub use resolver::{CorrespondenceResolver, Direction, PartialResolution, Resolution};
pub use session::{
	ActivationReport, EdgeHandle, HighlightSession, RenderingSurface, SessionState, Transition,
};
pub use store::{BundleStore, LevelStore, MemoryLevelStore};
