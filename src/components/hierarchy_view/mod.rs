mod component;
mod render;
mod state;
mod types;

pub use component::HierarchyCanvas;
pub use types::HierarchyData;
