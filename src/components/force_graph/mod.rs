//! Interactive force-directed layout for retrieval and concept graphs.

mod component;
pub mod config;
pub mod mount;
mod render;
pub mod simulation;
pub mod state;
pub mod types;

pub use component::{ConceptGraphView, RetrievalGraphView};
pub use config::LayoutConfig;
pub use mount::{GraphHandle, GraphSlot, MountError, RetrievalGraph, mount, mount_concept_tree};
pub use simulation::{Point, Simulation};
pub use state::LayoutState;
pub use types::{ClickAction, MountOptions, NavigateFn};
