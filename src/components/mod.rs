//! View components.

pub mod force_graph;
