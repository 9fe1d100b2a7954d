//! Annotator - annotation editing engine
//!
//! Geometric annotations (polygons, boxes, keypoints, masks and more) over
//! images and video frames, with undoable actions, pluggable tools and
//! commands, and JSON serialization of every annotation type.

pub mod action;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod keybindings;
pub mod loader;
pub mod model;
pub mod plugin;
pub mod serializer;
pub mod tool;
pub mod video;
pub mod view;

#[cfg(test)]
mod tests;

pub use annotator_geometry as geometry;
pub use config::EngineConfig;
pub use editor::{Editor, EditorCore};
pub use error::EngineError;
pub use loader::{ImageLoader, ImageSource, LoadedImage};
pub use view::View;
