//! Layer-stack image editor for the design studio.
//!
//! This crate owns the editor widget end to end: the ordered stack of
//! drawable layers, the single-layer selection, the tool/gesture state
//! machine that turns pointer and keyboard events into document mutations,
//! the linear undo/redo log, and a renderer that repaints a pixel surface
//! from that state after every mutation. The host is responsible only for
//! forwarding input events and consuming the returned [`engine::Action`]s
//! and the save callback's PNG data URL.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`] and the surface-owning [`engine::Engine`] |
//! | [`doc`] | Layer types and the ordered [`doc::LayerStack`] |
//! | [`history`] | Truncating undo/redo log of rendered snapshots |
//! | [`input`] | Tools, modifiers, keys and the gesture state machine |
//! | [`hit`] | Topmost-first hit-testing against layers |
//! | [`render`] | The [`render::Surface`] trait and scene drawing |
//! | [`raster`] | Native RGBA backend for [`render::Surface`] |
//! | [`color`] | CSS colour parsing |
//! | [`geom`] | Points, affine transforms and outline paths |
//! | [`consts`] | Shared numeric constants (canvas size, minimum sizes, etc.) |
//!
//! With the `web` feature the `web` module adds a backend that draws into a
//! browser `CanvasRenderingContext2d`.

pub mod color;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod history;
pub mod input;
pub mod raster;
pub mod render;
#[cfg(feature = "web")]
pub mod web;
