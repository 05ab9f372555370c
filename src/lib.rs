//! Vertex buffer layout micro-benchmark harness.
//!
//! The harness renders a scene of thousands of cube instances and lets a
//! short configuration code choose how their vertex data is laid out in
//! device buffers: per-instance versus class-shared buffers, separate
//! versus combined position/normal buffers, blocked versus interleaved
//! packing, indexed versus flattened draws, and host versus shader
//! matrix composition. Every combination must draw the same scene; what
//! differs is the number of buffers, uploads and bytes it takes.
//!
//! The crate is organized bottom-up:
//!
//! - [`config`] parses configuration codes;
//! - [`geometry`] supplies the cube attribute tables;
//! - [`layout`] turns a configuration plus geometry shape into a buffer
//!   and binding plan;
//! - [`pool`] tracks buffer lifetimes and sharing;
//! - [`upload`] executes plans against a [`device::RenderDevice`];
//! - [`instance`], [`scene`], [`transform`] and [`manager`] build and
//!   drive the scene.

pub mod config;
pub mod device;
pub mod geometry;
pub mod instance;
pub mod layout;
pub mod manager;
pub mod pool;
pub mod scene;
pub mod transform;
pub mod upload;

pub use config::{
    CompositionMode, CoordWidth, DrawStyle, LayoutConfig, PackingMode, SharingMode,
    DEFAULT_CONFIG_CODE, DEFAULT_INSTANCE_COUNT,
};
pub use device::{RenderDevice, SoftwareDevice};
pub use geometry::{AttributeSet, Cube, GeometryProvider};
pub use instance::ShapeInstance;
pub use layout::{plan_layout, UploadPlan};
pub use manager::SceneManager;
pub use pool::BufferPool;
pub use scene::Scene;
