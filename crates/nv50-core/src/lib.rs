//! # NV50 Acceleration Core
//!
//! Foundational types shared by the command ring and the acceleration
//! engine built on top of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        nv50-core                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Error     │  │   Types     │  │  Surface / Picture  │  │
//! │  │  Taxonomy   │  │ (GpuAddr,   │  │  (format, tiling,   │  │
//! │  │             │  │  Handle)    │  │   transform, rect)  │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Surfaces and pictures are read-only views onto drawables owned by the
//! caller. Nothing in this crate allocates device memory.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod format;
pub mod geom;
pub mod picture;
pub mod surface;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use format::PictFormat;
pub use geom::{Point, Rect};
pub use picture::{Filter, Picture, Repeat, Transform};
pub use surface::{Surface, Tiling};
pub use types::*;
