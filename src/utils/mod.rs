//! Utility helpers: generational allocation, logging, math extensions.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, ShapeId, SlotId};
