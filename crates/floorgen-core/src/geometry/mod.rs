//! Minimal geometry for layout generation.
//!
//! Vectors, quaternions, rigid transforms and box bounds. All collision
//! checks in the generator are box/box, so nothing here needs a physics
//! engine.

mod bounds;
mod quat;
mod vec3;

pub use bounds::*;
pub use quat::*;
pub use vec3::*;
