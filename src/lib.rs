//! A 2D rigid-body dynamics core: integration, broad/narrow-phase
//! collision detection, and sequential-impulse contact resolution.
//!
//! The renderer, windowing, and asset pipeline are external collaborators;
//! this crate only knows about bodies, boundaries, forces, and the host
//! callbacks described in [`renderer`].

pub mod body;
pub mod boundary;
pub mod collision;
pub mod error;
pub mod force;
pub mod heap;
pub mod math;
pub mod motion;
pub mod renderer;
pub mod resolve;
pub mod world;

pub use body::{Body, BodyConfig, BodyId, BodyKind, Material, Shape, StaticKind};
pub use boundary::{Boundary, BoundarySide};
pub use error::{ConfigError, DomainError, UserCallbackError};
pub use math::{Rotation, Vector2};
pub use renderer::{ProxyAttr, Renderer, VisualProxy};
pub use world::{PartialForceConfig, Vec2Config, World, WorldConfig};
