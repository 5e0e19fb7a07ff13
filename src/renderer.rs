//! Renderer-facing contract.
//!
//! The renderer itself (layer/canvas management, shape drawing) sits
//! outside this crate, per the distilled spec's scope boundary; this
//! module only defines the two small traits the core calls through.

use crate::math::Vector2;

/// Which axis of a body's visual representation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyAttr {
    X,
    Y,
    Rotate,
}

/// A host-supplied handle the core pushes position/rotation updates into.
pub trait VisualProxy {
    fn set_attr(&mut self, attr: ProxyAttr, value: f64);
}

/// A host-supplied renderer, told to repaint once per step.
pub trait Renderer {
    fn tick(&mut self);
}

/// Push a body's current position and rotation into its visual proxy.
pub fn sync_proxy(proxy: &mut dyn VisualProxy, pos: Vector2, rotation_degrees: f64) {
    proxy.set_attr(ProxyAttr::X, pos.x);
    proxy.set_attr(ProxyAttr::Y, pos.y);
    proxy.set_attr(ProxyAttr::Rotate, rotation_degrees);
}
