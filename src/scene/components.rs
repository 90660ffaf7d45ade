// scene/components.rs
// Plain hecs components; sprite components live in scene/sprite.rs

use crate::scene::Transform;

/// Display name shown in the hierarchy panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// World-space transform, computed from the hierarchy each update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform(pub Transform);

/// Parent entity reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

/// Ordered child list. Order is the display and traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<hecs::Entity>);

/// Spins an entity around its origin, in radians per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateAnimation {
    pub speed: f32,
}
