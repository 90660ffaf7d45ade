// scene/mod.rs

pub mod camera;
pub mod components;
pub mod hierarchy;
mod propagate;
pub mod save_data;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod sprite;
pub mod text;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera2D;
pub use hierarchy::{HierarchyEdit, HierarchyEdits, TreeNode};
pub use save_data::SaveData;
pub use scene::Scene;
pub use sprite::{Sprite, SpriteRenderer, Spritesheet, UvRect};
pub use text::FontRenderer;
pub use transform::Transform;

// Re-export all components
pub use components::{Children, GlobalTransform, Name, Parent, RotateAnimation};
