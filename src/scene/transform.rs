use glam::{Mat4, Quat, Vec2, Vec3};

/// 2D placement of an entity: position, non-uniform scale and a rotation in
/// radians around +Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
        rotation: 0.0,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_prs(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            position,
            scale,
            rotation,
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation),
            self.position.extend(0.0),
        )
    }

    /// Maps a point from this transform's local space into its parent space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        Vec2::from_angle(self.rotation).rotate(local * self.scale) + self.position
    }

    /// Composes `self` (parent) with `child`. Shear from rotated non-uniform
    /// scale is dropped; scales multiply component-wise.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform::from_prs(
            self.transform_point(child.position),
            self.rotation + child.rotation,
            self.scale * child.scale,
        )
    }
}
