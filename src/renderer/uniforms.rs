// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::renderer::texture_slots::MAX_TEXTURE_SLOTS;

/// Mirror of `Globals` in `sprite.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
pub struct SpriteUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub units: [[i32; 4]; MAX_TEXTURE_SLOTS / 4],
}

impl SpriteUniform {
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            units: [[0; 4]; MAX_TEXTURE_SLOTS / 4],
        }
    }

    /// Sets a matrix by its shader-facing name. Returns false for names the
    /// sprite shader does not declare.
    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
        match name {
            "uProjection" => self.projection = value.to_cols_array_2d(),
            "uView" => self.view = value.to_cols_array_2d(),
            _ => return false,
        }
        true
    }

    pub fn set_int_array(&mut self, name: &str, values: &[i32]) -> bool {
        if name != "uTextures" {
            return false;
        }
        if values.len() > MAX_TEXTURE_SLOTS {
            log::warn!(
                "uTextures takes {} entries, ignoring the last {}",
                MAX_TEXTURE_SLOTS,
                values.len() - MAX_TEXTURE_SLOTS
            );
        }
        for (i, &v) in values.iter().take(MAX_TEXTURE_SLOTS).enumerate() {
            self.units[i / 4][i % 4] = v;
        }
        true
    }
}

impl Default for SpriteUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::texture_slots::SAMPLER_UNITS;

    #[test]
    fn layout_matches_shader() {
        assert_eq!(std::mem::size_of::<SpriteUniform>(), 192);
    }

    #[test]
    fn named_setters_fill_the_right_fields() {
        let mut uniform = SpriteUniform::new();
        let proj = Mat4::orthographic_rh(0.0, 10.0, 0.0, 10.0, -1.0, 1.0);

        assert!(uniform.set_mat4("uProjection", proj));
        assert!(uniform.set_int_array("uTextures", &SAMPLER_UNITS));
        assert!(!uniform.set_mat4("uModel", proj));

        assert_eq!(uniform.projection, proj.to_cols_array_2d());
        assert_eq!(uniform.view, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(uniform.units[0], [0, 1, 2, 3]);
        assert_eq!(uniform.units[3], [12, 13, 14, 15]);
    }
}
