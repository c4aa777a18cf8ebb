//! Represents the materials: metallic-roughness PBR parameters plus the
//! texture bindings that feed them. Defaults follow the glTF schema so a
//! bare `{}` material renders as plain white, opaque, double-sided off.

use crate::assets::texture::Texture;
use crate::utils::handle_storage::Handle;
use serde::Deserialize;

/// Interpretation of the material's alpha channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Cut off against `alpha_cutoff`.
    Mask,
    Blend,
}

/// A texture binding plus the texture-coordinate set it samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureInfo {
    pub texture: Handle<Texture>,
    pub tex_coord: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalTextureInfo {
    pub texture: Handle<Texture>,
    pub tex_coord: u32,
    /// Multiplier on the sampled X/Y components.
    pub scale: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OcclusionTextureInfo {
    pub texture: Handle<Texture>,
    pub tex_coord: u32,
    /// 0 disables occlusion entirely, 1 applies it fully.
    pub strength: f32,
}

/// The metallic-roughness parameter block.
#[derive(Clone, Debug, PartialEq)]
pub struct PbrMetallicRoughness {
    pub base_color_factor: glam::Vec4,
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: glam::Vec4::ONE,
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

pub struct Material {
    pub name: Option<String>,
    pub pbr_metallic_roughness: PbrMetallicRoughness,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: glam::Vec3,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
}
