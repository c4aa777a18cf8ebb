//! Representation of the scene graph: scenes name their root nodes, nodes
//! form the hierarchy and tie meshes, cameras, and skins to a local
//! transform.

use crate::assets::camera::Camera;
use crate::assets::mesh::Mesh;
use crate::assets::skin::Skin;
use crate::utils::handle_storage::Handle;

pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<Handle<Node>>,
}

/// A node in the hierarchy. Every relationship here is legitimately
/// optional; a plain grouping node carries nothing but children.
pub struct Node {
    pub name: Option<String>,
    pub children: Vec<Handle<Node>>,
    pub mesh: Option<Handle<Mesh>>,
    pub camera: Option<Handle<Camera>>,
    pub skin: Option<Handle<Skin>>,
    /// Column-major local matrix; mutually exclusive with TRS in the
    /// serialized form and preferred over it when present.
    pub matrix: Option<glam::Mat4>,
    pub translation: glam::Vec3,
    pub rotation: glam::Quat,
    pub scale: glam::Vec3,
    /// Morph-target weights overriding the mesh defaults.
    pub weights: Vec<f32>,
}

impl Node {
    /// Local transform: the explicit matrix when present, otherwise the TRS
    /// composition translate * rotate * scale.
    pub fn local_transform(&self) -> glam::Mat4 {
        self.matrix.unwrap_or_else(|| {
            glam::Mat4::from_scale_rotation_translation(
                self.scale,
                self.rotation,
                self.translation,
            )
        })
    }
}
