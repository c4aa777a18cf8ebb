//! Camera projections. The document only stores the parameters; the matrix
//! helpers exist because every consumer rebuilds the same two formulas.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perspective {
    /// Absent means "use the viewport's aspect ratio".
    pub aspect_ratio: Option<f32>,
    /// Vertical field of view in radians.
    pub yfov: f32,
    /// Absent means an infinite far plane.
    pub zfar: Option<f32>,
    pub znear: f32,
}

impl Perspective {
    /// Right-handed projection matrix, falling back to `viewport_aspect`
    /// when the camera does not pin its own aspect ratio.
    pub fn matrix(&self, viewport_aspect: f32) -> glam::Mat4 {
        let aspect = self.aspect_ratio.unwrap_or(viewport_aspect);
        match self.zfar {
            Some(zfar) => glam::Mat4::perspective_rh(self.yfov, aspect, self.znear, zfar),
            None => glam::Mat4::perspective_infinite_rh(self.yfov, aspect, self.znear),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Orthographic {
    /// Half horizontal extent.
    pub xmag: f32,
    /// Half vertical extent.
    pub ymag: f32,
    pub zfar: f32,
    pub znear: f32,
}

impl Orthographic {
    pub fn matrix(&self) -> glam::Mat4 {
        glam::Mat4::orthographic_rh(
            -self.xmag,
            self.xmag,
            -self.ymag,
            self.ymag,
            self.znear,
            self.zfar,
        )
    }
}

pub enum Projection {
    Perspective(Perspective),
    Orthographic(Orthographic),
}

pub struct Camera {
    pub name: Option<String>,
    pub projection: Projection,
}
