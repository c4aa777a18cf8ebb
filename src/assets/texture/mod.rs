//! Textures pair an image with the sampler state used to read it.

use crate::assets::image::Image;
use crate::utils::handle_storage::Handle;
use serde::Deserialize;

/// Magnification filter, with the GL codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum MagFilter {
    /// 9728
    Nearest,
    /// 9729
    Linear,
}

impl TryFrom<u32> for MagFilter {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, String> {
        match code {
            9728 => Ok(MagFilter::Nearest),
            9729 => Ok(MagFilter::Linear),
            other => Err(format!("unknown magFilter {}", other)),
        }
    }
}

/// Minification filter, with the GL codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum MinFilter {
    /// 9728
    Nearest,
    /// 9729
    Linear,
    /// 9984
    NearestMipmapNearest,
    /// 9985
    LinearMipmapNearest,
    /// 9986
    NearestMipmapLinear,
    /// 9987
    LinearMipmapLinear,
}

impl TryFrom<u32> for MinFilter {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, String> {
        match code {
            9728 => Ok(MinFilter::Nearest),
            9729 => Ok(MinFilter::Linear),
            9984 => Ok(MinFilter::NearestMipmapNearest),
            9985 => Ok(MinFilter::LinearMipmapNearest),
            9986 => Ok(MinFilter::NearestMipmapLinear),
            9987 => Ok(MinFilter::LinearMipmapLinear),
            other => Err(format!("unknown minFilter {}", other)),
        }
    }
}

/// Texture-coordinate wrapping, with the GL codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum WrapMode {
    /// 33071
    ClampToEdge,
    /// 33648
    MirroredRepeat,
    /// 10497
    #[default]
    Repeat,
}

impl TryFrom<u32> for WrapMode {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, String> {
        match code {
            33071 => Ok(WrapMode::ClampToEdge),
            33648 => Ok(WrapMode::MirroredRepeat),
            10497 => Ok(WrapMode::Repeat),
            other => Err(format!("unknown wrap mode {}", other)),
        }
    }
}

/// Filtering and wrapping state. Absent filters leave the choice to the
/// consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sampler {
    pub name: Option<String>,
    pub mag_filter: Option<MagFilter>,
    pub min_filter: Option<MinFilter>,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub name: Option<String>,
    /// Missing sources are legal; consumers substitute their own fallback.
    pub source: Option<Handle<Image>>,
    /// Absent sampler means repeat wrapping with auto filtering.
    pub sampler: Option<Handle<Sampler>>,
}
