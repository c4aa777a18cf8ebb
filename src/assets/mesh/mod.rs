//! Representation of a mesh: a set of primitives, each mapping attribute
//! semantics to accessors.

use crate::assets::accessor::Accessor;
use crate::assets::material::Material;
use crate::utils::handle_storage::Handle;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Well-known vertex attribute names, with application-specific ones
/// preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
    /// Anything else, e.g. `_TEMPERATURE`. Recorded, never interpreted.
    Custom(String),
}

impl Semantic {
    /// Parse a glTF attribute key. Unknown names land in `Custom` rather
    /// than failing the load; consumers decide whether they care.
    pub fn parse(name: &str) -> Semantic {
        fn set_index(suffix: &str) -> Option<u32> {
            suffix.parse().ok()
        }
        match name {
            "POSITION" => return Semantic::Position,
            "NORMAL" => return Semantic::Normal,
            "TANGENT" => return Semantic::Tangent,
            _ => {}
        }
        if let Some((prefix, suffix)) = name.split_once('_') {
            if let Some(set) = set_index(suffix) {
                match prefix {
                    "TEXCOORD" => return Semantic::TexCoord(set),
                    "COLOR" => return Semantic::Color(set),
                    "JOINTS" => return Semantic::Joints(set),
                    "WEIGHTS" => return Semantic::Weights(set),
                    _ => {}
                }
            }
        }
        Semantic::Custom(name.to_owned())
    }
}

impl std::fmt::Display for Semantic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Semantic::Position => write!(f, "POSITION"),
            Semantic::Normal => write!(f, "NORMAL"),
            Semantic::Tangent => write!(f, "TANGENT"),
            Semantic::TexCoord(set) => write!(f, "TEXCOORD_{}", set),
            Semantic::Color(set) => write!(f, "COLOR_{}", set),
            Semantic::Joints(set) => write!(f, "JOINTS_{}", set),
            Semantic::Weights(set) => write!(f, "WEIGHTS_{}", set),
            Semantic::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Primitive topology, with the GL codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum Mode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl TryFrom<u32> for Mode {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, String> {
        match code {
            0 => Ok(Mode::Points),
            1 => Ok(Mode::Lines),
            2 => Ok(Mode::LineLoop),
            3 => Ok(Mode::LineStrip),
            4 => Ok(Mode::Triangles),
            5 => Ok(Mode::TriangleStrip),
            6 => Ok(Mode::TriangleFan),
            other => Err(format!("unknown primitive mode {}", other)),
        }
    }
}

/// One drawable piece of a mesh: attribute accessors, optional element
/// indices, optional material, and any morph-target attribute overlays.
pub struct Primitive {
    pub attributes: BTreeMap<Semantic, Handle<Accessor>>,
    pub indices: Option<Handle<Accessor>>,
    pub material: Option<Handle<Material>>,
    pub mode: Mode,
    /// Per-target replacement attributes, same keys as `attributes`.
    pub targets: Vec<BTreeMap<Semantic, Handle<Accessor>>>,
}

impl Primitive {
    /// Accessor for one attribute, if the primitive carries it.
    pub fn attribute(&self, semantic: &Semantic) -> Option<Handle<Accessor>> {
        self.attributes.get(semantic).copied()
    }
}

pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    /// Default morph-target weights, one per target.
    pub weights: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_semantics() {
        assert_eq!(Semantic::parse("POSITION"), Semantic::Position);
        assert_eq!(Semantic::parse("TEXCOORD_1"), Semantic::TexCoord(1));
        assert_eq!(Semantic::parse("JOINTS_0"), Semantic::Joints(0));
        assert_eq!(
            Semantic::parse("_TEMPERATURE"),
            Semantic::Custom("_TEMPERATURE".to_owned())
        );
    }

    #[test]
    fn display_round_trips() {
        for name in ["POSITION", "NORMAL", "TANGENT", "TEXCOORD_0", "WEIGHTS_2"] {
            assert_eq!(Semantic::parse(name).to_string(), name);
        }
    }

    #[test]
    fn mode_codes() {
        assert_eq!(Mode::try_from(4).unwrap(), Mode::Triangles);
        assert_eq!(Mode::default(), Mode::Triangles);
        assert!(Mode::try_from(7).is_err());
    }
}
