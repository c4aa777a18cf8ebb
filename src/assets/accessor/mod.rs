//! Typed, shaped views into buffer bytes.
//!
//! An [`Accessor`] describes how to interpret a byte range of a
//! [`BufferView`]: a component type (byte width + signedness), an element
//! shape (scalar through 4x4 matrix), a count, an offset, and a normalization
//! flag. The codec in this module turns those descriptions into flat `f32`
//! sequences and back. All multi-byte values are little-endian regardless of
//! the host.
//!
//! [`BufferView`]: crate::assets::buffer_view::BufferView

pub mod sparse;

pub use sparse::SparseOverlay;

use crate::assets::buffer_view::BufferView;
use crate::error::{Error, Result};
use crate::utils::handle_storage::Handle;
use serde::Deserialize;

/// Width and interpretation of a single component, with its GL code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum ComponentType {
    /// 5120, signed byte
    I8,
    /// 5121, unsigned byte
    U8,
    /// 5122, signed short
    I16,
    /// 5123, unsigned short
    U16,
    /// 5125, unsigned int
    U32,
    /// 5126, float
    F32,
}

impl ComponentType {
    pub fn gl_code(self) -> u32 {
        match self {
            ComponentType::I8 => 5120,
            ComponentType::U8 => 5121,
            ComponentType::I16 => 5122,
            ComponentType::U16 => 5123,
            ComponentType::U32 => 5125,
            ComponentType::F32 => 5126,
        }
    }

    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, String> {
        match code {
            5120 => Ok(ComponentType::I8),
            5121 => Ok(ComponentType::U8),
            5122 => Ok(ComponentType::I16),
            5123 => Ok(ComponentType::U16),
            5125 => Ok(ComponentType::U32),
            5126 => Ok(ComponentType::F32),
            other => Err(format!("unknown accessor componentType {}", other)),
        }
    }
}

/// Number and arrangement of components per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementShape {
    /// Components per element.
    pub fn components(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 => 4,
            ElementShape::Mat2 => 4,
            ElementShape::Mat3 => 9,
            ElementShape::Mat4 => 16,
        }
    }
}

/// A typed view yielding `count` elements of `shape`-arranged components.
///
/// An accessor without a buffer view decodes to an all-zero sequence; one
/// with a sparse overlay substitutes values at the overlay's positions after
/// the base sequence is decoded.
pub struct Accessor {
    pub name: Option<String>,
    pub view: Option<Handle<BufferView>>,
    /// Offset into the view in bytes.
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub shape: ElementShape,
    /// Integer components map into [-1, 1] / [0, 1] when set.
    pub normalized: bool,
    /// Number of elements, not components or bytes.
    pub count: usize,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
    pub sparse: Option<SparseOverlay>,
}

impl Accessor {
    /// Components per element.
    pub fn components(&self) -> usize {
        self.shape.components()
    }

    /// Tightly packed size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.shape.components()
    }
}

/// Decode one component, applying the normalization table when asked.
///
/// The divisors and the -1.0 clamp for signed types follow the glTF spec;
/// U32 and F32 are never normalized. `bytes` must hold at least
/// `component_type.size()` bytes.
pub(crate) fn component_to_f32(
    component_type: ComponentType,
    normalized: bool,
    bytes: &[u8],
) -> f32 {
    match component_type {
        ComponentType::I8 => {
            let v = bytes[0] as i8;
            if normalized {
                (v as f32 / 127.0).max(-1.0)
            } else {
                v as f32
            }
        }
        ComponentType::U8 => {
            let v = bytes[0];
            if normalized {
                v as f32 / 255.0
            } else {
                v as f32
            }
        }
        ComponentType::I16 => {
            let v = i16::from_le_bytes([bytes[0], bytes[1]]);
            if normalized {
                (v as f32 / 32767.0).max(-1.0)
            } else {
                v as f32
            }
        }
        ComponentType::U16 => {
            let v = u16::from_le_bytes([bytes[0], bytes[1]]);
            if normalized {
                v as f32 / 65535.0
            } else {
                v as f32
            }
        }
        ComponentType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        ComponentType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Inverse of [`component_to_f32`]: round-to-nearest back into the component
/// domain and append little-endian bytes. Float→int casts saturate, so out of
/// range inputs clamp instead of wrapping.
pub(crate) fn f32_to_component(
    component_type: ComponentType,
    normalized: bool,
    value: f32,
    out: &mut Vec<u8>,
) {
    match component_type {
        ComponentType::I8 => {
            let scaled = if normalized { value * 127.0 } else { value };
            out.push((scaled.round() as i8) as u8);
        }
        ComponentType::U8 => {
            let scaled = if normalized { value * 255.0 } else { value };
            out.push(scaled.round() as u8);
        }
        ComponentType::I16 => {
            let scaled = if normalized { value * 32767.0 } else { value };
            out.extend_from_slice(&(scaled.round() as i16).to_le_bytes());
        }
        ComponentType::U16 => {
            let scaled = if normalized { value * 65535.0 } else { value };
            out.extend_from_slice(&(scaled.round() as u16).to_le_bytes());
        }
        ComponentType::U32 => {
            out.extend_from_slice(&(value.round() as u32).to_le_bytes());
        }
        ComponentType::F32 => {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Decode `count` elements out of `region`, starting at `byte_offset` and
/// stepping by the view's stride (tight packing when the view declares none).
///
/// Returns `count * components` values flattened in element order.
pub(crate) fn decode_region(
    region: &[u8],
    byte_offset: usize,
    stride: Option<usize>,
    component_type: ComponentType,
    shape: ElementShape,
    normalized: bool,
    count: usize,
) -> Result<Vec<f32>> {
    let comp_size = component_type.size();
    let components = shape.components();
    let element_size = comp_size * components;
    let stride = stride.unwrap_or(element_size);
    let mut out = Vec::with_capacity(count * components);
    for i in 0..count {
        let Some(start) = i
            .checked_mul(stride)
            .and_then(|offset| offset.checked_add(byte_offset))
        else {
            return Err(Error::BufferUnderrun {
                needed: element_size,
                offset: byte_offset,
                len: region.len(),
            });
        };
        let element = start
            .checked_add(element_size)
            .and_then(|end| region.get(start..end))
            .ok_or(Error::BufferUnderrun {
                needed: element_size,
                offset: start,
                len: region.len(),
            })?;
        for c in 0..components {
            out.push(component_to_f32(
                component_type,
                normalized,
                &element[c * comp_size..(c + 1) * comp_size],
            ));
        }
    }
    Ok(out)
}

/// Decode an element-index region into `u32` positions. Only the unsigned
/// integer component types are index-capable.
pub(crate) fn decode_index_region(
    region: &[u8],
    byte_offset: usize,
    stride: Option<usize>,
    component_type: ComponentType,
    count: usize,
) -> Result<Vec<u32>> {
    let comp_size = component_type.size();
    let stride = stride.unwrap_or(comp_size);
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let Some(start) = i
            .checked_mul(stride)
            .and_then(|offset| offset.checked_add(byte_offset))
        else {
            return Err(Error::BufferUnderrun {
                needed: comp_size,
                offset: byte_offset,
                len: region.len(),
            });
        };
        let bytes = start
            .checked_add(comp_size)
            .and_then(|end| region.get(start..end))
            .ok_or(Error::BufferUnderrun {
                needed: comp_size,
                offset: start,
                len: region.len(),
            })?;
        let value = match component_type {
            ComponentType::U8 => bytes[0] as u32,
            ComponentType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            ComponentType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            other => {
                return Err(Error::UnsupportedAccessorType(format!(
                    "component type {:?} cannot index elements",
                    other
                )))
            }
        };
        out.push(value);
    }
    Ok(out)
}

/// Encode a flat value sequence into tightly packed little-endian bytes,
/// the inverse of decoding with no stride.
pub fn encode(values: &[f32], component_type: ComponentType, normalized: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * component_type.size());
    for &value in values {
        f32_to_component(component_type, normalized, value, &mut out);
    }
    out
}
