//! Byte-range windows into a [`Buffer`].
//!
//! [`Buffer`]: crate::assets::buffer::Buffer

use crate::assets::buffer::Buffer;
use crate::error::{Error, Result};
use crate::utils::handle_storage::Handle;
use serde::Deserialize;

/// Intended GPU binding of a view, when the exporter recorded one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum Target {
    /// 34962
    ArrayBuffer,
    /// 34963
    ElementArrayBuffer,
}

impl TryFrom<u32> for Target {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, String> {
        match code {
            34962 => Ok(Target::ArrayBuffer),
            34963 => Ok(Target::ElementArrayBuffer),
            other => Err(format!("unknown bufferView target {}", other)),
        }
    }
}

/// A window of `byte_length` bytes at `byte_offset` into a buffer, with an
/// optional element stride for interleaved data.
///
/// The resolution pass guarantees `byte_offset + byte_length` stays inside
/// the referenced buffer's declared length.
pub struct BufferView {
    pub name: Option<String>,
    pub buffer: Handle<Buffer>,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Distance between elements; `None` means tightly packed.
    pub byte_stride: Option<usize>,
    pub target: Option<Target>,
}

/// Reinterpret a raw byte region as a slice of POD values, for consumers
/// (vertex upload paths, index rebuilds) that want typed access without the
/// accessor codec. The copy tolerates arbitrary alignment.
pub fn cast_region<T: bytemuck::NoUninit + bytemuck::AnyBitPattern>(
    bytes: &[u8],
) -> Result<Vec<T>> {
    let size = std::mem::size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return Err(Error::UnsupportedAccessorType(format!(
            "region of {} bytes does not divide into {}-byte values",
            bytes.len(),
            size
        )));
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}
