//! Sparse substitution over a decoded base sequence.
//!
//! A sparse accessor stores a short list of element positions and a matching
//! list of replacement elements instead of a full array; most commonly the
//! base is the implicit all-zero sequence of a view-less accessor. The
//! overlay never changes the base length, only the values at the listed
//! positions.

use crate::assets::accessor::ComponentType;
use crate::assets::buffer_view::BufferView;
use crate::error::{Error, Result};
use crate::utils::handle_storage::Handle;

/// Resolved sparse descriptor: where the substituted positions and values
/// live, and how the positions are encoded.
pub struct SparseOverlay {
    /// Number of substituted elements.
    pub count: usize,
    /// View holding the element positions.
    pub indices_view: Handle<BufferView>,
    pub indices_offset: usize,
    /// Unsigned integer type of the positions, usually narrower than u32.
    pub index_type: ComponentType,
    /// View holding the replacement elements, encoded with the owning
    /// accessor's component type and shape.
    pub values_view: Handle<BufferView>,
    pub values_offset: usize,
}

/// Substitute `values` into `base` at the element positions in `indices`.
///
/// `base` is a flat component sequence; `components` is the element width.
/// Positions are applied in list order, so a duplicated index keeps the
/// later entry. A position past the end of the base sequence is a dangling
/// reference into the accessor's element range.
pub fn apply(base: &mut [f32], components: usize, indices: &[u32], values: &[f32]) -> Result<()> {
    let element_count = base.len() / components.max(1);
    for (slot, &index) in indices.iter().enumerate() {
        let index = index as usize;
        if index >= element_count {
            return Err(Error::DanglingReference {
                entity: "accessor.sparse",
                field: "indices",
                index,
                len: element_count,
            });
        }
        base[index * components..(index + 1) * components]
            .copy_from_slice(&values[slot * components..(slot + 1) * components]);
    }
    Ok(())
}
