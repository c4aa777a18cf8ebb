//! Image entities: encoded picture data reachable through a buffer view or
//! its own URI. This core hands back the encoded bytes; pixel decoding is a
//! consumer concern.

use crate::assets::buffer::ByteSource;
use crate::assets::buffer_view::BufferView;
use crate::utils::handle_storage::Handle;

/// Where an image's encoded bytes live.
pub enum ImageSource {
    /// A window of a document buffer (the usual GLB packing).
    View(Handle<BufferView>),
    /// The image's own URI, inline or external.
    Uri(ByteSource),
}

pub struct Image {
    pub name: Option<String>,
    /// MIME type, e.g. `image/png`. Required when the source is a view.
    pub mime_type: Option<String>,
    pub source: ImageSource,
}
