//! The document root: owns every entity collection and exposes the query
//! and decode surfaces consumers drive.

pub mod raw;
mod resolve;

use crate::assets::accessor::{self, Accessor};
use crate::assets::animation::Animation;
use crate::assets::buffer::{decode_data_uri, Buffer, ByteReader, ByteSource, FsReader};
use crate::assets::buffer_view::BufferView;
use crate::assets::camera::Camera;
use crate::assets::image::{Image, ImageSource};
use crate::assets::material::Material;
use crate::assets::mesh::Mesh;
use crate::assets::scene::{Node, Scene};
use crate::assets::skin::Skin;
use crate::assets::texture::{Sampler, Texture};
use crate::error::{Error, Result};
use crate::utils::handle_storage::{Handle, Storage};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata about the asset, from the required `asset` block.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// glTF version this document targets, e.g. "2.0".
    pub version: String,
    pub generator: Option<String>,
    pub copyright: Option<String>,
    pub min_version: Option<String>,
}

/// Host knobs for a load.
#[derive(Clone)]
pub struct LoadOptions {
    /// Extension names the host can honor. A document whose
    /// `extensionsRequired` names anything outside this set fails to load.
    pub supported_extensions: Vec<String>,
    /// How external byte sources are read. Defaults to the filesystem.
    pub reader: Arc<dyn ByteReader>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            supported_extensions: Vec::new(),
            reader: Arc::new(FsReader),
        }
    }
}

/// A fully linked document.
///
/// Immutable after resolution except for the lazily memoized buffer bytes,
/// so a host may consume it from as many threads as it likes.
pub struct Document {
    pub(crate) base_dir: PathBuf,
    pub(crate) reader: Arc<dyn ByteReader>,
    /// The GLB binary chunk, when the host unpacked one.
    pub(crate) embedded: Option<Arc<[u8]>>,
    pub(crate) asset: Asset,
    pub(crate) extensions_used: Vec<String>,
    pub(crate) extensions_required: Vec<String>,
    pub(crate) default_scene: Option<Handle<Scene>>,
    pub(crate) buffers: Storage<Buffer>,
    pub(crate) buffer_views: Storage<BufferView>,
    pub(crate) accessors: Storage<Accessor>,
    pub(crate) meshes: Storage<Mesh>,
    pub(crate) materials: Storage<Material>,
    pub(crate) textures: Storage<Texture>,
    pub(crate) images: Storage<Image>,
    pub(crate) samplers: Storage<Sampler>,
    pub(crate) nodes: Storage<Node>,
    pub(crate) scenes: Storage<Scene>,
    pub(crate) skins: Storage<Skin>,
    pub(crate) cameras: Storage<Camera>,
    pub(crate) animations: Storage<Animation>,
}

// Manual: the reader is a trait object and the arenas would dump every
// entity, so this prints the asset block and collection sizes.
impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("asset", &self.asset)
            .field("base_dir", &self.base_dir)
            .field("buffers", &self.buffers.len())
            .field("buffer_views", &self.buffer_views.len())
            .field("accessors", &self.accessors.len())
            .field("meshes", &self.meshes.len())
            .field("nodes", &self.nodes.len())
            .field("scenes", &self.scenes.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Load a document from JSON text with no embedded chunk.
    ///
    /// `base_dir` anchors relative buffer and image URIs.
    pub fn from_json(
        json: &str,
        base_dir: impl Into<PathBuf>,
        options: LoadOptions,
    ) -> Result<Document> {
        Self::from_json_with_chunk(json, base_dir, None, options)
    }

    /// Load a document from JSON text plus the embedded binary chunk a host
    /// unpacked from a GLB container. Container parsing itself is the
    /// host's job; this core only consumes the chunk bytes.
    pub fn from_json_with_chunk(
        json: &str,
        base_dir: impl Into<PathBuf>,
        embedded: Option<Vec<u8>>,
        options: LoadOptions,
    ) -> Result<Document> {
        let raw: raw::Root = serde_json::from_str(json)?;
        let base_dir = base_dir.into();
        info!(
            "loading glTF {} document from {}",
            raw.asset.version,
            base_dir.display()
        );
        resolve::resolve(raw, base_dir, embedded.map(Into::into), options)
    }

    /// Load a `.gltf` file through the configured reader; the file's parent
    /// directory becomes the base for relative URIs.
    pub fn from_file(path: impl AsRef<Path>, options: LoadOptions) -> Result<Document> {
        let path = path.as_ref();
        let text = options.reader.read(path).map_err(|source| Error::Io {
            location: path.to_owned(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_owned();
        let raw: raw::Root = serde_json::from_slice(&text)?;
        info!(
            "loading glTF {} document from {}",
            raw.asset.version,
            path.display()
        );
        resolve::resolve(raw, base_dir, None, options)
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Extension names the document uses anywhere.
    pub fn extensions_used(&self) -> &[String] {
        &self.extensions_used
    }

    /// Extension names the document cannot be loaded without. Every entry
    /// was in the load's supported set, or the load would have failed.
    pub fn extensions_required(&self) -> &[String] {
        &self.extensions_required
    }

    /// The scene the `scene` field names, when present.
    pub fn default_scene_handle(&self) -> Option<Handle<Scene>> {
        self.default_scene
    }

    /// The default scene: the explicit one when declared, otherwise the
    /// first scene by convention.
    pub fn default_scene(&self) -> Option<&Scene> {
        self.default_scene
            .or_else(|| self.scenes.try_handle(0))
            .and_then(|handle| self.scenes.get(handle))
    }
}

/// Lookup-by-handle and lookup-by-index accessors for one entity kind.
macro_rules! query_surface {
    ($get:ident, $by_index:ident, $iter:ident, $field:ident, $ty:ty) => {
        impl Document {
            pub fn $get(&self, handle: Handle<$ty>) -> Option<&$ty> {
                self.$field.get(handle)
            }

            /// Bounds-checked promotion of a raw collection index.
            pub fn $by_index(&self, index: usize) -> Option<Handle<$ty>> {
                self.$field.try_handle(index)
            }

            pub fn $iter(&self) -> impl Iterator<Item = (Handle<$ty>, &$ty)> {
                self.$field.handles().zip(self.$field.iter())
            }
        }
    };
}

query_surface!(buffer, buffer_handle, buffers, buffers, Buffer);
query_surface!(
    buffer_view,
    buffer_view_handle,
    buffer_views,
    buffer_views,
    BufferView
);
query_surface!(accessor, accessor_handle, accessors, accessors, Accessor);
query_surface!(mesh, mesh_handle, meshes, meshes, Mesh);
query_surface!(material, material_handle, materials, materials, Material);
query_surface!(texture, texture_handle, textures, textures, Texture);
query_surface!(image, image_handle, images, images, Image);
query_surface!(sampler, sampler_handle, samplers, samplers, Sampler);
query_surface!(node, node_handle, nodes, nodes, Node);
query_surface!(scene, scene_handle, scenes, scenes, Scene);
query_surface!(skin, skin_handle, skins, skins, Skin);
query_surface!(camera, camera_handle, cameras, cameras, Camera);
query_surface!(
    animation,
    animation_handle,
    animations,
    animations,
    Animation
);

// Byte and decode surfaces. These are the only operations that can fail
// after a successful load, and a failure is local to the entity asked for.
impl Document {
    fn expect<'a, T>(
        &self,
        storage: &'a Storage<T>,
        handle: Handle<T>,
        entity: &'static str,
    ) -> Result<&'a T> {
        storage.get(handle).ok_or(Error::DanglingReference {
            entity,
            field: "handle",
            index: handle.index(),
            len: storage.len(),
        })
    }

    /// The bytes backing a buffer, loading and caching them on first call.
    pub fn buffer_bytes(&self, handle: Handle<Buffer>) -> Result<Arc<[u8]>> {
        let buffer = self.expect(&self.buffers, handle, "buffer")?;
        buffer.bytes(self.reader.as_ref(), self.embedded.as_ref())
    }

    /// The window of buffer bytes a view covers.
    pub fn view_bytes(&self, handle: Handle<BufferView>) -> Result<Vec<u8>> {
        let view = self.expect(&self.buffer_views, handle, "bufferView")?;
        let data = self.buffer_bytes(view.buffer)?;
        // In-bounds by the resolution pass; the load can still come up short
        // only by failing outright, so this get should never miss.
        data.get(view.byte_offset..view.byte_offset + view.byte_length)
            .map(<[u8]>::to_vec)
            .ok_or(Error::BufferUnderrun {
                needed: view.byte_length,
                offset: view.byte_offset,
                len: data.len(),
            })
    }

    /// Decode an accessor into `count * components` values, flattened in
    /// element order.
    ///
    /// A view-less accessor yields zeros; a sparse overlay is applied on
    /// top of whatever the base decodes to. Normalization follows the
    /// accessor's flag and component type.
    pub fn read_accessor(&self, handle: Handle<Accessor>) -> Result<Vec<f32>> {
        let accessor = self.expect(&self.accessors, handle, "accessor")?;
        let components = accessor.components();
        let mut values = match accessor.view {
            Some(view_handle) => {
                let view = self.expect(&self.buffer_views, view_handle, "bufferView")?;
                let region = self.view_bytes(view_handle)?;
                accessor::decode_region(
                    &region,
                    accessor.byte_offset,
                    view.byte_stride,
                    accessor.component_type,
                    accessor.shape,
                    accessor.normalized,
                    accessor.count,
                )?
            }
            None => vec![0.0; accessor.count * components],
        };
        if let Some(sparse) = &accessor.sparse {
            let index_region = self.view_bytes(sparse.indices_view)?;
            let indices = accessor::decode_index_region(
                &index_region,
                sparse.indices_offset,
                None,
                sparse.index_type,
                sparse.count,
            )?;
            let value_region = self.view_bytes(sparse.values_view)?;
            let replacements = accessor::decode_region(
                &value_region,
                sparse.values_offset,
                None,
                accessor.component_type,
                accessor.shape,
                accessor.normalized,
                sparse.count,
            )?;
            accessor::sparse::apply(&mut values, components, &indices, &replacements)?;
        }
        Ok(values)
    }

    /// Reinterpret a view's bytes as POD values, for consumers that feed
    /// GPUs directly and skip the accessor codec.
    pub fn view_as<T: bytemuck::NoUninit + bytemuck::AnyBitPattern>(
        &self,
        handle: Handle<BufferView>,
    ) -> Result<Vec<T>> {
        let bytes = self.view_bytes(handle)?;
        crate::assets::buffer_view::cast_region(&bytes)
    }

    /// Decode an element-index accessor, widening u8/u16 storage to `u32`.
    pub fn read_indices(&self, handle: Handle<Accessor>) -> Result<Vec<u32>> {
        let accessor = self.expect(&self.accessors, handle, "accessor")?;
        if accessor.shape != crate::assets::accessor::ElementShape::Scalar {
            return Err(Error::UnsupportedAccessorType(format!(
                "index accessors must be SCALAR, got {:?}",
                accessor.shape
            )));
        }
        match accessor.view {
            Some(view_handle) => {
                let view = self.expect(&self.buffer_views, view_handle, "bufferView")?;
                let region = self.view_bytes(view_handle)?;
                accessor::decode_index_region(
                    &region,
                    accessor.byte_offset,
                    view.byte_stride,
                    accessor.component_type,
                    accessor.count,
                )
            }
            None => Ok(vec![0; accessor.count]),
        }
    }

    /// A skin's inverse bind matrices, one per joint; identity for every
    /// joint when the skin declares no accessor.
    pub fn read_inverse_bind_matrices(&self, handle: Handle<Skin>) -> Result<Vec<glam::Mat4>> {
        let skin = self.expect(&self.skins, handle, "skin")?;
        let Some(accessor_handle) = skin.inverse_bind_matrices else {
            return Ok(vec![glam::Mat4::IDENTITY; skin.joints.len()]);
        };
        let values = self.read_accessor(accessor_handle)?;
        Ok(values
            .chunks_exact(16)
            .map(|chunk| {
                let mut array = [0.0; 16];
                array.copy_from_slice(chunk);
                glam::Mat4::from_cols_array(&array)
            })
            .collect())
    }

    /// The encoded bytes of an image, from its view or its own URI. Pixel
    /// decoding is left to the consumer.
    pub fn image_bytes(&self, handle: Handle<Image>) -> Result<Vec<u8>> {
        let image = self.expect(&self.images, handle, "image")?;
        match &image.source {
            ImageSource::View(view) => self.view_bytes(*view),
            ImageSource::Uri(ByteSource::Inline(uri)) => decode_data_uri(uri),
            ImageSource::Uri(ByteSource::External(location)) => {
                self.reader.read(location).map_err(|source| Error::Io {
                    location: location.clone(),
                    source,
                })
            }
            // Unreachable for images built by resolution, which never
            // classifies an image URI as embedded.
            ImageSource::Uri(ByteSource::Embedded) => Err(Error::MissingEmbeddedChunk),
        }
    }

    /// Directory relative URIs were resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
