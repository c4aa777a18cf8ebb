//! The deferred-resolution pass: raw index-bearing records in, linked
//! document out.
//!
//! Records may reference entities declared later in the same or another
//! collection, so nothing binds until every collection has been parsed.
//! After that, each index field either becomes a bounds-checked
//! [`Handle<T>`], stays absent because the source field was absent, or
//! fails the whole load. No partially linked document ever escapes.
//!
//! [`Handle<T>`]: crate::utils::handle_storage::Handle

use crate::assets::accessor::{Accessor, ElementShape, SparseOverlay};
use crate::assets::animation::{Animation, AnimationSampler, Channel};
use crate::assets::buffer::{Buffer, ByteSource};
use crate::assets::buffer_view::BufferView;
use crate::assets::camera::{Camera, Projection};
use crate::assets::image::{Image, ImageSource};
use crate::assets::material::{
    Material, NormalTextureInfo, OcclusionTextureInfo, PbrMetallicRoughness, TextureInfo,
};
use crate::assets::mesh::{Mesh, Primitive, Semantic};
use crate::assets::scene::{Node, Scene};
use crate::assets::skin::Skin;
use crate::assets::texture::{Sampler, Texture};
use crate::document::{Document, LoadOptions};
use crate::error::{Error, Result};
use crate::utils::handle_storage::{Handle, Storage};
use log::debug;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Bind one index into a collection of `len` entries.
fn bind<T>(
    index: usize,
    len: usize,
    entity: &'static str,
    field: &'static str,
) -> Result<Handle<T>> {
    if index < len {
        Ok(Handle::from_index(index))
    } else {
        Err(Error::DanglingReference {
            entity,
            field,
            index,
            len,
        })
    }
}

/// Bind an optional index: an absent field is "no relationship", never an
/// error and never a default entry.
fn bind_opt<T>(
    index: Option<usize>,
    len: usize,
    entity: &'static str,
    field: &'static str,
) -> Result<Option<Handle<T>>> {
    index.map(|index| bind(index, len, entity, field)).transpose()
}

/// Parse and bind one attribute map (primitive attributes or one morph
/// target).
fn bind_attributes(
    raw: &BTreeMap<String, usize>,
    accessor_count: usize,
) -> Result<BTreeMap<Semantic, Handle<Accessor>>> {
    let mut attributes = BTreeMap::new();
    for (name, &index) in raw {
        let handle = bind(index, accessor_count, "mesh.primitive", "attributes")?;
        attributes.insert(Semantic::parse(name), handle);
    }
    Ok(attributes)
}

fn resolve_texture_info(raw: &super::raw::TextureInfo, textures: usize) -> Result<TextureInfo> {
    Ok(TextureInfo {
        texture: bind(raw.index, textures, "material", "texture index")?,
        tex_coord: raw.tex_coord,
    })
}

pub(crate) fn resolve(
    raw: super::raw::Root,
    base_dir: PathBuf,
    embedded: Option<Arc<[u8]>>,
    options: LoadOptions,
) -> Result<Document> {
    // Required extensions are a hard gate; nothing else is worth resolving
    // if the host cannot honor one of them.
    for name in &raw.extensions_required {
        if !options.supported_extensions.iter().any(|s| s == name) {
            return Err(Error::UnsupportedExtension(name.clone()));
        }
    }

    let buffer_count = raw.buffers.len();
    let view_count = raw.buffer_views.len();
    let accessor_count = raw.accessors.len();
    let mesh_count = raw.meshes.len();
    let material_count = raw.materials.len();
    let texture_count = raw.textures.len();
    let image_count = raw.images.len();
    let sampler_count = raw.samplers.len();
    let node_count = raw.nodes.len();
    let scene_count = raw.scenes.len();
    let skin_count = raw.skins.len();
    let camera_count = raw.cameras.len();

    let mut buffers = Storage::new();
    for raw_buffer in &raw.buffers {
        if raw_buffer.byte_length == 0 {
            return Err(Error::Parse(
                "buffer byteLength must be at least 1".to_owned(),
            ));
        }
        let source = ByteSource::parse(raw_buffer.uri.as_deref(), &base_dir)?;
        buffers.insert(Buffer::new(
            raw_buffer.name.clone(),
            raw_buffer.byte_length,
            source,
        ));
    }

    let mut buffer_views = Storage::new();
    for raw_view in &raw.buffer_views {
        let buffer = bind(raw_view.buffer, buffer_count, "bufferView", "buffer")?;
        let declared = raw.buffers[raw_view.buffer].byte_length;
        let end = raw_view
            .byte_offset
            .checked_add(raw_view.byte_length)
            .ok_or_else(|| {
                Error::Parse(format!(
                    "bufferView byteOffset {} + byteLength {} overflows",
                    raw_view.byte_offset, raw_view.byte_length
                ))
            })?;
        if end > declared {
            return Err(Error::LengthMismatch {
                declared,
                actual: end,
            });
        }
        buffer_views.insert(BufferView {
            name: raw_view.name.clone(),
            buffer,
            byte_offset: raw_view.byte_offset,
            byte_length: raw_view.byte_length,
            byte_stride: raw_view.byte_stride,
            target: raw_view.target,
        });
    }

    let mut accessors = Storage::new();
    for raw_accessor in &raw.accessors {
        // Bounds the decoded f32 sequence to an addressable allocation, so
        // decode paths can size buffers from `count` without overflow.
        let decoded_bytes = raw_accessor
            .count
            .checked_mul(raw_accessor.shape.components())
            .and_then(|values| values.checked_mul(std::mem::size_of::<f32>()));
        if decoded_bytes.map_or(true, |bytes| bytes > isize::MAX as usize) {
            return Err(Error::Parse(format!(
                "accessor count {} is out of range",
                raw_accessor.count
            )));
        }
        let view = bind_opt(
            raw_accessor.buffer_view,
            view_count,
            "accessor",
            "bufferView",
        )?;
        let sparse = match &raw_accessor.sparse {
            Some(raw_sparse) => {
                if raw_sparse.count > raw_accessor.count {
                    return Err(Error::Parse(format!(
                        "sparse count {} exceeds accessor count {}",
                        raw_sparse.count, raw_accessor.count
                    )));
                }
                Some(SparseOverlay {
                    count: raw_sparse.count,
                    indices_view: bind(
                        raw_sparse.indices.buffer_view,
                        view_count,
                        "accessor.sparse.indices",
                        "bufferView",
                    )?,
                    indices_offset: raw_sparse.indices.byte_offset,
                    index_type: raw_sparse.indices.component_type,
                    values_view: bind(
                        raw_sparse.values.buffer_view,
                        view_count,
                        "accessor.sparse.values",
                        "bufferView",
                    )?,
                    values_offset: raw_sparse.values.byte_offset,
                })
            }
            None => None,
        };
        accessors.insert(Accessor {
            name: raw_accessor.name.clone(),
            view,
            byte_offset: raw_accessor.byte_offset,
            component_type: raw_accessor.component_type,
            shape: raw_accessor.shape,
            normalized: raw_accessor.normalized,
            count: raw_accessor.count,
            min: raw_accessor.min.clone(),
            max: raw_accessor.max.clone(),
            sparse,
        });
    }

    let mut materials = Storage::new();
    for raw_material in &raw.materials {
        let pbr = &raw_material.pbr_metallic_roughness;
        materials.insert(Material {
            name: raw_material.name.clone(),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: glam::Vec4::from_array(pbr.base_color_factor),
                base_color_texture: pbr
                    .base_color_texture
                    .as_ref()
                    .map(|info| resolve_texture_info(info, texture_count))
                    .transpose()?,
                metallic_factor: pbr.metallic_factor,
                roughness_factor: pbr.roughness_factor,
                metallic_roughness_texture: pbr
                    .metallic_roughness_texture
                    .as_ref()
                    .map(|info| resolve_texture_info(info, texture_count))
                    .transpose()?,
            },
            normal_texture: raw_material
                .normal_texture
                .as_ref()
                .map(|info| {
                    Ok::<_, Error>(NormalTextureInfo {
                        texture: bind(info.index, texture_count, "material", "normalTexture")?,
                        tex_coord: info.tex_coord,
                        scale: info.scale,
                    })
                })
                .transpose()?,
            occlusion_texture: raw_material
                .occlusion_texture
                .as_ref()
                .map(|info| {
                    Ok::<_, Error>(OcclusionTextureInfo {
                        texture: bind(info.index, texture_count, "material", "occlusionTexture")?,
                        tex_coord: info.tex_coord,
                        strength: info.strength,
                    })
                })
                .transpose()?,
            emissive_texture: raw_material
                .emissive_texture
                .as_ref()
                .map(|info| resolve_texture_info(info, texture_count))
                .transpose()?,
            emissive_factor: glam::Vec3::from_array(raw_material.emissive_factor),
            alpha_mode: raw_material.alpha_mode,
            alpha_cutoff: raw_material.alpha_cutoff,
            double_sided: raw_material.double_sided,
        });
    }

    let mut meshes = Storage::new();
    for raw_mesh in &raw.meshes {
        let mut primitives = Vec::with_capacity(raw_mesh.primitives.len());
        for raw_primitive in &raw_mesh.primitives {
            let mut targets = Vec::with_capacity(raw_primitive.targets.len());
            for target in &raw_primitive.targets {
                targets.push(bind_attributes(target, accessor_count)?);
            }
            primitives.push(Primitive {
                attributes: bind_attributes(&raw_primitive.attributes, accessor_count)?,
                indices: bind_opt(
                    raw_primitive.indices,
                    accessor_count,
                    "mesh.primitive",
                    "indices",
                )?,
                material: bind_opt(
                    raw_primitive.material,
                    material_count,
                    "mesh.primitive",
                    "material",
                )?,
                mode: raw_primitive.mode,
                targets,
            });
        }
        meshes.insert(Mesh {
            name: raw_mesh.name.clone(),
            primitives,
            weights: raw_mesh.weights.clone(),
        });
    }

    let mut samplers = Storage::new();
    for raw_sampler in &raw.samplers {
        samplers.insert(Sampler {
            name: raw_sampler.name.clone(),
            mag_filter: raw_sampler.mag_filter,
            min_filter: raw_sampler.min_filter,
            wrap_s: raw_sampler.wrap_s,
            wrap_t: raw_sampler.wrap_t,
        });
    }

    let mut images = Storage::new();
    for raw_image in &raw.images {
        let source = match (raw_image.buffer_view, &raw_image.uri) {
            (Some(view), None) => {
                ImageSource::View(bind(view, view_count, "image", "bufferView")?)
            }
            (None, Some(uri)) => {
                ImageSource::Uri(ByteSource::parse(Some(uri.as_str()), &base_dir)?)
            }
            (Some(_), Some(_)) => {
                return Err(Error::Parse(
                    "image declares both uri and bufferView".to_owned(),
                ))
            }
            (None, None) => {
                return Err(Error::Parse(
                    "image declares neither uri nor bufferView".to_owned(),
                ))
            }
        };
        images.insert(Image {
            name: raw_image.name.clone(),
            mime_type: raw_image.mime_type.clone(),
            source,
        });
    }

    let mut textures = Storage::new();
    for raw_texture in &raw.textures {
        textures.insert(Texture {
            name: raw_texture.name.clone(),
            source: bind_opt(raw_texture.source, image_count, "texture", "source")?,
            sampler: bind_opt(raw_texture.sampler, sampler_count, "texture", "sampler")?,
        });
    }

    let mut cameras = Storage::new();
    for raw_camera in raw.cameras {
        let camera = match raw_camera {
            super::raw::Camera::Perspective { perspective, name } => Camera {
                name,
                projection: Projection::Perspective(perspective),
            },
            super::raw::Camera::Orthographic { orthographic, name } => Camera {
                name,
                projection: Projection::Orthographic(orthographic),
            },
        };
        cameras.insert(camera);
    }

    let mut nodes = Storage::new();
    for raw_node in &raw.nodes {
        let mut children = Vec::with_capacity(raw_node.children.len());
        for &child in &raw_node.children {
            children.push(bind(child, node_count, "node", "children")?);
        }
        nodes.insert(Node {
            name: raw_node.name.clone(),
            children,
            mesh: bind_opt(raw_node.mesh, mesh_count, "node", "mesh")?,
            camera: bind_opt(raw_node.camera, camera_count, "node", "camera")?,
            skin: bind_opt(raw_node.skin, skin_count, "node", "skin")?,
            matrix: raw_node.matrix.map(|m| glam::Mat4::from_cols_array(&m)),
            translation: raw_node
                .translation
                .map(glam::Vec3::from_array)
                .unwrap_or(glam::Vec3::ZERO),
            rotation: raw_node
                .rotation
                .map(glam::Quat::from_array)
                .unwrap_or(glam::Quat::IDENTITY),
            scale: raw_node
                .scale
                .map(glam::Vec3::from_array)
                .unwrap_or(glam::Vec3::ONE),
            weights: raw_node.weights.clone(),
        });
    }

    let mut scenes = Storage::new();
    for raw_scene in &raw.scenes {
        let mut scene_nodes = Vec::with_capacity(raw_scene.nodes.len());
        for &node in &raw_scene.nodes {
            scene_nodes.push(bind(node, node_count, "scene", "nodes")?);
        }
        scenes.insert(Scene {
            name: raw_scene.name.clone(),
            nodes: scene_nodes,
        });
    }

    let mut skins = Storage::new();
    for raw_skin in &raw.skins {
        if raw_skin.joints.is_empty() {
            return Err(Error::Parse("skin joints must not be empty".to_owned()));
        }
        let mut joints = Vec::with_capacity(raw_skin.joints.len());
        for &joint in &raw_skin.joints {
            joints.push(bind(joint, node_count, "skin", "joints")?);
        }
        let inverse_bind_matrices: Option<Handle<Accessor>> = bind_opt(
            raw_skin.inverse_bind_matrices,
            accessor_count,
            "skin",
            "inverseBindMatrices",
        )?;
        if let Some(handle) = inverse_bind_matrices {
            let accessor = &raw.accessors[handle.index()];
            if accessor.shape != ElementShape::Mat4 {
                return Err(Error::UnsupportedAccessorType(format!(
                    "inverse bind matrices must be MAT4, got {:?}",
                    accessor.shape
                )));
            }
        }
        skins.insert(Skin {
            name: raw_skin.name.clone(),
            inverse_bind_matrices,
            skeleton: bind_opt(raw_skin.skeleton, node_count, "skin", "skeleton")?,
            joints,
        });
    }

    let mut animations = Storage::new();
    for raw_animation in &raw.animations {
        let sampler_count_local = raw_animation.samplers.len();
        let mut anim_samplers = Vec::with_capacity(sampler_count_local);
        for raw_sampler in &raw_animation.samplers {
            anim_samplers.push(AnimationSampler {
                input: bind(raw_sampler.input, accessor_count, "animation.sampler", "input")?,
                output: bind(
                    raw_sampler.output,
                    accessor_count,
                    "animation.sampler",
                    "output",
                )?,
                interpolation: raw_sampler.interpolation,
            });
        }
        let mut channels = Vec::with_capacity(raw_animation.channels.len());
        for raw_channel in &raw_animation.channels {
            // The sampler reference is local to this animation, not a
            // document-wide collection, so it stays a plain index.
            if raw_channel.sampler >= sampler_count_local {
                return Err(Error::DanglingReference {
                    entity: "animation.channel",
                    field: "sampler",
                    index: raw_channel.sampler,
                    len: sampler_count_local,
                });
            }
            channels.push(Channel {
                sampler: raw_channel.sampler,
                target_node: bind_opt(
                    raw_channel.target.node,
                    node_count,
                    "animation.channel",
                    "target.node",
                )?,
                target_path: raw_channel.target.path,
            });
        }
        animations.insert(Animation {
            name: raw_animation.name.clone(),
            samplers: anim_samplers,
            channels,
        });
    }

    let default_scene = bind_opt(raw.scene, scene_count, "document", "scene")?;

    debug!(
        "resolved document: {} buffers, {} views, {} accessors, {} meshes, {} nodes, {} scenes",
        buffers.len(),
        buffer_views.len(),
        accessors.len(),
        meshes.len(),
        nodes.len(),
        scenes.len(),
    );

    Ok(Document {
        base_dir,
        reader: options.reader,
        embedded,
        asset: raw.asset,
        extensions_used: raw.extensions_used,
        extensions_required: raw.extensions_required,
        default_scene,
        buffers,
        buffer_views,
        accessors,
        meshes,
        materials,
        textures,
        images,
        samplers,
        nodes,
        scenes,
        skins,
        cameras,
        animations,
    })
}
