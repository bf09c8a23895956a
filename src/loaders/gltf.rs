use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use std::path::Path;

use crate::scene::{
    MaterialData, MeshData, Node, NodeId, SceneGraph, TextureData, MODEL_SCALE,
};

/// Model payload produced on the loader thread. Node hierarchy is
/// flattened parent-before-child so installation is a single pass.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub nodes: Vec<ModelNode>,
    pub meshes: Vec<MeshData>,
    pub textures: Vec<TextureData>,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: Option<String>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Index into `nodes`; `None` for the asset's scene roots.
    pub parent: Option<usize>,
    /// Index into `meshes`.
    pub mesh: Option<usize>,
}

/// Loads the glTF asset: node hierarchy with names preserved, mesh
/// primitives with positions/normals/UVs, base-color materials and
/// their textures converted to RGBA8.
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel> {
    let path = path.as_ref();
    log::info!("loading model {:?}", path);

    let (document, buffers, images) =
        gltf::import(path).with_context(|| format!("failed to load glTF file {:?}", path))?;

    log::debug!(
        "glTF: {} nodes, {} meshes, {} materials, {} images",
        document.nodes().count(),
        document.meshes().count(),
        document.materials().count(),
        images.len()
    );

    let textures: Vec<TextureData> = images.iter().map(convert_image).collect();

    let mut model = LoadedModel {
        nodes: Vec::new(),
        meshes: Vec::new(),
        textures,
    };

    for scene in document.scenes() {
        for node in scene.nodes() {
            flatten_node(&node, &buffers, None, &mut model)?;
        }
    }

    log::info!(
        "model loaded: {} nodes, {} meshes, {} textures",
        model.nodes.len(),
        model.meshes.len(),
        model.textures.len()
    );
    Ok(model)
}

/// Installs a loaded model into the scene graph under a fresh root
/// with the fixed placement (origin position, uniform model scale).
/// Returns the model root id and records it on the graph.
pub fn install_model(scene: &mut SceneGraph, model: LoadedModel) -> NodeId {
    let mesh_base = scene.meshes.len();
    let texture_base = scene.textures.len();

    for texture in model.textures {
        scene.add_texture(texture);
    }
    for mut mesh in model.meshes {
        if let Some(texture) = mesh.material.base_color_texture.as_mut() {
            *texture += texture_base;
        }
        scene.add_mesh(mesh);
    }

    let mut root = Node::named("ModelRoot");
    root.set_position(Vec3::ZERO);
    root.set_scale(Vec3::splat(MODEL_SCALE));
    let root_id = scene.add_node(scene.root(), root);

    // Parent-before-child order lets one pass map payload indices to
    // graph node ids.
    let mut ids = Vec::with_capacity(model.nodes.len());
    for source in model.nodes {
        let parent = source.parent.map(|i| ids[i]).unwrap_or(root_id);
        let mut node = Node::new(source.translation, source.rotation, source.scale);
        node.name = source.name;
        node.set_mesh(source.mesh.map(|m| m + mesh_base));
        ids.push(scene.add_node(parent, node));
    }

    scene.set_model_root(root_id);
    root_id
}

fn flatten_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent: Option<usize>,
    model: &mut LoadedModel,
) -> Result<()> {
    let (translation, rotation, scale) = node.transform().decomposed();

    let index = model.nodes.len();
    model.nodes.push(ModelNode {
        name: node.name().map(str::to_string),
        translation: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
        parent,
        mesh: None,
    });

    if let Some(mesh) = node.mesh() {
        let mut primitives = mesh.primitives().peekable();
        let mut first = true;
        while let Some(primitive) = primitives.next() {
            let data = read_primitive(&primitive, buffers)?;
            let mesh_index = model.meshes.len();
            model.meshes.push(data);

            if first && primitives.peek().is_none() {
                // Single-primitive mesh sits directly on the node.
                model.nodes[index].mesh = Some(mesh_index);
            } else {
                model.nodes.push(ModelNode {
                    name: None,
                    translation: Vec3::ZERO,
                    rotation: Quat::IDENTITY,
                    scale: Vec3::ONE,
                    parent: Some(index),
                    mesh: Some(mesh_index),
                });
            }
            first = false;
        }
    }

    for child in node.children() {
        flatten_node(&child, buffers, Some(index), model)?;
    }

    Ok(())
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Result<MeshData> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("mesh primitive has no positions")?
        .collect();

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => vec![[0.0, 0.0, 1.0]; positions.len()],
    };

    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(coords) => coords.into_f32().collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let pbr = primitive.material().pbr_metallic_roughness();
    let base_color = pbr.base_color_factor();
    let material = match pbr.base_color_texture() {
        Some(info) => {
            MaterialData::new_textured(base_color, info.texture().source().index())
        }
        None => MaterialData::new_color(base_color),
    };

    Ok(MeshData {
        positions,
        normals,
        uvs,
        indices,
        material,
    })
}

/// Normalize source pixel formats to RGBA8, as the renderer expects.
fn convert_image(image: &gltf::image::Data) -> TextureData {
    let data = match image.format {
        gltf::image::Format::R8G8B8A8 => image.pixels.clone(),
        gltf::image::Format::R8G8B8 => {
            let mut rgba = Vec::with_capacity(image.pixels.len() / 3 * 4);
            for rgb in image.pixels.chunks(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            rgba
        }
        gltf::image::Format::R8G8 => {
            let mut rgba = Vec::with_capacity(image.pixels.len() / 2 * 4);
            for rg in image.pixels.chunks(2) {
                rgba.push(rg[0]);
                rgba.push(rg[1]);
                rgba.push(0);
                rgba.push(255);
            }
            rgba
        }
        other => {
            log::warn!("unsupported texture format {:?}, substituting white", other);
            vec![255; (image.width * image.height * 4) as usize]
        }
    };

    TextureData {
        width: image.width,
        height: image.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::VIDEO_ANCHOR_NODE;

    fn sample_model() -> LoadedModel {
        LoadedModel {
            nodes: vec![
                ModelNode {
                    name: Some("Body".into()),
                    translation: Vec3::new(0.0, 1.0, 0.0),
                    rotation: Quat::IDENTITY,
                    scale: Vec3::ONE,
                    parent: None,
                    mesh: Some(0),
                },
                ModelNode {
                    name: Some(VIDEO_ANCHOR_NODE.into()),
                    translation: Vec3::new(0.1, 0.0, 0.0),
                    rotation: Quat::IDENTITY,
                    scale: Vec3::ONE,
                    parent: Some(0),
                    mesh: None,
                },
            ],
            meshes: vec![MeshData::plane(1.0, 1.0)],
            textures: vec![],
        }
    }

    #[test]
    fn install_preserves_hierarchy_and_names() {
        let mut scene = SceneGraph::new();
        let root = install_model(&mut scene, sample_model());

        assert_eq!(scene.model_root(), Some(root));
        assert_eq!(scene.node(root).scale(), Vec3::splat(MODEL_SCALE));

        let anchor = scene.find_by_name(VIDEO_ANCHOR_NODE).expect("anchor installed");
        let body = scene.find_by_name("Body").unwrap();
        assert_eq!(scene.node(anchor).parent(), Some(body));
        assert_eq!(scene.node(body).parent(), Some(root));
    }

    #[test]
    fn install_offsets_mesh_ids() {
        let mut scene = SceneGraph::new();
        // Pre-existing mesh shifts the payload's mesh indices.
        scene.add_mesh(MeshData::plane(2.0, 2.0));
        install_model(&mut scene, sample_model());

        let body = scene.find_by_name("Body").unwrap();
        assert_eq!(scene.node(body).mesh(), Some(1));
        assert_eq!(scene.meshes.len(), 2);
    }

    #[test]
    fn install_offsets_texture_ids() {
        let mut scene = SceneGraph::new();
        scene.add_texture(TextureData { width: 1, height: 1, data: vec![0; 4] });

        let mut model = sample_model();
        model.textures.push(TextureData { width: 2, height: 2, data: vec![255; 16] });
        model.meshes[0].material = MaterialData::new_textured([1.0; 4], 0);
        install_model(&mut scene, model);

        assert_eq!(scene.meshes[0].material.base_color_texture, Some(1));
    }
}
