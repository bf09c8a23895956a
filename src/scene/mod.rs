pub mod light;
pub mod node;

pub use light::{DirectionalLight, LightRig};
pub use node::{Node, NodeId};

use glam::{Mat4, Quat, Vec3};

pub type MeshId = usize;
pub type TextureId = usize;

/// Name of the model sub-node the video overlay anchors to.
pub const VIDEO_ANCHOR_NODE: &str = "Glass2";

/// Video plane dimensions, 16:9.
pub const VIDEO_PLANE_WIDTH: f32 = 16.0;
pub const VIDEO_PLANE_HEIGHT: f32 = 9.0;

// Hand-tuned calibration for this specific model asset. The offset,
// the extra rotations and the mirrored scale axis line the plane up
// with the Walkman's glass window; change the asset and these stop
// making sense.
pub const VIDEO_PLANE_OFFSET: Vec3 = Vec3::new(-0.5, 0.06, 0.05);
pub const VIDEO_PLANE_TILT_X: f32 = 0.6;
pub const VIDEO_PLANE_SCALE: Vec3 = Vec3::new(-0.29, 0.29, 0.29);

/// Uniform scale applied to the loaded model.
pub const MODEL_SCALE: f32 = 200.0;

/// Environment intensity applied to every model material after load.
pub const MODEL_ENV_INTENSITY: f32 = 2.0;

/// CPU-side mesh geometry, uploaded once by the renderer.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material: MaterialData,
}

#[derive(Debug, Clone)]
pub struct MaterialData {
    pub base_color: [f32; 4],
    pub base_color_texture: Option<TextureId>,
    pub env_intensity: f32,
}

impl MaterialData {
    pub fn new_color(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            base_color_texture: None,
            env_intensity: 1.0,
        }
    }

    pub fn new_textured(base_color: [f32; 4], texture: TextureId) -> Self {
        Self {
            base_color,
            base_color_texture: Some(texture),
            env_intensity: 1.0,
        }
    }
}

/// RGBA8 texture payload loaded from the model.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl MeshData {
    /// Flat rectangle in the XY plane, centered at the origin, facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self {
            positions: vec![
                [-hw, -hh, 0.0],
                [hw, -hh, 0.0],
                [hw, hh, 0.0],
                [-hw, hh, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            // V runs top-to-bottom; the video texture is not V-flipped.
            uvs: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
            material: MaterialData::new_color([1.0, 1.0, 1.0, 1.0]),
        }
    }
}

/// The scene: node hierarchy, mesh/texture storage and the light rig.
/// One of these exists for the life of the process.
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
    pub meshes: Vec<MeshData>,
    pub textures: Vec<TextureData>,
    pub lights: LightRig,
    model_root: Option<NodeId>,
    video_plane: Option<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(Node::named("Scene"));
        Self {
            nodes,
            root: 0,
            meshes: Vec::new(),
            textures: Vec::new(),
            lights: LightRig::new(),
            model_root: None,
            video_plane: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_node(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = self.nodes.len();
        node.set_parent(Some(parent));
        self.nodes.push(node);
        self.nodes[parent].add_child(id);
        id
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_texture(&mut self, texture: TextureData) -> TextureId {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Root node of the loaded model, once the loader has installed it.
    pub fn model_root(&self) -> Option<NodeId> {
        self.model_root
    }

    pub fn set_model_root(&mut self, id: NodeId) {
        self.model_root = Some(id);
    }

    pub fn video_plane(&self) -> Option<NodeId> {
        self.video_plane
    }

    /// Depth-first search for a node by name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.nodes[id].name.as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(self.nodes[id].children().iter().copied());
        }
        None
    }

    /// World matrix of a node, composed root-down.
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let mut chain = self.nodes[id].local_transform();
        let mut current = self.nodes[id].parent();
        while let Some(parent) = current {
            chain = self.nodes[parent].local_transform() * chain;
            current = self.nodes[parent].parent();
        }
        chain
    }

    /// World matrices for every node, index-aligned with node ids.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let m = parent_world * self.nodes[id].local_transform();
            world[id] = m;
            for &child in self.nodes[id].children() {
                stack.push((child, m));
            }
        }
        world
    }

    /// Apply the fixed environment intensity to every mesh material.
    /// Runs once, when the model finishes loading.
    pub fn apply_env_intensity(&mut self, intensity: f32) {
        for mesh in &mut self.meshes {
            mesh.material.env_intensity = intensity;
        }
    }

    /// Place the video plane against the anchor surface.
    ///
    /// Finds the anchor node by name, converts its world position into
    /// the anchor's parent frame, then builds the plane node there with
    /// the calibration offset, flip and tilt. The plane is parented
    /// under the anchor's *parent* so it shares the anchor's local
    /// frame. Returns the plane node, or `None` (silently) when the
    /// anchor is missing or the plane already exists.
    pub fn attach_video_plane(&mut self, mesh: MeshId) -> Option<NodeId> {
        if self.video_plane.is_some() {
            return None;
        }
        let anchor = self.find_by_name(VIDEO_ANCHOR_NODE)?;
        let parent = self.nodes[anchor].parent()?;

        let (_, anchor_world_rotation, anchor_world_position) =
            self.world_transform(anchor).to_scale_rotation_translation();
        let local_position = self
            .world_transform(parent)
            .inverse()
            .transform_point3(anchor_world_position);

        let rotation = anchor_world_rotation
            * Quat::from_rotation_y(std::f32::consts::PI)
            * Quat::from_rotation_x(VIDEO_PLANE_TILT_X);

        let mut plane = Node::new(
            local_position + VIDEO_PLANE_OFFSET,
            rotation,
            VIDEO_PLANE_SCALE,
        );
        plane.name = Some("VideoPlane".to_string());
        plane.set_mesh(Some(mesh));

        let id = self.add_node(parent, plane);
        self.video_plane = Some(id);
        Some(id)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-slot readiness join for the video-plane attachment: the model
/// load and the video texture complete independently and in either
/// order, possibly more than once, but the dependent action must run
/// exactly once. Each `*_ready` call returns true only on the call
/// that completes the pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadyLatch {
    model: bool,
    video: bool,
    fired: bool,
}

impl ReadyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_ready(&mut self) -> bool {
        self.model = true;
        self.try_fire()
    }

    pub fn video_ready(&mut self) -> bool {
        self.video = true;
        self.try_fire()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    fn try_fire(&mut self) -> bool {
        if self.fired || !(self.model && self.video) {
            return false;
        }
        self.fired = true;
        true
    }
}
