use glam::{Mat4, Quat, Vec3};

use super::MeshId;

pub type NodeId = usize;

/// A node in the scene hierarchy. Transforms are local TRS; world
/// matrices are derived by the graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: Option<MeshId>,
}

impl Node {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            name: None,
            position,
            rotation,
            scale,
            parent: None,
            children: Vec::new(),
            mesh: None,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    pub fn named(name: impl Into<String>) -> Self {
        let mut node = Self::identity();
        node.name = Some(name.into());
        node
    }

    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Local matrix in TRS order (translation * rotation * scale).
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(super) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(super) fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Option<MeshId>) {
        self.mesh = mesh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_transform_is_trs_order() {
        let node = Node::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::splat(2.0),
        );

        // Scale then rotate then translate: (1,0,0) -> (2,0,0) -> (0,2,0) -> (1,4,3)
        let p = node.local_transform().transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 4.0, 3.0)).length() < 1e-5, "got {:?}", p);
    }

    #[test]
    fn children_are_not_duplicated() {
        let mut node = Node::identity();
        node.add_child(3);
        node.add_child(3);
        assert_eq!(node.children(), &[3]);
    }
}
