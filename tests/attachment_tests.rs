use glam::{Quat, Vec3};
use walkman_viewer::scene::{
    MeshData, Node, ReadyLatch, SceneGraph, VIDEO_ANCHOR_NODE, VIDEO_PLANE_HEIGHT,
    VIDEO_PLANE_OFFSET, VIDEO_PLANE_SCALE, VIDEO_PLANE_WIDTH,
};

fn build_scene_with_anchor() -> SceneGraph {
    let mut scene = SceneGraph::new();

    let mut model = Node::named("ModelRoot");
    model.set_scale(Vec3::splat(200.0));
    let model = scene.add_node(scene.root(), model);
    scene.set_model_root(model);

    let mut deck = Node::named("Deck");
    deck.set_position(Vec3::new(0.02, 0.01, 0.0));
    deck.set_rotation(Quat::from_rotation_y(0.3));
    let deck = scene.add_node(model, deck);

    let mut anchor = Node::named(VIDEO_ANCHOR_NODE);
    anchor.set_position(Vec3::new(0.005, 0.002, 0.001));
    scene.add_node(deck, anchor);

    scene
}

fn plane_mesh(scene: &mut SceneGraph) -> usize {
    scene.add_mesh(MeshData::plane(VIDEO_PLANE_WIDTH, VIDEO_PLANE_HEIGHT))
}

#[cfg(test)]
mod single_attachment_tests {
    use super::*;

    #[test]
    fn attaches_once_for_any_signal_ordering() {
        // model first, then video
        let mut scene = build_scene_with_anchor();
        let mut latch = ReadyLatch::new();
        let mut attachments = 0;

        if latch.model_ready() {
            attachments += 1;
        }
        if latch.video_ready() {
            let mesh = plane_mesh(&mut scene);
            assert!(scene.attach_video_plane(mesh).is_some());
            attachments += 1;
        }
        assert_eq!(attachments, 1);

        // video first, then model
        let mut scene = build_scene_with_anchor();
        let mut latch = ReadyLatch::new();
        let mut attachments = 0;

        if latch.video_ready() {
            attachments += 1;
        }
        if latch.model_ready() {
            let mesh = plane_mesh(&mut scene);
            assert!(scene.attach_video_plane(mesh).is_some());
            attachments += 1;
        }
        assert_eq!(attachments, 1);
    }

    #[test]
    fn repeated_signals_never_reattach() {
        let mut scene = build_scene_with_anchor();
        let mut latch = ReadyLatch::new();
        let mut attachments = 0;

        for _ in 0..3 {
            if latch.model_ready() {
                attachments += 1;
            }
            if latch.video_ready() {
                attachments += 1;
            }
        }
        assert_eq!(attachments, 1, "latch fired more than once");

        // Even calling the scene attachment directly is guarded.
        let mesh = plane_mesh(&mut scene);
        assert!(scene.attach_video_plane(mesh).is_some());
        let mesh = plane_mesh(&mut scene);
        assert!(scene.attach_video_plane(mesh).is_none());
    }

    #[test]
    fn missing_anchor_is_silent() {
        let mut scene = SceneGraph::new();
        let model = scene.add_node(scene.root(), Node::named("ModelRoot"));
        scene.set_model_root(model);

        let mesh = plane_mesh(&mut scene);
        assert!(scene.attach_video_plane(mesh).is_none());
        assert!(scene.video_plane().is_none());
    }
}

#[cfg(test)]
mod calibration_tests {
    use super::*;

    #[test]
    fn plane_sits_in_the_anchor_parent_frame() {
        let mut scene = build_scene_with_anchor();
        let mesh = plane_mesh(&mut scene);
        let plane = scene.attach_video_plane(mesh).unwrap();

        let deck = scene.find_by_name("Deck").unwrap();
        assert_eq!(scene.node(plane).parent(), Some(deck));

        // Position: the anchor's position in the parent frame plus the
        // hand-tuned offset. With no extra transforms between parent
        // and anchor that is just the anchor's local position.
        let anchor = scene.find_by_name(VIDEO_ANCHOR_NODE).unwrap();
        let expected = scene.node(anchor).position() + VIDEO_PLANE_OFFSET;
        assert!((scene.node(plane).position() - expected).length() < 1e-5);
    }

    #[test]
    fn plane_scale_mirrors_one_axis() {
        let mut scene = build_scene_with_anchor();
        let mesh = plane_mesh(&mut scene);
        let plane = scene.attach_video_plane(mesh).unwrap();

        let scale = scene.node(plane).scale();
        assert_eq!(scale, VIDEO_PLANE_SCALE);
        assert!(scale.x < 0.0, "X axis is mirrored");
        assert_eq!(scale.y, -scale.x);
    }

    #[test]
    fn plane_orientation_derives_from_anchor_world_rotation() {
        let mut scene = build_scene_with_anchor();
        let mesh = plane_mesh(&mut scene);
        let plane = scene.attach_video_plane(mesh).unwrap();

        let anchor = scene.find_by_name(VIDEO_ANCHOR_NODE).unwrap();
        let (_, anchor_world, _) = scene
            .world_transform(anchor)
            .to_scale_rotation_translation();
        let expected = anchor_world
            * Quat::from_rotation_y(std::f32::consts::PI)
            * Quat::from_rotation_x(0.6);

        let actual = scene.node(plane).rotation();
        // Quaternions are equal up to sign.
        let dot = expected.dot(actual).abs();
        assert!(dot > 1.0 - 1e-5, "rotation mismatch, |dot| = {}", dot);
    }

    #[test]
    fn plane_mesh_is_sixteen_by_nine() {
        let plane = MeshData::plane(VIDEO_PLANE_WIDTH, VIDEO_PLANE_HEIGHT);
        let xs: Vec<f32> = plane.positions.iter().map(|p| p[0]).collect();
        let ys: Vec<f32> = plane.positions.iter().map(|p| p[1]).collect();

        let width = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        let height = ys.iter().cloned().fold(f32::MIN, f32::max)
            - ys.iter().cloned().fold(f32::MAX, f32::min);

        assert_eq!(width, 16.0);
        assert_eq!(height, 9.0);
        assert_eq!(plane.indices.len(), 6, "two triangles");
    }
}
