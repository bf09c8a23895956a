use criterion::{criterion_group, criterion_main, Criterion};
use glam::{Quat, Vec3};
use walkman_viewer::scene::{Node, SceneGraph};

/// Scene shaped like the loaded asset: a root, a few dozen group nodes,
/// a few hundred leaves.
fn build_scene(groups: usize, leaves_per_group: usize) -> SceneGraph {
    let mut scene = SceneGraph::new();
    let mut model = Node::named("ModelRoot");
    model.set_scale(Vec3::splat(200.0));
    let model = scene.add_node(scene.root(), model);
    scene.set_model_root(model);

    for g in 0..groups {
        let mut group = Node::named(format!("Group{}", g));
        group.set_position(Vec3::new(g as f32, 0.0, 0.0));
        group.set_rotation(Quat::from_rotation_y(0.01 * g as f32));
        let group = scene.add_node(model, group);
        for l in 0..leaves_per_group {
            let mut leaf = Node::identity();
            leaf.set_position(Vec3::new(0.0, l as f32 * 0.1, 0.0));
            scene.add_node(group, leaf);
        }
    }
    scene
}

fn bench_world_transforms(c: &mut Criterion) {
    let scene = build_scene(32, 16);

    c.bench_function("world_transforms_full_pass", |b| {
        b.iter(|| std::hint::black_box(scene.world_transforms()))
    });

    let anchor = scene.find_by_name("Group16").unwrap();
    c.bench_function("world_transform_single_node", |b| {
        b.iter(|| std::hint::black_box(scene.world_transform(anchor)))
    });

    c.bench_function("find_by_name", |b| {
        b.iter(|| std::hint::black_box(scene.find_by_name("Group31")))
    });
}

criterion_group!(benches, bench_world_transforms);
criterion_main!(benches);
