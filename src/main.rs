use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use crossbeam_channel::Receiver;
use glam::Quat;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use walkman_viewer::animate::{playback_progress, SpinTimer};
use walkman_viewer::camera::Camera;
use walkman_viewer::cli::Cli;
use walkman_viewer::environment::EnvironmentMap;
use walkman_viewer::hud::Hud;
use walkman_viewer::loaders::{install_model, spawn_asset_loader, LoadEvent, LoadTracker};
use walkman_viewer::renderer::Renderer;
use walkman_viewer::scene::{
    MeshData, ReadyLatch, SceneGraph, MODEL_ENV_INTENSITY, VIDEO_PLANE_HEIGHT, VIDEO_PLANE_WIDTH,
};
use walkman_viewer::video::{open_async, StreamError, VideoSource, VideoTexture, FRAME_HEIGHT, FRAME_WIDTH};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// The composed application state: every handle the components need
/// lives here, owned, not in module globals.
struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: SceneGraph,
    camera: Camera,
    hud: Hud,
    video: Option<VideoSource>,
    video_texture: Option<VideoTexture>,
    video_rx: Option<Receiver<std::result::Result<VideoSource, StreamError>>>,
    load_rx: Option<Receiver<LoadEvent>>,
    tracker: LoadTracker,
    latch: ReadyLatch,
    spin: Option<SpinTimer>,
    model_angle: f32,
    started: Instant,
    interacted: bool,
    occluded: bool,
}

impl App {
    fn new(cli: Cli) -> Self {
        let camera = Camera::new(cli.width, cli.height);
        let hud = Hud::new(!cli.no_ui);
        Self {
            cli,
            window: None,
            renderer: None,
            scene: SceneGraph::new(),
            camera,
            hud,
            video: None,
            video_texture: None,
            video_rx: None,
            load_rx: None,
            tracker: LoadTracker::new(0.0),
            latch: ReadyLatch::new(),
            spin: None,
            model_angle: 0.0,
            started: Instant::now(),
            interacted: false,
            occluded: false,
        }
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Runs once, from whichever readiness signal fires last.
    fn attach_video_plane(&mut self) {
        let Some(texture) = self.video_texture.as_ref() else {
            return;
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let mesh = self
            .scene
            .add_mesh(MeshData::plane(VIDEO_PLANE_WIDTH, VIDEO_PLANE_HEIGHT));
        match self.scene.attach_video_plane(mesh) {
            Some(node) => {
                renderer.attach_plane(&self.scene, node, texture);
                log::info!("video plane attached");
            }
            // Missing anchor: the overlay is simply skipped.
            None => log::debug!("video plane not attached (no anchor node)"),
        }
    }

    fn drain_load_events(&mut self) {
        let Some(rx) = self.load_rx.as_ref() else {
            return;
        };
        let events: Vec<LoadEvent> = rx.try_iter().collect();
        for event in events {
            match event {
                LoadEvent::ItemsQueued(items) => self.tracker.queue(items),
                LoadEvent::ItemLoaded => self.tracker.item_loaded(),
                LoadEvent::ModelLoaded(model) => {
                    install_model(&mut self.scene, *model);
                    self.scene.apply_env_intensity(MODEL_ENV_INTENSITY);
                    if let Some(renderer) = self.renderer.as_mut() {
                        renderer.upload_scene(&self.scene);
                    }
                    self.tracker.mark_model_done();
                    if self.spin.is_none() {
                        self.spin = Some(SpinTimer::new(self.now_ms()));
                    }
                    if self.latch.model_ready() {
                        self.attach_video_plane();
                    }
                }
                LoadEvent::EnvironmentLoaded(image) => {
                    if let Some(renderer) = self.renderer.as_mut() {
                        let environment =
                            EnvironmentMap::new(renderer.device(), renderer.queue(), &image);
                        renderer.set_environment(environment);
                    }
                    self.tracker.mark_environment_done();
                }
                LoadEvent::Failed(message) => {
                    // Not recoverable; the loading screen stays up.
                    log::error!("asset load failed: {}", message);
                    self.tracker.mark_failed();
                }
            }
            self.hud.set_load_percent(self.tracker.percent());
        }
    }

    /// Picks up the stream once the background open finishes. The
    /// texture wrapper is created at that point, which is also the
    /// video half of the attachment join.
    fn poll_video_open(&mut self) {
        let Some(rx) = self.video_rx.as_ref() else {
            return;
        };
        let Ok(result) = rx.try_recv() else {
            return;
        };
        self.video_rx = None;

        match result {
            Ok(source) => {
                if let Some(renderer) = self.renderer.as_ref() {
                    self.video_texture =
                        Some(VideoTexture::new(renderer.device(), FRAME_WIDTH, FRAME_HEIGHT));
                }
                self.video = Some(source);
                if self.latch.video_ready() {
                    self.attach_video_plane();
                }
            }
            // Stream unusable: logged, playback never starts.
            Err(err) => log::error!("{}", err),
        }
    }

    fn update_video(&mut self) {
        let Some(video) = self.video.as_mut() else {
            self.hud.set_progress(None);
            return;
        };

        video.poll();

        // Autoplay once enough is buffered, while the window is visible.
        // A blocked start is not an error state; the first click also
        // starts playback.
        if video.paused() && video.ready_to_play() && !self.occluded {
            video.play();
        }

        if let (Some(texture), Some(frame), Some(renderer)) = (
            self.video_texture.as_ref(),
            video.latest_frame(),
            self.renderer.as_ref(),
        ) {
            texture.update(renderer.queue(), frame);
        }

        self.hud.set_progress(playback_progress(
            video.current_time(),
            video.duration(),
            video.paused(),
            video.ended(),
        ));
    }

    fn redraw(&mut self) {
        let now_ms = self.now_ms();

        self.drain_load_events();
        self.poll_video_open();

        if self.tracker.should_reveal(now_ms) && self.hud.loading_visible() {
            self.hud.reveal();
            log::info!("assets ready, revealing viewport");
        }

        self.update_video();

        if let (Some(spin), Some(model)) = (self.spin.as_mut(), self.scene.model_root()) {
            self.model_angle = spin.advance(now_ms, self.model_angle);
            self.scene
                .node_mut(model)
                .set_rotation(Quat::from_rotation_z(self.model_angle));
        }

        if let (Some(renderer), Some(window)) = (self.renderer.as_mut(), self.window.as_ref()) {
            renderer.update_transforms(&self.scene);
            match renderer.render(window, &self.camera, &self.hud) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = renderer.size();
                    renderer.resize(size);
                }
                Err(err) => log::error!("render error: {}", err),
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Walkman")
                .with_inner_size(winit::dpi::LogicalSize::new(self.cli.width, self.cli.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let renderer =
            match pollster::block_on(Renderer::new(window.clone(), &self.scene, &self.camera)) {
                Ok(renderer) => renderer,
                Err(e) => {
                    log::error!("failed to initialize renderer: {}", e);
                    event_loop.exit();
                    return;
                }
            };

        self.window = Some(window);
        self.renderer = Some(renderer);

        // Asset loading and the video pipeline start concurrently; the
        // readiness latch sorts out whichever finishes last.
        self.load_rx = Some(spawn_asset_loader(
            self.cli.model.clone(),
            self.cli.environment.clone(),
        ));
        self.video_rx = Some(open_async(self.cli.stream.clone()));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            if renderer.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                self.camera.set_viewport(size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::Occluded(occluded) => self.occluded = occluded,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => {
                // First interaction unmutes and starts playback.
                if !self.interacted {
                    self.interacted = true;
                    if let Some(video) = self.video.as_mut() {
                        video.unmute();
                        video.set_volume(1.0);
                        video.play();
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli);

    log::info!("walkman-viewer starting");
    event_loop.run_app(&mut app)?;

    Ok(())
}
