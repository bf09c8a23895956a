use glam::{Mat4, Vec3};

pub const FOV_Y: f32 = 75.0_f32 * std::f32::consts::PI / 180.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 10000.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(5.4, 20.0, 15.0);
pub const CAMERA_TARGET: Vec3 = Vec3::new(5.9, 4.0, 3.0);

/// Fixed perspective camera. No orbit or pan controls; the only thing
/// that ever changes after startup is the aspect ratio on resize.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    aspect: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: CAMERA_POSITION,
            target: CAMERA_TARGET,
            aspect: width as f32 / height as f32,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Recompute the projection aspect from new viewport dimensions.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(FOV_Y, self.aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection().to_cols_array_2d(),
            position: self.position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Camera uniform buffer data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect_ratio() {
        let mut camera = Camera::new(800, 600);
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);

        camera.set_viewport(1920, 1080);
        assert!((camera.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_viewport_keeps_last_aspect() {
        let mut camera = Camera::new(800, 600);
        camera.set_viewport(0, 1080);
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn look_at_target_projects_to_screen_center() {
        let camera = Camera::new(1280, 720);
        let clip = camera.view_projection() * CAMERA_TARGET.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "target off-center: {:?}", ndc);
        assert!(clip.w > 0.0, "target in front of the camera");
    }

    #[test]
    fn projection_respects_clip_planes() {
        let camera = Camera::new(1280, 720);
        let forward = (CAMERA_TARGET - CAMERA_POSITION).normalize();

        let near_point = CAMERA_POSITION + forward * (NEAR_PLANE + 0.01);
        let clip = camera.view_projection() * near_point.extend(1.0);
        let ndc_z = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&ndc_z), "near point inside depth range");

        let far_point = CAMERA_POSITION + forward * (FAR_PLANE * 1.5);
        let clip = camera.view_projection() * far_point.extend(1.0);
        assert!(clip.z / clip.w > 1.0, "beyond far plane is clipped");
    }
}
