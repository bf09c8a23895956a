use glam::Vec3;

/// The fixed light rig: one ambient, one hemisphere, two directionals
/// from opposing diagonals. Intensities are part of the look and not
/// user-adjustable.
#[derive(Debug, Clone)]
pub struct LightRig {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub sky_color: Vec3,
    pub ground_color: Vec3,
    pub hemisphere_direction: Vec3,
    pub hemisphere_intensity: f32,
    pub directionals: [DirectionalLight; 2],
}

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub intensity: f32,
}

impl LightRig {
    pub fn new() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 3.0,
            sky_color: Vec3::ONE,
            // 0x444444
            ground_color: Vec3::splat(68.0 / 255.0),
            hemisphere_direction: Vec3::new(0.0, 200.0, 0.0).normalize(),
            hemisphere_intensity: 2.0,
            directionals: [
                DirectionalLight {
                    direction: Vec3::new(1.0, 1.0, 1.0).normalize(),
                    intensity: 2.0,
                },
                DirectionalLight {
                    direction: Vec3::new(-1.0, -1.0, -1.0).normalize(),
                    intensity: 2.0,
                },
            ],
        }
    }

    pub(crate) fn to_uniform(&self, env_intensity: f32, exposure: f32) -> LightsUniform {
        LightsUniform {
            ambient_color: self.ambient_color.to_array(),
            ambient_intensity: self.ambient_intensity,
            sky_color: self.sky_color.to_array(),
            hemisphere_intensity: self.hemisphere_intensity,
            ground_color: self.ground_color.to_array(),
            _pad0: 0.0,
            hemisphere_direction: self.hemisphere_direction.to_array(),
            _pad1: 0.0,
            dir0_direction: self.directionals[0].direction.to_array(),
            dir0_intensity: self.directionals[0].intensity,
            dir1_direction: self.directionals[1].direction.to_array(),
            dir1_intensity: self.directionals[1].intensity,
            env_intensity,
            exposure,
            _pad2: [0.0; 2],
        }
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::new()
    }
}

// 16 byte rows for WGSL alignment
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct LightsUniform {
    ambient_color: [f32; 3],
    ambient_intensity: f32,
    sky_color: [f32; 3],
    hemisphere_intensity: f32,
    ground_color: [f32; 3],
    _pad0: f32,
    hemisphere_direction: [f32; 3],
    _pad1: f32,
    dir0_direction: [f32; 3],
    dir0_intensity: f32,
    dir1_direction: [f32; 3],
    dir1_intensity: f32,
    env_intensity: f32,
    exposure: f32,
    _pad2: [f32; 2],
}
