//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in the fragment shader using signed distance
//! fields: a side view of the tower, looking along +z at the ball's side.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::camera::GoalColumn;
use crate::normalize_angle;
use crate::session::Session;
use crate::settings::Settings;
use crate::sim::{ContactKind, GameState};

/// Maximum ring pieces drawn per frame (visible rings only)
const MAX_PIECES: usize = 256;
/// Maximum debris boxes
const MAX_DEBRIS: usize = 128;
/// Maximum splash particles
const MAX_PARTICLES: usize = 128;
/// Maximum trail points
const MAX_TRAIL: usize = 32;

/// Rings this far outside the view are culled
const CULL_MARGIN: f32 = 1.0;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Globals {
    plate_color: [f32; 4],  // offset 0
    base_color: [f32; 4],   // offset 16
    glow_color: [f32; 4],   // offset 32
    resolution: [f32; 2],   // offset 48
    time: f32,              // offset 56
    camera_y: f32,          // offset 60
    view_height: f32,       // offset 64
    ball_y: f32,            // offset 68
    ball_radius: f32,       // offset 72
    shield: f32,            // offset 76 - 1 while invincible
    meter: f32,             // offset 80 - invincibility charge 0-1
    ring_inner: f32,        // offset 84
    ring_outer: f32,        // offset 88
    ring_thickness: f32,    // offset 92
    pole_radius: f32,       // offset 96
    goal_y: f32,            // offset 100
    goal_thickness: f32,    // offset 104
    column_top: f32,        // offset 108
    column_bottom: f32,     // offset 112
    piece_count: u32,       // offset 116
    debris_count: u32,      // offset 120
    particle_count: u32,    // offset 124
    trail_count: u32,       // offset 128
    glow_enabled: u32,      // offset 132
    _pad: [u32; 2],         // pad to 144 bytes
}

/// Attached ring piece in world angles
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PieceData {
    y: f32,
    theta_start: f32,
    theta_end: f32,
    kind: u32, // 0=passable, 1=hazard
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DebrisData {
    pos: [f32; 2],
    size: [f32; 2], // chord width, ring thickness
    spin: f32,
    kind: u32,
    alpha: f32,
    _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleData {
    pos: [f32; 2],
    size: f32,
    life: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TrailData {
    pos: [f32; 2],
    radius: f32,
    alpha: f32,
}

fn kind_code(kind: ContactKind) -> u32 {
    match kind {
        ContactKind::Passable => 0,
        ContactKind::Hazard => 1,
        ContactKind::Finish => 2,
    }
}

/// Everything uploaded for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SceneData {
    pub globals: Globals,
    pub pieces: Vec<PieceData>,
    pub debris: Vec<DebrisData>,
    pub particles: Vec<ParticleData>,
    pub trail: Vec<TrailData>,
}

impl SceneData {
    pub fn collect(
        state: &GameState,
        camera_y: f32,
        column: GoalColumn,
        settings: &Settings,
        resolution: [f32; 2],
        time: f32,
    ) -> Self {
        let tower = &state.tuning.tower;
        let view_height = state.tuning.camera.view_height;
        let reach = view_height / 2.0 + CULL_MARGIN;

        let mut pieces = Vec::new();
        let mut debris = Vec::new();
        for group in &state.groups {
            if (group.y - camera_y).abs() > reach {
                continue;
            }
            if group.attached {
                let yaw = group.world_yaw(state.tower.angle);
                for piece in &group.pieces {
                    if pieces.len() >= MAX_PIECES {
                        break;
                    }
                    pieces.push(PieceData {
                        y: group.y,
                        theta_start: normalize_angle(piece.arc.theta_start + yaw),
                        theta_end: normalize_angle(piece.arc.theta_end + yaw),
                        kind: kind_code(piece.kind),
                    });
                }
            } else {
                let alpha = group
                    .despawn_timer
                    .map(|t| (t / state.tuning.shatter.despawn_secs).clamp(0.0, 1.0))
                    .unwrap_or(0.0);
                for piece in &group.pieces {
                    let Some(body) = &piece.debris else { continue };
                    if debris.len() >= MAX_DEBRIS {
                        break;
                    }
                    debris.push(DebrisData {
                        pos: [body.pos.x, body.pos.y],
                        size: [piece.arc.outer_chord(), tower.ring_thickness],
                        spin: if settings.reduced_motion { 0.0 } else { body.spin },
                        kind: kind_code(piece.kind),
                        alpha,
                        _pad: 0,
                    });
                }
            }
        }

        let particles: Vec<ParticleData> = state
            .particles
            .iter()
            .take(settings.max_particles().min(MAX_PARTICLES))
            .map(|p| ParticleData {
                pos: [p.pos.x, p.pos.y],
                size: p.size,
                life: p.life,
            })
            .collect();

        let player = &state.player;
        let trail_len = settings.trail_points().min(MAX_TRAIL).min(player.trail.len());
        let trail: Vec<TrailData> = player
            .trail
            .iter()
            .take(trail_len)
            .enumerate()
            .map(|(i, point)| {
                let t = i as f32 / trail_len.max(1) as f32;
                TrailData {
                    pos: [0.0, point.y],
                    radius: player.radius * (1.0 - 0.7 * t),
                    alpha: (1.0 - t) * 0.5,
                }
            })
            .collect();

        let palette = &state.palette;
        let globals = Globals {
            plate_color: palette.plate.to_array(),
            base_color: palette.base.to_array(),
            glow_color: palette.glow[0].to_array(),
            resolution,
            time,
            camera_y,
            view_height,
            ball_y: player.y,
            ball_radius: player.radius,
            shield: if player.invincibility.active { 1.0 } else { 0.0 },
            meter: player
                .invincibility
                .fill(state.tuning.player.invincibility_duration),
            ring_inner: tower.ring_inner,
            ring_outer: tower.ring_outer,
            ring_thickness: tower.ring_thickness,
            pole_radius: tower.pole_radius,
            goal_y: state.goal.y,
            goal_thickness: state.goal.thickness,
            column_top: column.top(),
            column_bottom: column.bottom(),
            piece_count: pieces.len() as u32,
            debris_count: debris.len() as u32,
            particle_count: particles.len() as u32,
            trail_count: trail.len() as u32,
            glow_enabled: settings.quality.glow_enabled() as u32,
            _pad: [0; 2],
        };

        Self {
            globals,
            pieces,
            debris,
            particles,
            trail,
        }
    }
}

/// Pad a slice to a fixed buffer length
fn padded<T: Pod + Zeroable>(items: &[T], len: usize) -> Vec<T> {
    let mut out = vec![T::zeroed(); len];
    let n = items.len().min(len);
    out[..n].copy_from_slice(&items[..n]);
    out
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    pieces_buffer: wgpu::Buffer,
    debris_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,
    trail_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_buffer<T>(device: &wgpu::Device, label: &str, len: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (std::mem::size_of::<T>() * len) as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, RendererError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RendererError::NoSurfaceFormat)?;
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let pieces_buffer = storage_buffer::<PieceData>(&device, "pieces", MAX_PIECES);
        let debris_buffer = storage_buffer::<DebrisData>(&device, "debris", MAX_DEBRIS);
        let particles_buffer = storage_buffer::<ParticleData>(&device, "particles", MAX_PARTICLES);
        let trail_buffer = storage_buffer::<TrailData>(&device, "trail", MAX_TRAIL);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pieces_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: debris_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: particles_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: trail_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // Fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            pieces_buffer,
            debris_buffer,
            particles_buffer,
            trail_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from the session and render
    pub fn render(&mut self, session: &Session, time: f64) -> Result<(), wgpu::SurfaceError> {
        // time is ms from requestAnimationFrame
        let elapsed = ((time - self.start_time) / 1000.0) as f32;
        let scene = SceneData::collect(
            session.state(),
            session.camera().position.y,
            session.column(),
            session.settings(),
            [self.size.0 as f32, self.size.1 as f32],
            elapsed,
        );

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&scene.globals));
        self.queue.write_buffer(
            &self.pieces_buffer,
            0,
            bytemuck::cast_slice(&padded(&scene.pieces, MAX_PIECES)),
        );
        self.queue.write_buffer(
            &self.debris_buffer,
            0,
            bytemuck::cast_slice(&padded(&scene.debris, MAX_DEBRIS)),
        );
        self.queue.write_buffer(
            &self.particles_buffer,
            0,
            bytemuck::cast_slice(&padded(&scene.particles, MAX_PARTICLES)),
        );
        self.queue.write_buffer(
            &self.trail_buffer,
            0,
            bytemuck::cast_slice(&padded(&scene.trail, MAX_TRAIL)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;
    use crate::sim::ObstacleArchetype;
    use crate::tuning::Tuning;
    use rand::SeedableRng;

    fn tower_state() -> GameState {
        let mut state = GameState::new(7, 1, Tuning::default());
        let ring = ObstacleArchetype::ring("t", 4, &[0]);
        for i in 0..40 {
            state.spawn_group(-0.5 * i as f32 - 0.01, 0.0, 0, &ring);
        }
        state.goal.y = -20.01;
        state
    }

    fn collect(state: &GameState, settings: &Settings) -> SceneData {
        let column = GoalColumn::fit(state.start_y, state.goal.y, 0.0);
        SceneData::collect(state, 0.0, column, settings, [800.0, 600.0], 0.0)
    }

    #[test]
    fn test_gpu_struct_sizes() {
        assert_eq!(std::mem::size_of::<Globals>(), 144);
        assert_eq!(std::mem::size_of::<PieceData>(), 16);
        assert_eq!(std::mem::size_of::<DebrisData>(), 32);
        assert_eq!(std::mem::size_of::<ParticleData>(), 16);
        assert_eq!(std::mem::size_of::<TrailData>(), 16);
    }

    #[test]
    fn test_only_visible_rings_are_packed() {
        let state = tower_state();
        let scene = collect(&state, &Settings::default());
        // View half height 3.5 + margin 1.0 from y = 0: rings down to -4.01
        assert_eq!(scene.pieces.len(), 9 * 4);
        assert_eq!(scene.globals.piece_count, 36);
        assert!(scene.pieces.iter().all(|p| p.y > -4.5));
    }

    #[test]
    fn test_pieces_follow_tower_rotation() {
        let mut state = tower_state();
        let still = collect(&state, &Settings::default());
        state.tower.angle = 0.5;
        let turned = collect(&state, &Settings::default());
        let delta = normalize_angle(turned.pieces[0].theta_start - still.pieces[0].theta_start);
        assert!((delta - 0.5).abs() < 1e-5);
        assert_eq!(still.pieces[0].kind, 1);
        assert_eq!(still.pieces[1].kind, 0);
    }

    #[test]
    fn test_shattered_rings_become_debris() {
        let mut state = tower_state();
        let mut rng = rand_pcg::Pcg32::seed_from_u64(1);
        let tuning = state.tuning.shatter.clone();
        state.groups[0].shatter(0.0, &mut rng, &tuning);

        let scene = collect(&state, &Settings::default());
        assert_eq!(scene.debris.len(), 4);
        assert!(scene.debris.iter().all(|d| (d.alpha - 1.0).abs() < 1e-6));
        assert_eq!(scene.pieces.len(), 8 * 4);
    }

    #[test]
    fn test_settings_limit_effects() {
        let mut state = tower_state();
        for i in 0..30 {
            state.player.y = -(i as f32) * 0.1;
            state.player.record_trail();
        }

        let full = collect(&state, &Settings::from_preset(QualityPreset::High));
        assert!(!full.trail.is_empty());
        assert!(full.trail[0].alpha > full.trail[full.trail.len() - 1].alpha);

        let off = Settings {
            trails: false,
            ..Settings::default()
        };
        let scene = collect(&state, &off);
        assert!(scene.trail.is_empty());
        assert_eq!(scene.globals.trail_count, 0);
    }

    #[test]
    fn test_padded_fills_with_zeros() {
        let items = [PieceData {
            y: 1.0,
            theta_start: 0.0,
            theta_end: 1.0,
            kind: 1,
        }];
        let out = padded(&items, 4);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], items[0]);
        assert_eq!(out[3], PieceData::zeroed());
    }
}
