// Character movement demo: a keyboard-driven character on a ground plane
// scattered with sphere obstacles. Animation states crossfade as input
// changes, movement is camera-relative and collision-gated, and a trailing
// camera follows the character.
//
// All decision logic lives in engine::locomotion::Sim; this file is the
// wgpu/winit shell around it (two instanced draw calls + egui HUD).

mod engine;

use std::time::Instant;

use log::info;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::animation::AnimName;
use engine::hud::{HudOverlay, HudStats};
use engine::loader::ClipLoader;
use engine::locomotion::Sim;
use engine::mesh::{self, GpuVertex};
use engine::{Color as EntityColor, RenderShape, ShapeKind, Transform};

// ============================================================================
// INSTANCE DATA (per-entity)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    position: [f32; 3],
    yaw: f32,
    scale: [f32; 3],
    _padding: f32, // align color to 16 bytes
    color: [f32; 4],
}

impl InstanceData {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// More than enough for the ground slab + character.
const MAX_BOX_INSTANCES: usize = 16;
/// More than enough for the obstacle field.
const MAX_SPHERE_INSTANCES: usize = 128;

// ============================================================================
// UNIFORM DATA (camera only)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
}

struct State {
    window: std::sync::Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    depth_view: wgpu::TextureView,
    render_pipeline: wgpu::RenderPipeline,
    box_mesh: MeshBuffers,
    sphere_mesh: MeshBuffers,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    hud: HudOverlay,

    // Simulation
    sim: Sim,
    last_update: Instant,

    // Frame statistics, re-snapshotted once per second
    fps: u32,
    frame_avg_ms: f32,
    frame_min_ms: f32,
    frame_max_ms: f32,
    frames_since_snapshot: u32,
    accum_ms: f32,
    window_min_ms: f32,
    window_max_ms: f32,
    last_snapshot: Instant,
}

impl State {
    async fn new(window: std::sync::Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_instanced.wgsl").into()),
        });

        let uniforms = Uniforms {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
        };

        use wgpu::util::DeviceExt;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc(), InstanceData::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let box_mesh = Self::upload_mesh(&device, "box", &mesh::unit_box(), MAX_BOX_INSTANCES);
        let sphere_mesh = Self::upload_mesh(
            &device,
            "sphere",
            &mesh::unit_sphere(16, 24),
            MAX_SPHERE_INSTANCES,
        );

        let hud = HudOverlay::new(&window, &device, surface_format);

        // The clip loads are fire-and-forget; the catalog fills in over the
        // first few frames and the state machine tolerates the gaps.
        let sim = Sim::new(ClipLoader::spawn());

        let now = Instant::now();
        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            render_pipeline,
            box_mesh,
            sphere_mesh,
            uniform_buffer,
            uniform_bind_group,
            hud,
            sim,
            last_update: now,
            fps: 0,
            frame_avg_ms: 0.0,
            frame_min_ms: 0.0,
            frame_max_ms: 0.0,
            frames_since_snapshot: 0,
            accum_ms: 0.0,
            window_min_ms: f32::MAX,
            window_max_ms: 0.0,
            last_snapshot: now,
        }
    }

    fn upload_mesh(
        device: &wgpu::Device,
        label: &str,
        mesh: &mesh::RenderMesh,
        max_instances: usize,
    ) -> MeshBuffers {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} instances")),
            size: (max_instances * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            instance_buffer,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        self.sim.step(dt);

        // Frame statistics: accumulate, snapshot once per second.
        let frame_ms = dt * 1000.0;
        self.frames_since_snapshot += 1;
        self.accum_ms += frame_ms;
        self.window_min_ms = self.window_min_ms.min(frame_ms);
        self.window_max_ms = self.window_max_ms.max(frame_ms);

        if (now - self.last_snapshot).as_secs_f32() >= 1.0 {
            self.fps = self.frames_since_snapshot;
            self.frame_avg_ms = self.accum_ms / self.frames_since_snapshot.max(1) as f32;
            self.frame_min_ms = self.window_min_ms;
            self.frame_max_ms = self.window_max_ms;
            self.frames_since_snapshot = 0;
            self.accum_ms = 0.0;
            self.window_min_ms = f32::MAX;
            self.window_max_ms = 0.0;
            self.last_snapshot = now;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data from the ECS before creating the render pass.
        let mut box_instances: Vec<InstanceData> = Vec::new();
        let mut sphere_instances: Vec<InstanceData> = Vec::new();
        let mut query = self
            .sim
            .world
            .query::<(&Transform, &RenderShape, &EntityColor)>();
        for (transform, shape, color) in query.iter(&self.sim.world) {
            let instance = InstanceData {
                position: (transform.position + shape.offset).to_array(),
                yaw: transform.yaw,
                scale: shape.scale.to_array(),
                _padding: 0.0,
                color: [color.r, color.g, color.b, 1.0],
            };
            match shape.kind {
                ShapeKind::Box => box_instances.push(instance),
                ShapeKind::Sphere => sphere_instances.push(instance),
            }
        }
        box_instances.truncate(MAX_BOX_INSTANCES);
        sphere_instances.truncate(MAX_SPHERE_INSTANCES);

        if !box_instances.is_empty() {
            self.queue.write_buffer(
                &self.box_mesh.instance_buffer,
                0,
                bytemuck::cast_slice(&box_instances),
            );
        }
        if !sphere_instances.is_empty() {
            self.queue.write_buffer(
                &self.sphere_mesh.instance_buffer,
                0,
                bytemuck::cast_slice(&sphere_instances),
            );
        }

        // Camera uniforms
        let aspect = self.size.width as f32 / self.size.height.max(1) as f32;
        let uniforms = Uniforms {
            view_proj: self.sim.camera.view_projection(aspect).to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Hazy blue, standing in for the original's fog.
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.012,
                            g: 0.38,
                            b: 0.6,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Draw call 1: ground + character (boxes)
            render_pass.set_vertex_buffer(0, self.box_mesh.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.box_mesh.instance_buffer.slice(..));
            render_pass.set_index_buffer(
                self.box_mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            render_pass.draw_indexed(
                0..self.box_mesh.index_count,
                0,
                0..box_instances.len() as u32,
            );

            // Draw call 2: obstacle spheres
            render_pass.set_vertex_buffer(0, self.sphere_mesh.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.sphere_mesh.instance_buffer.slice(..));
            render_pass.set_index_buffer(
                self.sphere_mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            render_pass.draw_indexed(
                0..self.sphere_mesh.index_count,
                0,
                0..sphere_instances.len() as u32,
            );
        }

        // HUD pass on top.
        let character = self.sim.character_transform().unwrap_or_default();
        let stats = HudStats {
            fps: self.fps,
            frame_time_avg_ms: self.frame_avg_ms,
            frame_time_min_ms: self.frame_min_ms,
            frame_time_max_ms: self.frame_max_ms,
            resolution: (self.config.width, self.config.height),
            position: (
                character.position.x,
                character.position.y,
                character.position.z,
            ),
            yaw_deg: character.yaw.to_degrees(),
            anim_state: self.sim.state_machine.active(),
            clips_loaded: self.sim.catalog.loaded_count(),
            clips_total: AnimName::ALL.len(),
            move_blocked: self.sim.last_move_blocked,
        };
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        self.hud.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            &stats,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("Vanguard - character movement demo")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = std::sync::Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut state = pollster::block_on(State::new(window.clone()));
    info!("renderer ready, entering frame loop");

    event_loop
        .run(move |event, control_flow| {
            match event {
                WinitEvent::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == window.id() => {
                    // Feed every event to the HUD and input tracker before
                    // the app-level handling below.
                    let _ = state.hud.handle_window_event(&window, event);
                    state.sim.input.process_event(event);

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
                        } => control_flow.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    state: ElementState::Pressed,
                                    physical_key: PhysicalKey::Code(KeyCode::F3),
                                    repeat: false,
                                    ..
                                },
                            ..
                        } => state.hud.toggle_stats(),
                        WindowEvent::Resized(physical_size) => {
                            state.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                                Err(e) => eprintln!("{:?}", e),
                            }
                        }
                        _ => {}
                    }
                }
                WinitEvent::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}
