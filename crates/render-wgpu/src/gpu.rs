use crate::light::{SHADOW_LAYERS, ShadowLayers, frustum_edges};
use crate::mesh::{self, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use shadowstage_kernel::{MeshRole, SceneConfig, ShadowMode, Stage, ViewportState};
use shadowstage_render::Renderer;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SHADOW_BIAS: f32 = 0.0005;
/// Upper bound on helper line vertices: 12 edges for each shadow layer.
const MAX_LINE_VERTICES: usize = SHADOW_LAYERS * 12 * 2;
const HELPER_COLOR: [f32; 4] = [1.0, 0.67, 0.0, 1.0];

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
    8 => Float32x4,
];
const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    directional_color: [f32; 4],
    directional_direction: [f32; 4],
    spot_color: [f32; 4],
    spot_position: [f32; 4],
    spot_direction: [f32; 4],
    spot_params: [f32; 4],
    point_color: [f32; 4],
    point_position: [f32; 4],
    point_params: [f32; 4],
    shadow_params: [f32; 4],
    shadow_radius: [f32; 4],
    light_view_proj: [[[f32; 4]; 4]; SHADOW_LAYERS],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    material: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

fn lit(flag: bool) -> f32 {
    if flag { 1.0 } else { 0.0 }
}

impl Globals {
    fn new(stage: &Stage, layers: &ShadowLayers) -> Self {
        let scene = &stage.scene;
        let camera = &stage.camera;
        let mut globals = Self::zeroed();

        globals.view_proj = camera.view_projection().to_cols_array_2d();
        globals.camera_position = camera.position.extend(1.0).to_array();
        globals.ambient = scene.ambient.color.scaled(scene.ambient.intensity);

        let dir = &scene.directional;
        globals.directional_color = dir.color.scaled(dir.intensity);
        globals.directional_color[3] = lit(layers.active[crate::light::DIRECTIONAL_LAYER]);
        globals.directional_direction = dir.direction().extend(0.0).to_array();

        if let Some(spot) = &scene.spot {
            let cone_cos = spot.angle.cos();
            let penumbra_cos = (spot.angle * (1.0 - spot.penumbra)).cos();
            globals.spot_color = spot.color.scaled(spot.intensity);
            globals.spot_color[3] = lit(layers.active[crate::light::SPOT_LAYER]);
            globals.spot_position = spot.position.extend(spot.distance).to_array();
            globals.spot_direction = spot.direction().extend(cone_cos).to_array();
            // smoothstep needs distinct edges when the penumbra is zero.
            globals.spot_params = [penumbra_cos.max(cone_cos + 1e-4), spot.decay, 0.0, 0.0];
        }

        if let Some(point) = &scene.point {
            globals.point_color = point.color.scaled(point.intensity);
            globals.point_color[3] = lit(layers.active[crate::light::POINT_LAYER]);
            globals.point_position = point.position.extend(point.distance).to_array();
            globals.point_params = [point.decay, 0.0, 0.0, 0.0];
        }

        let (mode, map_size) = match scene.shadow_mode {
            ShadowMode::Disabled => (0.0, 1.0),
            ShadowMode::Pcf => (1.0, scene.directional.shadow.map_size as f32),
            ShadowMode::PcfSoft => (2.0, scene.directional.shadow.map_size as f32),
        };
        globals.shadow_params = [mode, 1.0 / map_size.max(1.0), SHADOW_BIAS, 0.0];
        globals.shadow_radius = [
            dir.shadow.radius,
            scene.spot.map_or(1.0, |s| s.shadow.radius),
            scene.point.map_or(1.0, |p| p.shadow.radius),
            0.0,
        ];
        for (slot, m) in globals.light_view_proj.iter_mut().zip(layers.view_proj) {
            *slot = m.to_cols_array_2d();
        }
        globals
    }
}

fn instance_data(stage: &Stage) -> Vec<InstanceData> {
    let scene = &stage.scene;
    let material = &scene.material;
    scene
        .meshes
        .iter()
        .map(|m| {
            let cols = m.transform.matrix().to_cols_array_2d();
            let (color, decal) = match m.role {
                MeshRole::ShadowProxy => ([0.0, 0.0, 0.0, stage.shadow_opacity()], 1.0),
                MeshRole::Solid | MeshRole::Animated => (material.color.scaled(1.0), 0.0),
            };
            InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color,
                material: [
                    material.metalness,
                    material.roughness,
                    decal,
                    lit(m.receive_shadow),
                ],
            }
        })
        .collect()
}

fn helper_lines(scene: &SceneConfig) -> Vec<LineVertex> {
    ShadowLayers::helper_frusta(scene)
        .into_iter()
        .flat_map(frustum_edges)
        .flat_map(|edge| {
            edge.map(|p| LineVertex {
                position: p.to_array(),
                color: HELPER_COLOR,
            })
        })
        .take(MAX_LINE_VERTICES)
        .collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    role: MeshRole,
    cast_shadow: bool,
}

struct ShadowPassTarget {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    view: wgpu::TextureView,
}

/// One acquired swapchain image with the scene drawn into it.
///
/// Overlays may draw into `view` before the frame is presented.
pub struct Frame {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl Frame {
    pub fn present(self) {
        self.texture.present();
    }
}

/// wgpu-based stage renderer.
///
/// Owns the surface it presents to. Meshes are uploaded once at
/// construction; lights, material and poses are re-read every frame.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    max_dimension: u32,
    logical_size: (f64, f64),
    pixel_ratio: f64,
    mesh_pipeline: wgpu::RenderPipeline,
    decal_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    shadow_targets: Vec<ShadowPassTarget>,
    meshes: Vec<GpuMesh>,
    instance_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
}

impl WgpuRenderer {
    /// Create the surface, device and pipelines for a stage.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        stage: &Stage,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("shadowstage_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let viewport = stage.viewport;
        let (width, height) = viewport.buffer_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let renderer = Self::with_device(surface, device, queue, config, viewport, &stage.scene);
        Ok(renderer)
    }

    fn with_device(
        surface: wgpu::Surface<'static>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        viewport: ViewportState,
        scene: &SceneConfig,
    ) -> Self {
        let surface_format = config.format;

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals_buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Shadow map array, one layer per light view.
        let shadow_size = scene.directional.shadow.map_size.clamp(1, 4096);
        let shadow_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size: wgpu::Extent3d {
                width: shadow_size,
                height: shadow_size,
                depth_or_array_layers: SHADOW_LAYERS as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let shadow_array_view = shadow_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow_map_array"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_array_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_pass_bind_group_layout"),
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
        });

        let shadow_targets = (0..SHADOW_LAYERS as u32)
            .map(|layer| {
                let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("shadow_pass_uniforms"),
                    contents: bytemuck::bytes_of(&Mat4::IDENTITY.to_cols_array_2d()),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("shadow_pass_bind_group"),
                    layout: &shadow_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });
                let view = shadow_texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("shadow_map_layer"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                });
                ShadowPassTarget {
                    uniform_buffer,
                    bind_group,
                    view,
                }
            })
            .collect();

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });
        let shadow_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("shadow_pipeline_layout"),
                bind_group_layouts: &[&shadow_layout],
                push_constant_ranges: &[],
            });

        let mesh_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            },
        ];

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let scene_pipeline = |label: &str, blend: wgpu::BlendState, depth_write: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&scene_layout),
                vertex: wgpu::VertexState {
                    module: &scene_shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &mesh_buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &scene_shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let mesh_pipeline = scene_pipeline("mesh_pipeline", wgpu::BlendState::REPLACE, true);
        let decal_pipeline =
            scene_pipeline("decal_pipeline", wgpu::BlendState::ALPHA_BLENDING, false);

        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });
        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &mesh_buffers,
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });
        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &LINE_ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let meshes: Vec<GpuMesh> = scene
            .meshes
            .iter()
            .map(|m| {
                let (vertices, indices) = mesh::build(&m.shape);
                GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("mesh_vertex_buffer"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("mesh_index_buffer"),
                        contents: bytemuck::cast_slice(&indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: indices.len() as u32,
                    role: m.role,
                    cast_shadow: m.cast_shadow,
                }
            })
            .collect();

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (meshes.len().max(1) * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("helper_line_buffer"),
            size: (MAX_LINE_VERTICES * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let max_dimension = device.limits().max_texture_dimension_2d;
        let depth_texture = Self::create_depth_texture(&device, config.width, config.height);

        tracing::debug!(
            meshes = meshes.len(),
            shadow_map = shadow_size,
            "renderer resources created"
        );

        Self {
            surface,
            device,
            queue,
            config,
            max_dimension,
            logical_size: (viewport.width, viewport.height),
            pixel_ratio: viewport.pixel_ratio,
            mesh_pipeline,
            decal_pipeline,
            shadow_pipeline,
            line_pipeline,
            globals_buffer,
            globals_bind_group,
            shadow_targets,
            meshes,
            instance_buffer,
            line_buffer,
            depth_texture,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Size of the drawing buffer in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn reconfigure(&mut self) {
        let viewport = ViewportState {
            width: self.logical_size.0,
            height: self.logical_size.1,
            pixel_ratio: self.pixel_ratio,
        };
        let (width, height) = viewport.buffer_size();
        let width = width.min(self.max_dimension);
        let height = height.min(self.max_dimension);
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Self::create_depth_texture(&self.device, width, height);
        tracing::debug!(width, height, "drawing buffer resized");
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(t) => Ok(t),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Ok(self.surface.get_current_texture()?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn draw_meshes(&self, pass: &mut wgpu::RenderPass<'_>, filter: impl Fn(&GpuMesh) -> bool) {
        for (i, mesh) in self.meshes.iter().enumerate() {
            if !filter(mesh) {
                continue;
            }
            let i = i as u32;
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, i..i + 1);
        }
    }
}

impl Renderer for WgpuRenderer {
    type Output = Frame;
    type Error = RenderError;

    /// Render the stage into the next swapchain image. The caller presents.
    fn render(&mut self, stage: &Stage) -> Result<Frame, RenderError> {
        let layers = ShadowLayers::from_scene(&stage.scene);
        self.queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals::new(stage, &layers)),
        );

        let instances = instance_data(stage);
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let lines = if stage.scene.helpers_visible {
            helper_lines(&stage.scene)
        } else {
            Vec::new()
        };
        if !lines.is_empty() {
            self.queue
                .write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&lines));
        }

        let texture = self.acquire()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        for (layer, target) in self.shadow_targets.iter().enumerate() {
            if !layers.active[layer] {
                continue;
            }
            self.queue.write_buffer(
                &target.uniform_buffer,
                0,
                bytemuck::bytes_of(&layers.view_proj[layer].to_cols_array_2d()),
            );
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &target.bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            self.draw_meshes(&mut pass, |m| {
                m.cast_shadow && m.role != MeshRole::ShadowProxy
            });
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            pass.set_pipeline(&self.mesh_pipeline);
            self.draw_meshes(&mut pass, |m| m.role != MeshRole::ShadowProxy);

            pass.set_pipeline(&self.decal_pipeline);
            self.draw_meshes(&mut pass, |m| m.role == MeshRole::ShadowProxy);

            if !lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                pass.draw(0..lines.len() as u32, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(Frame { texture, view })
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.logical_size = (width, height);
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.reconfigure();
    }
}
