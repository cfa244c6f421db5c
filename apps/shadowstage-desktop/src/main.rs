use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::{Vec2, Vec3};
use shadowstage_input::{Cursor, OrbitControls, PointerButton, PointerTracker};
use shadowstage_kernel::{ScenePreset, Stage, ViewportEvent, ViewportState};
use shadowstage_render::{DriverState, FrameDriver, RefreshScheduler, ResizeHandler};
use shadowstage_render_wgpu::WgpuRenderer;
use shadowstage_tools::{DebugPanel, StageInspector};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Pixel-delta scroll distance treated as one wheel step.
const PIXELS_PER_WHEEL_STEP: f32 = 50.0;

#[derive(Parser)]
#[command(name = "shadowstage-desktop", about = "Shadowstage scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene to show: lights, realtime or baked
    #[arg(long, default_value = "baked")]
    preset: ScenePreset,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Requests the next tick as a window redraw.
struct WindowScheduler<'a>(&'a Window);

impl RefreshScheduler for WindowScheduler<'_> {
    fn request_tick(&mut self) {
        self.0.request_redraw();
    }
}

/// Window-bound resources, created once the event loop resumes.
struct Gfx {
    window: Arc<Window>,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gfx {
    fn paint_overlay(
        &mut self,
        view: &wgpu::TextureView,
        paint_jobs: &[egui::ClippedPrimitive],
        textures: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) {
        let device = self.renderer.device();
        let queue = self.renderer.queue();
        let (width, height) = self.renderer.drawing_buffer_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point,
        };

        for (id, image_delta) in &textures.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        let extra = self.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, paint_jobs, &screen_descriptor);
        }
        queue.submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        for id in &textures.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct App {
    stage: Stage,
    controls: OrbitControls,
    driver: FrameDriver,
    pointer: PointerTracker,
    cursor: Cursor,
    panel: DebugPanel,
    egui_ctx: EguiContext,
    gfx: Option<Gfx>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(cli: &Cli) -> Self {
        let viewport = ViewportState {
            width: cli.width.max(1) as f64,
            height: cli.height.max(1) as f64,
            pixel_ratio: 1.0,
        };
        Self {
            stage: Stage::new(cli.preset.build(), viewport),
            controls: OrbitControls::new(Vec3::ZERO).with_damping(0.05),
            driver: FrameDriver::new(),
            pointer: PointerTracker::new(),
            cursor: Cursor::default(),
            panel: DebugPanel::standard(),
            egui_ctx: EguiContext::default(),
            gfx: None,
            error: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<Gfx> {
        let attrs = Window::default_attributes()
            .with_title(format!("shadowstage: {}", self.stage.scene.name))
            .with_inner_size(LogicalSize::new(
                self.stage.viewport.width,
                self.stage.viewport.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let mut renderer = WgpuRenderer::new(window.clone(), &self.stage)?;
        let scale_factor = window.scale_factor();
        apply_resize(&mut self.stage, &mut renderer, &window, scale_factor);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(scale_factor as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(renderer.device(), renderer.surface_format(), None, 1, false);

        window.request_redraw();
        Ok(Gfx {
            window,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    /// Cursor and drag origin always follow the pointer; the debug panel
    /// only suppresses the camera action.
    fn pointer_moved(&mut self, position: Vec2, captured: bool) {
        let viewport = self.stage.viewport;
        self.cursor
            .update(position, viewport.width as f32, viewport.height as f32);
        if let Some(action) = self.pointer.track(position, captured) {
            self.controls
                .apply(action, &self.stage.camera, viewport.height as f32);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };

        let raw_input = gfx.egui_winit.take_egui_input(&gfx.window);
        let frames = self.driver.frames();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_panel(ctx, &self.panel, &mut self.stage, frames);
        });
        gfx.egui_winit
            .handle_platform_output(&gfx.window, full_output.platform_output);

        let mut scheduler = WindowScheduler(&gfx.window);
        let result = if self.driver.state() == DriverState::Idle {
            self.driver.start(
                &mut self.stage,
                &mut self.controls,
                &mut gfx.renderer,
                &mut scheduler,
            )
        } else {
            self.driver.tick(
                &mut self.stage,
                &mut self.controls,
                &mut gfx.renderer,
                &mut scheduler,
            )
        };
        let frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("render failed"));
                return;
            }
        };

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        gfx.paint_overlay(
            &frame.view,
            &paint_jobs,
            &full_output.textures_delta,
            self.stage.viewport.pixel_ratio as f32,
        );
        frame.present();
    }
}

/// Feed the window's current size to the resize handler. Minimized windows
/// report a zero size and are skipped.
fn apply_resize(stage: &mut Stage, renderer: &mut WgpuRenderer, window: &Window, scale_factor: f64) {
    let size: LogicalSize<f64> = window.inner_size().to_logical(scale_factor);
    let event = ViewportEvent {
        width: size.width,
        height: size.height,
        device_pixel_ratio: scale_factor,
    };
    if let Err(e) = ResizeHandler::handle(stage, renderer, &event) {
        tracing::debug!("skipping resize: {e}");
    }
}

fn draw_panel(ctx: &EguiContext, panel: &DebugPanel, stage: &mut Stage, frames: u64) {
    if !panel.visible {
        return;
    }
    egui::Window::new("Debug")
        .default_width(280.0)
        .show(ctx, |ui| {
            for binding in &panel.sliders {
                let mut value = binding.param.value(&stage.scene);
                let slider = egui::Slider::new(&mut value, binding.range())
                    .step_by(binding.step as f64)
                    .text(binding.label);
                if ui.add(slider).changed() {
                    binding.set(&mut stage.scene, value);
                }
            }

            let mut helpers = stage.scene.helpers_visible;
            if ui.checkbox(&mut helpers, "shadow camera helpers").changed() {
                DebugPanel::set_helpers_visible(&mut stage.scene, helpers);
            }

            ui.separator();
            ui.label(StageInspector::summary(stage, frames).to_string());
        });
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        match self.init_graphics(event_loop) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let consumed = gfx.egui_winit.on_window_event(&gfx.window, &event).consumed;
        let scale_factor = gfx.window.scale_factor();

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(frames = self.driver.frames(), "window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                apply_resize(&mut self.stage, &mut gfx.renderer, &gfx.window, scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                let position: winit::dpi::LogicalPosition<f32> = position.to_logical(scale_factor);
                self.pointer_moved(Vec2::new(position.x, position.y), consumed);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left(),
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = pointer_button(button) {
                    match state {
                        ElementState::Pressed if !consumed => self.pointer.press(button),
                        ElementState::Pressed => {}
                        ElementState::Released => self.pointer.release(button),
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_WHEEL_STEP,
                };
                if let Some(action) = self.pointer.wheel(steps) {
                    let height = self.stage.viewport.height as f32;
                    self.controls.apply(action, &self.stage.camera, height);
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!(preset = %cli.preset, "shadowstage-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(&cli);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
