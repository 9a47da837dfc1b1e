use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use cogbat_core::{ControlKey, ResponseKey};
use cogbat_render::{load_font, SceneRenderer};
use cogbat_session::Session;
use cogbat_tasks::by_name;
use pixels::{Pixels, SurfaceTexture};
use tiny_skia::Pixmap;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::battery::Battery;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    battery: Battery,
    renderer: Option<SceneRenderer>,
    canvas: Option<Pixmap>,
    font: Option<ab_glyph::FontVec>,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,
    last_frame: Option<Instant>,
    should_exit: bool,
}

impl App {
    pub fn new(session: Session) -> Result<Self> {
        // Font problems should surface before the fullscreen window opens.
        let font = load_font(session.config.font.as_deref())?;

        let mut tasks = Vec::new();
        for name in &session.config.tasks {
            match by_name(name) {
                Some(task) => tasks.push(task),
                None => eprintln!("Unknown task '{}' in config, skipping", name),
            }
        }
        anyhow::ensure!(!tasks.is_empty(), "no runnable tasks configured");

        let battery = Battery::new(session, tasks);

        Ok(Self {
            window: None,
            pixels: None,
            battery,
            renderer: None,
            canvas: None,
            font: Some(font),
            current_size: None,
            scale_factor: 1.0,
            refresh_rate: None,
            last_frame: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        println!("Press SPACE to start or ESC to exit.\n");
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Cogbat")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();
        self.current_size = Some(physical_size);

        println!("Display Configuration:");
        println!(
            "  Physical size: {}×{}",
            physical_size.width, physical_size.height
        );
        println!("  Scale factor: {:.2}", self.scale_factor);
        if let Some(refresh_rate) = self.refresh_rate {
            println!("  Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        self.canvas = Pixmap::new(physical_size.width, physical_size.height);
        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow::anyhow!("font already consumed"))?;
        self.renderer = Some(SceneRenderer::new(
            physical_size.width,
            physical_size.height,
            font,
        ));

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer), Some(canvas)) = (
            self.pixels.as_mut(),
            self.renderer.as_mut(),
            self.canvas.as_mut(),
        ) else {
            return Ok(());
        };

        renderer.render(canvas, &self.battery.screen())?;
        pixels.frame_mut().copy_from_slice(canvas.data());
        pixels.render()?;
        Ok(())
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        let PhysicalKey::Code(code) = key else { return };

        let control = match code {
            KeyCode::Escape => Some(ControlKey::Abort),
            KeyCode::F9 => Some(ControlKey::Skip),
            _ => None,
        };
        if let Some(control) = control {
            match control {
                ControlKey::Abort => {
                    // Abort: the in-flight trial is discarded, rows already
                    // appended stay on disk.
                    self.cleanup_and_exit(event_loop);
                }
                ControlKey::Skip => {
                    if let Err(e) = self.battery.skip_block() {
                        eprintln!("Session error: {}", e);
                        self.cleanup_and_exit(event_loop);
                    }
                }
            }
            return;
        }

        let result = match code {
            KeyCode::Space => self.battery.advance(),
            KeyCode::KeyD => self.battery.respond(ResponseKey::D),
            KeyCode::KeyF => self.battery.respond(ResponseKey::F),
            KeyCode::KeyJ => self.battery.respond(ResponseKey::J),
            KeyCode::KeyK => self.battery.respond(ResponseKey::K),
            KeyCode::ArrowLeft => self.battery.respond(ResponseKey::Left),
            KeyCode::ArrowRight => self.battery.respond(ResponseKey::Right),
            KeyCode::Digit1 => self.battery.respond(ResponseKey::Digit(1)),
            KeyCode::Digit2 => self.battery.respond(ResponseKey::Digit(2)),
            KeyCode::Digit3 => self.battery.respond(ResponseKey::Digit(3)),
            KeyCode::Digit4 => self.battery.respond(ResponseKey::Digit(4)),
            KeyCode::Digit5 => self.battery.respond(ResponseKey::Digit(5)),
            KeyCode::Digit6 => self.battery.respond(ResponseKey::Digit(6)),
            KeyCode::Digit7 => self.battery.respond(ResponseKey::Digit(7)),
            KeyCode::Digit8 => self.battery.respond(ResponseKey::Digit(8)),
            KeyCode::Digit9 => self.battery.respond(ResponseKey::Digit(9)),
            _ => Ok(()),
        };

        if let Err(e) = result {
            eprintln!("Session error: {}", e);
            self.cleanup_and_exit(event_loop);
            return;
        }
        if self.battery.finished() {
            self.cleanup_and_exit(event_loop);
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                eprintln!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                eprintln!("Failed to resize buffer: {}", e);
            }
        }
        self.canvas = Pixmap::new(new_size.width, new_size.height);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height);
        }
        println!("Display resized to: {}×{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        println!("\nSession ended.");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                eprintln!("Failed to create window and surface: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                // Frame-to-frame interval feeds the display calibration.
                let now = Instant::now();
                if let Some(last) = self.last_frame {
                    self.battery.record_frame(now - last);
                }
                self.last_frame = Some(now);

                if let Err(e) = self.render() {
                    eprintln!("Render error: {}", e);
                }
                if let Err(e) = self.battery.tick() {
                    eprintln!("Session error: {}", e);
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if self.battery.finished() {
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
