use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    window::Window,
};

use crate::{config::SceneConfig, engine, rendering::renderer::Renderer, state::SceneState};

struct App {
    renderer: Option<Renderer>,
    state: SceneState,
    mouse_pos: Vec2,
    dragging: bool,
    last_frame: Instant,
}

impl App {
    fn from_state(state: SceneState) -> Self {
        Self {
            renderer: None,
            state,
            mouse_pos: Vec2::ZERO,
            dragging: false,
            last_frame: Instant::now(),
        }
    }

    fn resolution(&self) -> Vec2 {
        match &self.renderer {
            Some(renderer) => Vec2::new(renderer.size.width as f32, renderer.size.height as f32),
            None => Vec2::ZERO,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("nightgarden");
        let window = event_loop.create_window(window_attributes).unwrap();

        let renderer = pollster::block_on(Renderer::new(Arc::new(window), &self.state)).unwrap();
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.state.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_frame.elapsed().as_secs_f32();
                self.last_frame = Instant::now();

                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };
                renderer.window.request_redraw();

                engine::update(&mut self.state, dt);

                match renderer.render(&mut self.state) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);

                if self.dragging {
                    let delta = new_pos - self.mouse_pos;
                    self.state.camera.orbit(delta);
                }
                self.mouse_pos = new_pos;

                self.state.pointer_moved(new_pos, self.resolution());
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    match state {
                        ElementState::Pressed => {
                            self.dragging = true;
                            self.state.pointer_clicked();
                        }
                        ElementState::Released => {
                            self.dragging = false;
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 60.0,
                };
                self.state.camera.zoom(amount);
            }
            _ => (),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let state = SceneState::new(SceneConfig::default()).context("Failed to build the garden")?;
    let mut app = App::from_state(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
