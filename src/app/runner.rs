//! Main application handler for the demo

use std::sync::Arc;

use glam::DVec2;
use tracing::{debug, error, info, trace, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use super::host::{WindowHost, center_location};
use super::window::window_attributes_from_config;
use crate::camera::{Camera, CameraTransform};
use crate::config::AppConfig;
use crate::error::GestureError;
use crate::inertia::NoInertia;
use crate::input::InputCollector;
use crate::manager::HandlerManager;

/// Demo application: a window whose input drives a planar map camera
pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    collector: InputCollector,
    manager: HandlerManager<WindowHost>,
}

impl App {
    /// Creates the demo with the built-in gesture handlers
    pub fn new(config: AppConfig) -> Result<Self, GestureError> {
        info!(profile = %config.profile, "Starting map demo");
        info!(?config.window, "Window configuration");
        debug!(?config.interaction, "Interaction configuration");

        let camera = Camera::new(DVec2::ZERO, config.window.width, config.window.height);
        let manager = HandlerManager::with_default_handlers(
            WindowHost::new(camera),
            NoInertia,
            &config.interaction,
        )?;
        for kind in manager.registered() {
            trace!(handler = %kind, "handler ready");
        }

        Ok(Self {
            collector: InputCollector::new(config.interaction.click_tolerance),
            config,
            window: None,
            manager,
        })
    }

    /// Creates the demo with configuration loaded from the environment
    pub fn from_env() -> Result<Self, GestureError> {
        let config = AppConfig::load_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using default configuration");
            AppConfig::default()
        });
        Self::new(config)
    }

    fn redraw(&mut self) {
        let now = self.collector.now();
        let host = self.manager.map_mut();
        host.advance(now);
        let frame = host.take_frame();

        if frame.is_some() {
            self.manager.flush_frame(now);
            let camera = self.manager.map().camera();
            debug!(
                center = ?center_location(camera),
                zoom = camera.zoom(),
                bearing = camera.bearing(),
                pitch = camera.pitch(),
                moving = self.manager.is_moving(),
                "frame applied"
            );
        }

        if self.manager.map().needs_redraw()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = window_attributes_from_config(&self.config.window);
        match event_loop.create_window(window_attributes) {
            Ok(window) => {
                let size = window.inner_size().to_logical::<f64>(window.scale_factor());
                info!(
                    window.width = size.width,
                    window.height = size.height,
                    "Window created successfully"
                );

                let window = Arc::new(window);
                let host = self.manager.map_mut();
                host.resize(size.width, size.height);
                host.attach(window.clone());
                self.collector.set_scale_factor(window.scale_factor());
                self.window = Some(window);
            }
            Err(e) => {
                error!(error = %e, "Failed to create window");
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Feed events to the collector first so gestures see all raw input
        for input in self.collector.handle_window_event(&event) {
            match self.manager.dispatch(&input) {
                Ok(outcome) if outcome.default_prevented => {
                    trace!(event = %input.kind(), "default action suppressed");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Dropped input event"),
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!(
                    notifications = self.manager.map().fired(),
                    "Close requested, exiting"
                );
                event_loop.exit();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.collector.set_scale_factor(scale_factor);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(window) = &self.window {
                    let size = new_size.to_logical::<f64>(window.scale_factor());
                    self.manager.map_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}
