use anyhow::{Context, Result};
use std::collections::HashMap;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::system::{StepOutcome, System};

/// Host window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// `P` toggles pause, `Escape` stops the system.
    pub keyboard_controls: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "kairos".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            keyboard_controls: true,
        }
    }
}

/// Drives a `System` from the platform event loop.
pub struct Runtime;

impl Runtime {
    /// Opens a window, steps `system` once per redraw until it stops, emits
    /// `Exit`, and hands the system back.
    pub fn run(config: RuntimeConfig, system: System) -> Result<System> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host::new(config, system);

        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;

        host.system.stop();
        host.system.finish();
        Ok(host.system)
    }
}

struct Host {
    config: RuntimeConfig,
    system: System,
    windows: HashMap<WindowId, Window>,
}

impl Host {
    fn new(config: RuntimeConfig, system: System) -> Self {
        Self {
            config,
            system,
            windows: HashMap::new(),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        self.windows.insert(id, window);
        Ok(id)
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if !self.config.keyboard_controls || event.state != ElementState::Pressed || event.repeat {
            return;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::KeyP) => {
                let paused = self.system.is_paused();
                self.system.set_pause(!paused);
            }
            PhysicalKey::Code(KeyCode::Escape) => self.system.stop(),
            _ => {}
        }
    }

    /// One pump tick per loop iteration, however many windows are open.
    /// Redraws are only requested for presentation.
    fn pump(&mut self) -> StepOutcome {
        let outcome = self.system.step();

        for window in self.windows.values() {
            window.request_redraw();
        }

        outcome
    }

    fn window_closed(&mut self, id: WindowId) {
        self.windows.remove(&id);

        if self.windows.is_empty() && self.system.shutdown_on_window_close() {
            log::info!("last window closed; stopping system");
            self.system.stop();
        }
    }
}

impl ApplicationHandler for Host {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            log::error!("failed to create initial window: {e:#}");
            self.system.stop();
            event_loop.exit();
            return;
        }

        if !self.system.is_running() {
            self.system.start();
            self.system.config_stage();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.system.is_running() {
            event_loop.exit();
            return;
        }

        // A game loop: keep ticking rather than waiting for input.
        event_loop.set_control_flow(ControlFlow::Poll);

        self.pump();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.window_closed(window_id),

            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event),

            _ => {}
        }

        if !self.system.is_running() {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{SystemConfig, SystemCtx, SystemMessage};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting_host() -> (Host, Rc<RefCell<u32>>) {
        let frames = Rc::new(RefCell::new(0));
        let sink = frames.clone();

        let mut system = System::new(SystemConfig::variable().with_idle_sleep(None));
        system.add_listener(Box::new(move |msg: &SystemMessage, _: &mut SystemCtx| {
            if let SystemMessage::PreFrame(_) = msg {
                *sink.borrow_mut() += 1;
            }
        }));
        system.start();

        (Host::new(RuntimeConfig::default(), system), frames)
    }

    #[test]
    fn pump_steps_once_per_loop_iteration() {
        let (mut host, frames) = counting_host();

        for _ in 0..3 {
            assert!(matches!(host.pump(), StepOutcome::Advanced { .. }));
        }

        assert_eq!(*frames.borrow(), 3);
    }

    #[test]
    fn pump_on_stopped_system_dispatches_nothing() {
        let (mut host, frames) = counting_host();
        host.system.stop();

        assert_eq!(host.pump(), StepOutcome::Stopped);
        assert_eq!(*frames.borrow(), 0);
    }
}
