#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the traffic viewer.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module so the control panel
//! can host widgets. All UI-specific calls live inside the local `ui` module to
//! avoid leaking Macroquad UI types throughout the renderer.

mod ui;

use self::ui::{
    draw_control_panel_ui, ControlPanelDraft, ControlPanelUiContext, ControlPanelUiResult,
};
use anyhow::Result;
use glam::Vec3;
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D},
    input::{is_key_pressed, KeyCode},
    math::{Vec2 as MacroquadVec2, Vec3 as MacroquadVec3},
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::info;
use traffic_viewer_core::{ConfigRequest, TemplateShape};
use traffic_viewer_system_interpolation::frame_delta;
use traffic_viewer_rendering::{
    CameraRig, ControlPanelView, FrameInput, Presentation, RenderingBackend, Scene,
    SceneInstance,
};

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    apply_latched: Option<ConfigRequest>,
    reset_latched: bool,
    baseline_latched: bool,
}

impl ControlPanelInputState {
    /// Returns the latched configuration request, clearing it so it is sent once.
    pub fn take_apply_config(&mut self) -> Option<ConfigRequest> {
        self.apply_latched.take()
    }

    /// Records that the apply button was pressed with the provided values.
    pub fn register_apply_config(&mut self, request: ConfigRequest) {
        self.apply_latched = Some(request);
    }

    /// Returns whether the UI requested a reset and clears the latch.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_latched)
    }

    /// Records that the reset button was pressed this frame.
    pub fn register_reset(&mut self) {
        self.reset_latched = true;
    }

    /// Returns whether the UI requested a baseline capture and clears the latch.
    pub fn take_capture_baseline(&mut self) -> bool {
        std::mem::take(&mut self.baseline_latched)
    }

    /// Records that the baseline button was pressed this frame.
    pub fn register_capture_baseline(&mut self) {
        self.baseline_latched = true;
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the viewer.
    quit_requested: bool,
    /// `R` resets the simulation.
    reset: bool,
    /// `B` captures the current average wait as the baseline.
    capture_baseline: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            reset: is_key_pressed(KeyCode::R),
            capture_baseline: is_key_pressed(KeyCode::B),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, frame: Duration, render: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.render_accum += render;

        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let avg_render = self.render_accum / self.frames.max(1);

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.render_accum = Duration::ZERO;
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_render,
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            panel_defaults,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 800,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();
            let mut draft = ControlPanelDraft::from_request(panel_defaults);

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let frame_dt = frame_delta(macroquad::time::get_frame_time());
                let frame_input = gather_frame_input(&mut control_panel_input, keyboard);
                update_scene(frame_dt, frame_input, &mut scene);

                let render_start = Instant::now();
                set_camera(&to_macroquad_camera(scene.camera));
                macroquad::models::draw_grid(
                    64,
                    1.0,
                    macroquad::color::Color::from_rgba(90, 90, 90, 255),
                    macroquad::color::Color::from_rgba(60, 60, 60, 255),
                );
                for instance in &scene.instances {
                    draw_instance(instance);
                }
                set_default_camera();

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                if let Some(panel) = scene.control_panel {
                    let context = control_panel_context(
                        panel,
                        &scene.status_lines,
                        screen_width,
                        screen_height,
                    );
                    let mut control_panel_ui = macroquad::ui::root_ui();
                    let ControlPanelUiResult {
                        apply_pressed,
                        reset_pressed,
                        baseline_pressed,
                    } = draw_control_panel_ui(&mut control_panel_ui, context, &mut draft);
                    if apply_pressed {
                        control_panel_input.register_apply_config(draft.to_request());
                    }
                    if reset_pressed {
                        control_panel_input.register_reset();
                    }
                    if baseline_pressed {
                        control_panel_input.register_capture_baseline();
                    }
                }

                let render_duration = render_start.elapsed();
                let fps_metrics = fps_counter.record_frame(frame_dt, render_duration);
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            fps_10s = trailing_ten_seconds,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input(
    control_panel: &mut ControlPanelInputState,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    FrameInput {
        apply_config: control_panel.take_apply_config(),
        reset: control_panel.take_reset() || keyboard.reset,
        capture_baseline: control_panel.take_capture_baseline() || keyboard.capture_baseline,
    }
}

fn control_panel_context(
    panel: ControlPanelView,
    status_lines: &[String],
    screen_width: f32,
    screen_height: f32,
) -> ControlPanelUiContext<'_> {
    let width = panel.width.clamp(0.0, screen_width);
    let left = screen_width - width;
    let background = to_macroquad_color(panel.background);
    macroquad::shapes::draw_rectangle(left, 0.0, width, screen_height, background);

    ControlPanelUiContext {
        origin: MacroquadVec2::new(left, 0.0),
        size: MacroquadVec2::new(width, screen_height),
        background,
        button: to_macroquad_color(panel.background.lighten(0.2)),
        status_lines,
    }
}

fn draw_instance(instance: &SceneInstance) {
    let color = to_macroquad_color(instance.color);
    let center = to_macroquad_vec3(instance.center());
    match instance.shape {
        TemplateShape::Cube => {
            let size = to_macroquad_vec3(instance.footprint());
            macroquad::models::draw_cube(center, size, None, color);
        }
        TemplateShape::Sphere => {
            macroquad::models::draw_sphere(center, instance.size.max_element() * 0.5, None, color);
        }
    }
}

fn to_macroquad_camera(rig: CameraRig) -> Camera3D {
    Camera3D {
        position: to_macroquad_vec3(rig.eye),
        target: to_macroquad_vec3(rig.target),
        up: MacroquadVec3::new(0.0, 1.0, 0.0),
        ..Camera3D::default()
    }
}

fn to_macroquad_vec3(vector: Vec3) -> MacroquadVec3 {
    MacroquadVec3::new(vector.x, vector.y, vector.z)
}

fn to_macroquad_color(color: traffic_viewer_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_viewer_core::SignalMode;

    #[test]
    fn keyboard_and_panel_requests_merge() {
        let mut panel = ControlPanelInputState::default();
        panel.register_capture_baseline();
        let keyboard = KeyboardShortcuts {
            reset: true,
            ..KeyboardShortcuts::default()
        };

        let input = gather_frame_input(&mut panel, keyboard);

        assert!(input.reset);
        assert!(input.capture_baseline);
        assert!(input.apply_config.is_none());
        assert_eq!(
            gather_frame_input(&mut panel, KeyboardShortcuts::default()),
            FrameInput::default()
        );
    }

    #[test]
    fn apply_request_is_delivered_once() {
        let mut panel = ControlPanelInputState::default();
        let request = ConfigRequest::new(SignalMode::Adaptive, 20, 2.0);
        panel.register_apply_config(request);

        let first = gather_frame_input(&mut panel, KeyboardShortcuts::default());
        let second = gather_frame_input(&mut panel, KeyboardShortcuts::default());

        assert_eq!(first.apply_config, Some(request));
        assert_eq!(second.apply_config, None);
    }

    #[test]
    fn fps_counter_reports_after_one_second() {
        let mut counter = FpsCounter::default();
        let frame = Duration::from_millis(250);
        for _ in 0..3 {
            assert!(counter
                .record_frame(frame, Duration::from_millis(1))
                .is_none());
        }

        let metrics = counter
            .record_frame(frame, Duration::from_millis(1))
            .expect("one second elapsed");
        assert!((metrics.per_second - 4.0).abs() < 1e-4);
        assert_eq!(metrics.avg_render, Duration::from_millis(1));
    }
}
