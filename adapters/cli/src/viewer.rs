use std::time::Duration;

use anyhow::Result;
use glam::Vec3;
use tracing::{info, warn};
use traffic_viewer_core::{ConfigRequest, ViewerConfig};
use traffic_viewer_rendering::{
    CameraRig, Color, ControlPanelView, FrameInput, Presentation, RenderingBackend, Scene,
    VisualArena,
};
use traffic_viewer_rendering_macroquad::MacroquadBackend;
use traffic_viewer_system_session::{EventOutcome, PollingTask, SessionController};

use crate::args::CliArgs;

const WINDOW_TITLE: &str = "Traffic Viewer";
const CLEAR_COLOR: Color = Color::from_rgb_u8(28, 32, 38);
const PANEL_WIDTH: f32 = 320.0;
const PANEL_BACKGROUND: Color = Color::from_rgb_u8(44, 62, 80);

/// World placement shared by the camera and every projected visual.
#[derive(Clone, Copy, Debug)]
struct GridView {
    origin: Vec3,
    cell_size: f32,
}

/// Opens the viewer window and drives the session once per frame.
pub(crate) fn run(
    mut controller: SessionController<VisualArena>,
    task: PollingTask,
    config: &ViewerConfig,
    args: &CliArgs,
) -> Result<()> {
    let view = GridView {
        origin: config.world_origin,
        cell_size: config.cell_size,
    };
    let camera = CameraRig::framing(view.origin, view.cell_size, 30, 30);
    let scene = Scene::new(camera, Some(ControlPanelView::new(PANEL_WIDTH, PANEL_BACKGROUND)));
    let presentation =
        Presentation::new(WINDOW_TITLE, CLEAR_COLOR, ConfigRequest::default(), scene);

    let mut backend = MacroquadBackend::new().with_show_fps(args.show_fps);
    if let Some(vsync) = args.vsync {
        backend = backend.with_vsync(vsync.enabled());
    }

    backend.run(presentation, move |dt, input, scene| {
        update_frame(&mut controller, &task, view, dt, input, scene);
    })
}

fn update_frame(
    controller: &mut SessionController<VisualArena>,
    task: &PollingTask,
    view: GridView,
    dt: Duration,
    input: FrameInput,
    scene: &mut Scene,
) {
    handle_input(controller, task, input);

    for outcome in controller.pump(task) {
        if let EventOutcome::MapLoaded { tiles } = outcome {
            info!(tiles, "map loaded");
        }
    }
    controller.advance_frame(dt);

    rebuild_scene(controller, view, scene);
}

fn handle_input(
    controller: &mut SessionController<VisualArena>,
    task: &PollingTask,
    input: FrameInput,
) {
    if let Some(request) = input.apply_config {
        match task.apply_config(request) {
            Ok(()) => info!(
                mode = request.signal_mode.as_str(),
                light_cycle = request.light_cycle,
                spawn_scale = request.base_spawn_scale,
                "configuration queued"
            ),
            Err(error) => warn!(%error, "configuration dropped"),
        }
    }

    if input.reset {
        match controller.request_reset(task) {
            Ok(epoch) => info!(epoch = epoch.get(), "simulation reset requested"),
            Err(error) => warn!(%error, "reset could not be requested"),
        }
    }

    if input.capture_baseline {
        let _ = controller.capture_baseline();
    }
}

fn rebuild_scene(controller: &SessionController<VisualArena>, view: GridView, scene: &mut Scene) {
    scene.clear();
    if let Some(layout) = controller.map() {
        scene.camera = CameraRig::for_layout(view.origin, view.cell_size, layout);
    }

    let arena = controller.factory();
    let _ = scene.extend_from_registry(arena, controller.tiles());
    let _ = scene.extend_from_registry(arena, controller.vehicles());
    let _ = scene.extend_from_registry(arena, controller.signals());

    scene
        .status_lines
        .extend(controller.analytics().panel().lines().iter().cloned());
}
