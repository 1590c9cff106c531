#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for traffic viewer adapters.

mod arena;

pub use arena::{tint_color, ArenaHandle, VisualArena};

use anyhow::Result as AnyResult;
use glam::Vec3;
use std::{error::Error, fmt, time::Duration};
use traffic_viewer_core::{ConfigRequest, MapLayout, TemplateShape};
use traffic_viewer_registry::{EntityRegistry, VisualClass};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Configuration the user asked to push to the simulation this frame.
    pub apply_config: Option<ConfigRequest>,
    /// Whether the user requested a simulation reset this frame.
    pub reset: bool,
    /// Whether the user requested a baseline capture this frame.
    pub capture_baseline: bool,
}

/// Single drawable visual resolved from a registry entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneInstance {
    /// Class the visual belongs to.
    pub class: VisualClass,
    /// Primitive used to draw the visual.
    pub shape: TemplateShape,
    /// Rendered world position of the visual's base.
    pub position: Vec3,
    /// Rotation about world +Y in radians; zero faces +Z.
    pub yaw: f32,
    /// Extent of the primitive before rotation.
    pub size: Vec3,
    /// Fill colour.
    pub color: Color,
}

impl SceneInstance {
    /// Axis-aligned extent of the primitive once rotated by its yaw.
    #[must_use]
    pub fn footprint(&self) -> Vec3 {
        let (sin, cos) = self.yaw.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        Vec3::new(
            cos * self.size.x + sin * self.size.z,
            self.size.y,
            sin * self.size.x + cos * self.size.z,
        )
    }

    /// Centre of the primitive, lifted so its base rests at `position`.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.size.y * 0.5, 0.0)
    }
}

/// Eye and focus point of the perspective camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
}

impl CameraRig {
    /// Frames a grid of `width` by `height` cells anchored at `origin`.
    #[must_use]
    pub fn framing(origin: Vec3, cell_size: f32, width: u32, height: u32) -> Self {
        let extent = Vec3::new(width as f32, 0.0, height as f32) * cell_size;
        let target = origin + extent * 0.5;
        let reach = extent.x.max(extent.z).max(cell_size);
        Self {
            eye: target + Vec3::new(0.0, reach * 0.9, -reach * 0.75),
            target,
        }
    }

    /// Frames the road network described by `layout`.
    #[must_use]
    pub fn for_layout(origin: Vec3, cell_size: f32, layout: &MapLayout) -> Self {
        Self::framing(origin, cell_size, layout.width, layout.height)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::framing(Vec3::ZERO, 1.0, 30, 30)
    }
}

/// Side panel hosting the metrics readout and session controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPanelView {
    /// Width of the panel in screen pixels.
    pub width: f32,
    /// Fill colour behind the panel widgets.
    pub background: Color,
}

impl ControlPanelView {
    /// Creates a new control panel descriptor.
    #[must_use]
    pub const fn new(width: f32, background: Color) -> Self {
        Self { width, background }
    }
}

/// Scene description combining static tiles, dynamic visuals and overlays.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Scene {
    /// Drawable visuals in the order they should be drawn.
    pub instances: Vec<SceneInstance>,
    /// Camera used for the frame.
    pub camera: CameraRig,
    /// Status lines drawn in the control panel.
    pub status_lines: Vec<String>,
    /// Control panel drawn beside the 3D view, if any.
    pub control_panel: Option<ControlPanelView>,
}

impl Scene {
    /// Creates an empty scene viewed through `camera`.
    #[must_use]
    pub fn new(camera: CameraRig, control_panel: Option<ControlPanelView>) -> Self {
        Self {
            instances: Vec::new(),
            camera,
            status_lines: Vec::new(),
            control_panel,
        }
    }

    /// Forgets every instance and status line, keeping the camera.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.status_lines.clear();
    }

    /// Appends a drawable instance for every live entry of `registry`.
    /// Returns the number of instances appended.
    pub fn extend_from_registry<K>(
        &mut self,
        arena: &VisualArena,
        registry: &EntityRegistry<K, ArenaHandle>,
    ) -> usize
    where
        K: Ord + Copy,
    {
        let before = self.instances.len();
        self.instances.extend(registry.iter().filter_map(|(_, entity)| {
            arena.instance(entity.handle(), entity.current_position(), entity.target())
        }));
        self.instances.len() - before
    }

    /// Number of instances of the provided class.
    #[must_use]
    pub fn count_of(&self, class: VisualClass) -> usize {
        self.instances
            .iter()
            .filter(|instance| instance.class == class)
            .count()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Values the control panel starts from.
    pub panel_defaults: ConfigRequest,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(
        window_title: T,
        clear_color: Color,
        panel_defaults: ConfigRequest,
        scene: Scene,
    ) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            panel_defaults,
            scene,
        }
    }
}

/// Rendering backend capable of presenting traffic scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and rebuilds the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Templates must have a positive, finite extent along every axis.
    InvalidTemplateSize {
        /// Class whose template failed validation.
        class: VisualClass,
        /// Provided extent that failed validation.
        size: Vec3,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTemplateSize { class, size } => {
                write!(
                    f,
                    "{class} template size must be positive along every axis (received {size})"
                )
            }
        }
    }
}

impl Error for RenderingError {}
