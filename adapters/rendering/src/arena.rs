use std::collections::BTreeMap;

use glam::Vec3;
use traffic_viewer_core::{TemplateConfig, TemplateShape, VisualTemplates, Zone};
use traffic_viewer_registry::{Tint, VisualClass, VisualFactory, VisualTarget};

use crate::{Color, RenderingError, SceneInstance};

const GO: Color = Color::from_rgb_u8(46, 204, 113);
const STOP: Color = Color::from_rgb_u8(231, 76, 60);
const SLOW: Color = Color::from_rgb_u8(243, 156, 18);
const DOWNTOWN: Color = Color::from_rgb_u8(242, 215, 213);
const RESIDENTIAL: Color = Color::from_rgb_u8(213, 245, 227);
const INDUSTRIAL: Color = Color::from_rgb_u8(252, 243, 207);
const OTHER_ZONE: Color = Color::from_rgb_u8(214, 234, 248);
const INTERSECTION: Color = Color::from_rgb_u8(189, 189, 189);
const SIGNALISED_INTERSECTION: Color = Color::from_rgb_u8(169, 204, 227);

/// Handle of a visual instantiated by a [`VisualArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaHandle(u32);

impl ArenaHandle {
    /// Numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Backend-agnostic store of instantiated visuals.
///
/// The arena only remembers which template each handle was spawned from.
/// Placement and colour are read from the registry every frame when the
/// scene is assembled.
#[derive(Clone, Debug)]
pub struct VisualArena {
    templates: VisualTemplates,
    next: u32,
    live: BTreeMap<ArenaHandle, VisualClass>,
}

impl VisualArena {
    /// Creates an arena from the configured templates.
    pub fn new(templates: VisualTemplates) -> Result<Self, RenderingError> {
        for class in [VisualClass::Vehicle, VisualClass::Signal, VisualClass::Tile] {
            let size = template(&templates, class).size;
            let valid = size.is_finite() && size.cmpgt(Vec3::ZERO).all();
            if !valid {
                return Err(RenderingError::InvalidTemplateSize { class, size });
            }
        }

        Ok(Self {
            templates,
            next: 0,
            live: BTreeMap::new(),
        })
    }

    /// Number of live visuals.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of live visuals of the provided class.
    #[must_use]
    pub fn live_count_of(&self, class: VisualClass) -> usize {
        self.live.values().filter(|live| **live == class).count()
    }

    /// Describes how the visual behind `handle` should be drawn at
    /// `position`. Returns `None` for handles that are not live.
    #[must_use]
    pub fn instance(
        &self,
        handle: ArenaHandle,
        position: Vec3,
        target: &VisualTarget,
    ) -> Option<SceneInstance> {
        let class = *self.live.get(&handle)?;
        let template = template(&self.templates, class);
        let base = Color::from_rgb_u8(template.color[0], template.color[1], template.color[2]);

        Some(SceneInstance {
            class,
            shape: template.shape,
            position,
            yaw: target.yaw,
            size: template.size,
            color: tint_color(target.tint, base),
        })
    }
}

impl VisualFactory for VisualArena {
    type Handle = ArenaHandle;

    fn supports(&self, class: VisualClass) -> bool {
        template(&self.templates, class).enabled
    }

    fn spawn(&mut self, class: VisualClass, _target: &VisualTarget) -> ArenaHandle {
        let handle = ArenaHandle(self.next);
        self.next = self.next.wrapping_add(1);
        let _ = self.live.insert(handle, class);
        handle
    }

    fn dispose(&mut self, handle: ArenaHandle) {
        let _ = self.live.remove(&handle);
    }
}

fn template(templates: &VisualTemplates, class: VisualClass) -> &TemplateConfig {
    match class {
        VisualClass::Vehicle => &templates.vehicle,
        VisualClass::Signal => &templates.signal,
        VisualClass::Tile => &templates.tile,
    }
}

/// Colour shown for `tint`. States without a dedicated colour keep `base`.
#[must_use]
pub fn tint_color(tint: Tint, base: Color) -> Color {
    match tint {
        Tint::Go => GO,
        Tint::Stop | Tint::Stopped => STOP,
        Tint::Slow => SLOW,
        Tint::Cruising => base,
        Tint::Road(zone) => match zone {
            Zone::Downtown => DOWNTOWN,
            Zone::Residential => RESIDENTIAL,
            Zone::Industrial => INDUSTRIAL,
            Zone::Other => OTHER_ZONE,
            Zone::Outside => base,
        },
        Tint::Intersection { signalised: true } => SIGNALISED_INTERSECTION,
        Tint::Intersection { signalised: false } => INTERSECTION,
    }
}
