//! Caller-side state that fills the per-draw uniform blocks.

use glam::{Vec3, Vec4};
use log::warn;
use parking_lot::RwLock;

use crate::stage::{FrameLights, Light, MAX_LIGHTS};

/// Light color table cycled at runtime, dimmest to brightest.
pub const LIGHT_COLORS: &[Vec4] = &[
    Vec4::new(1.0, 1.0, 1.0, 1.0),
    Vec4::new(3.1, 3.1, 3.1, 1.0),
    Vec4::new(10.0, 10.0, 10.0, 1.0),
    Vec4::new(31.0, 31.0, 31.0, 1.0),
    Vec4::new(100.0, 100.0, 100.0, 1.0),
    Vec4::new(0.001, 0.001, 0.001, 1.0),
    Vec4::new(0.01, 0.01, 0.01, 1.0),
    Vec4::new(0.1, 0.1, 0.1, 1.0),
    Vec4::new(0.31, 0.31, 0.31, 0.5),
];

/// Background color table cycled at runtime.
pub const BACKGROUNDS: &[Vec4] = &[
    Vec4::new(0.05, 0.07, 0.1, 1.0),
    Vec4::new(0.5, 0.5, 0.5, 0.5),
    Vec4::new(1.0, 1.0, 1.0, 1.0),
    Vec4::new(3.1, 3.1, 3.1, 1.0),
    Vec4::new(10.0, 10.0, 10.0, 1.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
    Vec4::new(0.01, 0.01, 0.01, 1.0),
];

/// Attenuation constants shared by every generated light record.
pub const DEFAULT_PROPAGATION: Vec4 = Vec4::new(1.0, 0.09, 0.032, 0.0);

/// Cursor over a fixed table of values, wrapping in both directions.
#[derive(Debug, Clone)]
pub struct Cycle<T> {
    values: Vec<T>,
    index: usize,
}

impl<T: Copy> Cycle<T> {
    /// Builds a cycle over a non-empty table.
    pub fn new(values: &[T]) -> Self {
        assert!(!values.is_empty(), "a cycle needs at least one value");
        Self {
            values: values.to_vec(),
            index: 0,
        }
    }

    pub fn get(&self) -> T {
        self.values[self.index]
    }

    pub fn next(&mut self) -> T {
        self.index = (self.index + 1) % self.values.len();
        self.get()
    }

    pub fn prev(&mut self) -> T {
        self.index = (self.index + self.values.len() - 1) % self.values.len();
        self.get()
    }
}

/// Immutable per-draw snapshot handed to the uniform writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub light_color: Vec4,
    pub light_positions: Vec<Vec3>,
    pub background_color: Vec4,
}

impl Environment {
    /// Assembles the frame's light block, truncating past capacity.
    pub fn frame_lights(&self) -> FrameLights {
        let dropped = self.light_positions.len().saturating_sub(MAX_LIGHTS);
        if dropped > 0 {
            warn!("dropping {dropped} light(s) beyond the {MAX_LIGHTS}-record capacity");
        }
        let mut lights = FrameLights::new();
        for position in self.light_positions.iter().take(MAX_LIGHTS) {
            lights.push(Light {
                propagation: DEFAULT_PROPAGATION,
                center: position.extend(1.0),
                color: self.light_color,
            });
        }
        lights
    }
}

/// Thread-safe holder of the cycling light and background tables.
///
/// Methods take `&self`; interior locks keep event-loop writers and the
/// uniform writer decoupled, the same way the runtime shares input state.
#[derive(Debug)]
pub struct EnvironmentState {
    light_colors: RwLock<Cycle<Vec4>>,
    backgrounds: RwLock<Cycle<Vec4>>,
    light_positions: RwLock<Vec<Vec3>>,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            light_colors: RwLock::new(Cycle::new(LIGHT_COLORS)),
            backgrounds: RwLock::new(Cycle::new(BACKGROUNDS)),
            light_positions: RwLock::new(Vec::new()),
        }
    }
}

impl EnvironmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_light(&self) -> Vec4 {
        self.light_colors.write().next()
    }

    pub fn prev_light(&self) -> Vec4 {
        self.light_colors.write().prev()
    }

    pub fn next_background(&self) -> Vec4 {
        self.backgrounds.write().next()
    }

    pub fn prev_background(&self) -> Vec4 {
        self.backgrounds.write().prev()
    }

    /// Replaces the set of positions fed into the light block.
    pub fn set_light_positions(&self, positions: Vec<Vec3>) {
        *self.light_positions.write() = positions;
    }

    pub fn snapshot(&self) -> Environment {
        Environment {
            light_color: self.light_colors.read().get(),
            light_positions: self.light_positions.read().clone(),
            background_color: self.backgrounds.read().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_in_both_directions() {
        let mut cycle = Cycle::new(&[1, 2, 3]);
        assert_eq!(cycle.get(), 1);
        assert_eq!(cycle.next(), 2);
        assert_eq!(cycle.next(), 3);
        assert_eq!(cycle.next(), 1);
        assert_eq!(cycle.prev(), 3);
        assert_eq!(cycle.prev(), 2);
    }

    #[test]
    fn snapshot_tracks_cycled_colors() {
        let state = EnvironmentState::new();
        assert_eq!(state.snapshot().light_color, LIGHT_COLORS[0]);
        state.next_light();
        assert_eq!(state.snapshot().light_color, LIGHT_COLORS[1]);
        state.prev_light();
        state.prev_light();
        assert_eq!(
            state.snapshot().light_color,
            LIGHT_COLORS[LIGHT_COLORS.len() - 1]
        );
    }

    #[test]
    fn frame_lights_mirror_the_positions() {
        let state = EnvironmentState::new();
        state.set_light_positions(vec![Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO]);
        let lights = state.snapshot().frame_lights();
        assert_eq!(lights.count(), 2);
        assert_eq!(lights.active()[0].center, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(lights.active()[0].color, LIGHT_COLORS[0]);
        assert_eq!(lights.active()[0].propagation, DEFAULT_PROPAGATION);
    }

    #[test]
    fn frame_lights_truncate_at_capacity() {
        let environment = Environment {
            light_color: Vec4::ONE,
            light_positions: (0..MAX_LIGHTS + 4)
                .map(|i| Vec3::new(i as f32, 0.0, 0.0))
                .collect(),
            background_color: BACKGROUNDS[0],
        };
        let lights = environment.frame_lights();
        assert_eq!(lights.count(), MAX_LIGHTS as u32);
    }
}
