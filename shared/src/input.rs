//! Input aggregation
//!
//! Window events arrive whenever the platform delivers them; the frame driver
//! wants one consistent snapshot per tick. Input systems write into
//! [`InputAggregator`] (held keys as level flags, mouse/touch motion as
//! accumulated deltas, presses as latched one-shots) and the frame driver calls
//! [`InputAggregator::sample`] exactly once per tick, which hands out an
//! [`InputIntent`] and clears everything that should only act once.

use bevy::prelude::*;

use crate::touch::TouchControls;

/// Radians of yaw per pixel of horizontal mouse drag.
pub const DRAG_YAW_PER_PIXEL: f32 = 0.0035;

/// Radians of pitch per pixel of vertical mouse drag.
pub const DRAG_PITCH_PER_PIXEL: f32 = 0.003;

/// Camera distance per pixel of wheel scroll.
pub const WHEEL_ZOOM_PER_PIXEL: f32 = 0.002;

/// Camera distance per wheel notch (line-based scrolling).
pub const WHEEL_ZOOM_PER_LINE: f32 = 0.2;

/// Everything the resolvers need to know about the player's wishes for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputIntent {
    /// x = strafe right, y = forward. Each component in `-1..=1`.
    pub move_axis: Vec2,
    pub run: bool,
    /// Set on the tick after a jump press, never while merely held.
    pub jump: bool,
    /// Radians this tick: x adds to yaw, y adds to pitch (downward tilt).
    pub look: Vec2,
    /// Camera distance change, positive = farther.
    pub zoom: f32,
    /// Turn axis in `-1..=1`, positive turns left (counter-clockwise from above).
    pub turn: f32,
    /// Tilt axis in `-1..=1`, positive looks up.
    pub tilt: f32,
    pub respawn: bool,
    pub toggle_view: bool,
}

/// Which device family currently drives the avatar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputSource {
    #[default]
    Desktop,
    Touch,
}

/// Keyboard and mouse state.
#[derive(Debug, Clone, Default)]
pub struct DesktopInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub tilt_up: bool,
    pub tilt_down: bool,
    jump_latched: bool,
    drag: Vec2,
    zoom: f32,
}

impl DesktopInput {
    /// Latch a jump. Call on the press edge only.
    pub fn press_jump(&mut self) {
        self.jump_latched = true;
    }

    /// Accumulate a mouse drag in pixels (screen space, +y down).
    pub fn add_drag(&mut self, delta: Vec2) {
        self.drag += delta;
    }

    /// Accumulate a zoom change in camera distance units.
    pub fn add_zoom(&mut self, distance: f32) {
        self.zoom += distance;
    }

    /// Drop every held key and pending delta, for when key reads stop
    /// (focus moved to a panel) and releases would go unseen.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    fn intent(&self) -> InputIntent {
        InputIntent {
            move_axis: Vec2::new(
                axis(self.right, self.left),
                axis(self.forward, self.backward),
            ),
            run: self.run,
            jump: self.jump_latched,
            look: Vec2::new(
                -self.drag.x * DRAG_YAW_PER_PIXEL,
                self.drag.y * DRAG_PITCH_PER_PIXEL,
            ),
            zoom: self.zoom,
            turn: axis(self.turn_left, self.turn_right),
            tilt: axis(self.tilt_up, self.tilt_down),
            ..default()
        }
    }

    fn clear_one_shots(&mut self) {
        self.jump_latched = false;
        self.drag = Vec2::ZERO;
        self.zoom = 0.0;
    }
}

#[inline]
fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Single producer/single consumer hand-off between input systems and the frame driver.
#[derive(Resource, Debug, Default)]
pub struct InputAggregator {
    pub desktop: DesktopInput,
    pub touch: TouchControls,
    active: InputSource,
    respawn: bool,
    toggle_view: bool,
}

impl InputAggregator {
    pub fn active_source(&self) -> InputSource {
        self.active
    }

    /// Switch the driving source. Called when a device produces fresh activity.
    pub fn activate(&mut self, source: InputSource) {
        if self.active != source {
            info!("Input source: {:?}", source);
            self.active = source;
        }
    }

    pub fn request_respawn(&mut self) {
        self.respawn = true;
    }

    pub fn request_view_toggle(&mut self) {
        self.toggle_view = true;
    }

    /// Produce this tick's intent from the active source and clear every one-shot.
    ///
    /// Held keys and held joysticks survive; jump edges, accumulated look/zoom
    /// deltas and commands do not. The inactive source is drained as well so
    /// stale deltas never leak in after a switch.
    pub fn sample(&mut self, dt: f32) -> InputIntent {
        let mut intent = match self.active {
            InputSource::Desktop => self.desktop.intent(),
            InputSource::Touch => self.touch.intent(dt),
        };
        intent.respawn = std::mem::take(&mut self.respawn);
        intent.toggle_view = std::mem::take(&mut self.toggle_view);

        self.desktop.clear_one_shots();
        self.touch.clear_one_shots();
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_is_one_shot() {
        let mut agg = InputAggregator::default();
        agg.desktop.press_jump();

        assert!(agg.sample(0.016).jump);
        // Still physically held, but no new edge.
        assert!(!agg.sample(0.016).jump);
    }

    #[test]
    fn test_level_flags_survive_sampling() {
        let mut agg = InputAggregator::default();
        agg.desktop.forward = true;
        agg.desktop.left = true;
        agg.desktop.run = true;

        for _ in 0..3 {
            let intent = agg.sample(0.016);
            assert_eq!(intent.move_axis, Vec2::new(-1.0, 1.0));
            assert!(intent.run);
        }
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut agg = InputAggregator::default();
        agg.desktop.forward = true;
        agg.desktop.backward = true;
        agg.desktop.turn_left = true;
        agg.desktop.turn_right = true;
        let intent = agg.sample(0.016);
        assert_eq!(intent.move_axis.y, 0.0);
        assert_eq!(intent.turn, 0.0);
    }

    #[test]
    fn test_drag_and_zoom_accumulate_then_clear() {
        let mut agg = InputAggregator::default();
        agg.desktop.add_drag(Vec2::new(10.0, 0.0));
        agg.desktop.add_drag(Vec2::new(10.0, -20.0));
        agg.desktop.add_zoom(0.5);

        let intent = agg.sample(0.016);
        assert!((intent.look.x - (-20.0 * DRAG_YAW_PER_PIXEL)).abs() < 1e-6);
        assert!((intent.look.y - (-20.0 * DRAG_PITCH_PER_PIXEL)).abs() < 1e-6);
        assert_eq!(intent.zoom, 0.5);

        let intent = agg.sample(0.016);
        assert_eq!(intent.look, Vec2::ZERO);
        assert_eq!(intent.zoom, 0.0);
    }

    #[test]
    fn test_commands_are_one_shot() {
        let mut agg = InputAggregator::default();
        agg.request_respawn();
        agg.request_view_toggle();

        let intent = agg.sample(0.016);
        assert!(intent.respawn && intent.toggle_view);
        let intent = agg.sample(0.016);
        assert!(!intent.respawn && !intent.toggle_view);
    }

    #[test]
    fn test_only_active_source_drives_intent() {
        let mut agg = InputAggregator::default();
        agg.desktop.forward = true;
        agg.touch.press_jump();
        agg.activate(InputSource::Touch);

        let intent = agg.sample(0.016);
        assert_eq!(intent.move_axis, Vec2::ZERO);
        assert!(intent.jump);

        // Desktop jump pressed while touch was active is drained, not replayed later.
        agg.desktop.press_jump();
        agg.sample(0.016);
        agg.activate(InputSource::Desktop);
        let intent = agg.sample(0.016);
        assert!(!intent.jump);
        assert_eq!(intent.move_axis, Vec2::new(0.0, 1.0));
    }
}
