//! Touch controls: two virtual joysticks, jump/dash buttons and free-finger look gestures.
//!
//! All coordinates are logical window pixels with +y pointing down, the way
//! touch events report them.

use bevy::prelude::*;

use crate::input::InputIntent;

/// Knob travel in pixels.
pub const JOYSTICK_RADIUS: f32 = 40.0;

/// Knob offsets up to this many pixels count as centred.
pub const JOYSTICK_DEAD_ZONE: f32 = 5.0;

/// Deflection fraction beyond which the movement stick dashes on its own.
pub const AUTO_DASH_FRACTION: f32 = 0.8;

/// Camera stick look rates at full deflection, rad/s.
pub const CAMERA_STICK_YAW_RATE: f32 = 3.0;
pub const CAMERA_STICK_PITCH_RATE: f32 = 2.4;

/// Free-finger drag sensitivity, radians per pixel.
pub const TOUCH_DRAG_YAW_PER_PIXEL: f32 = 0.004;
pub const TOUCH_DRAG_PITCH_PER_PIXEL: f32 = 0.003;

/// Camera distance per pixel of pinch.
pub const PINCH_ZOOM_PER_PIXEL: f32 = 0.01;

/// A virtual stick anchored at a fixed screen position and owned by one finger at a time.
#[derive(Debug, Clone, Default)]
pub struct Joystick {
    center: Vec2,
    finger: Option<u64>,
    knob: Vec2,
}

impl Joystick {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            ..default()
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Move the anchor (window resize). Keeps the current finger.
    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn is_held(&self) -> bool {
        self.finger.is_some()
    }

    /// Take ownership of a new finger if the stick is free and the touch lands within `grab_radius`.
    pub fn try_grab(&mut self, finger: u64, position: Vec2, grab_radius: f32) -> bool {
        if self.finger.is_some() || position.distance(self.center) > grab_radius {
            return false;
        }
        self.finger = Some(finger);
        self.set_knob(position);
        true
    }

    /// Follow the owning finger. Returns `false` for any other finger.
    pub fn drag(&mut self, finger: u64, position: Vec2) -> bool {
        if self.finger != Some(finger) {
            return false;
        }
        self.set_knob(position);
        true
    }

    /// Release if `finger` owns the stick; the knob recentres.
    pub fn release(&mut self, finger: u64) -> bool {
        if self.finger != Some(finger) {
            return false;
        }
        self.finger = None;
        self.knob = Vec2::ZERO;
        true
    }

    fn set_knob(&mut self, position: Vec2) {
        self.knob = (position - self.center).clamp_length_max(JOYSTICK_RADIUS);
    }

    /// Knob offset in pixels, at most [`JOYSTICK_RADIUS`] long.
    pub fn knob(&self) -> Vec2 {
        self.knob
    }

    /// Knob offset scaled to `-1..=1`, screen orientation (+y down), zero inside the dead zone.
    pub fn deflection(&self) -> Vec2 {
        if self.knob.length() <= JOYSTICK_DEAD_ZONE {
            Vec2::ZERO
        } else {
            self.knob / JOYSTICK_RADIUS
        }
    }

    /// Deflection as a move axis: x = right, y = forward (up on screen).
    pub fn move_axis(&self) -> Vec2 {
        let d = self.deflection();
        Vec2::new(d.x, -d.y)
    }

    pub fn is_dashing(&self) -> bool {
        self.knob.length() > JOYSTICK_RADIUS * AUTO_DASH_FRACTION
    }
}

/// One-finger drag and two-finger pinch over the parts of the screen not owned by a stick.
#[derive(Debug, Clone, Default)]
pub struct LookGesture {
    fingers: Vec<(u64, Vec2)>,
    pinch: Option<f32>,
}

impl LookGesture {
    /// Feed the free fingers currently down. Returns `(drag_pixels, pinch_pixels)` since the last update.
    ///
    /// A finger contributes motion only from its second sighting on, so the
    /// first frame of a touch never jumps the view.
    pub fn update(&mut self, touches: &[(u64, Vec2)]) -> (Vec2, f32) {
        let mut drag = Vec2::ZERO;
        let mut pinch = 0.0;

        match touches {
            [(id, pos)] => {
                if let Some(last) = self.last_position(*id) {
                    drag = *pos - last;
                }
                self.pinch = None;
            }
            [(id_a, a), (id_b, b)] => {
                let distance = a.distance(*b);
                let both_known =
                    self.last_position(*id_a).is_some() && self.last_position(*id_b).is_some();
                if let (Some(previous), true) = (self.pinch, both_known) {
                    pinch = distance - previous;
                }
                self.pinch = Some(distance);
            }
            _ => self.pinch = None,
        }

        self.fingers = touches.to_vec();
        (drag, pinch)
    }

    fn last_position(&self, finger: u64) -> Option<Vec2> {
        self.fingers
            .iter()
            .find_map(|(id, pos)| (*id == finger).then_some(*pos))
    }
}

/// The touch input source.
#[derive(Debug, Clone, Default)]
pub struct TouchControls {
    pub movement: Joystick,
    pub camera: Joystick,
    pub gesture: LookGesture,
    pub dash_held: bool,
    jump_latched: bool,
    drag: Vec2,
    pinch: f32,
}

impl TouchControls {
    pub fn press_jump(&mut self) {
        self.jump_latched = true;
    }

    /// Accumulate gesture output until the next sample.
    pub fn add_gesture(&mut self, drag: Vec2, pinch: f32) {
        self.drag += drag;
        self.pinch += pinch;
    }

    /// Drop any finger that is no longer down.
    pub fn release_finger(&mut self, finger: u64) {
        self.movement.release(finger);
        self.camera.release(finger);
    }

    pub(crate) fn intent(&self, dt: f32) -> InputIntent {
        let stick = self.camera.deflection();
        InputIntent {
            move_axis: self.movement.move_axis(),
            run: self.dash_held || self.movement.is_dashing(),
            jump: self.jump_latched,
            look: Vec2::new(
                -stick.x * CAMERA_STICK_YAW_RATE * dt - self.drag.x * TOUCH_DRAG_YAW_PER_PIXEL,
                stick.y * CAMERA_STICK_PITCH_RATE * dt + self.drag.y * TOUCH_DRAG_PITCH_PER_PIXEL,
            ),
            // Spreading fingers apart pulls the camera in.
            zoom: -self.pinch * PINCH_ZOOM_PER_PIXEL,
            ..default()
        }
    }

    pub(crate) fn clear_one_shots(&mut self) {
        self.jump_latched = false;
        self.drag = Vec2::ZERO;
        self.pinch = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick() -> Joystick {
        Joystick::new(Vec2::new(100.0, 100.0))
    }

    #[test]
    fn test_dead_zone() {
        let mut s = stick();
        assert!(s.try_grab(1, Vec2::new(104.0, 103.0), 60.0));
        assert_eq!(s.deflection(), Vec2::ZERO);
        assert_eq!(s.move_axis(), Vec2::ZERO);
        assert!(!s.is_dashing());
    }

    #[test]
    fn test_knob_clamped_and_y_inverted() {
        let mut s = stick();
        s.try_grab(1, Vec2::new(100.0, 100.0), 60.0);
        // Finger far above the stick: full forward.
        s.drag(1, Vec2::new(100.0, 0.0));
        assert_eq!(s.knob(), Vec2::new(0.0, -JOYSTICK_RADIUS));
        assert_eq!(s.move_axis(), Vec2::new(0.0, 1.0));
        assert!(s.is_dashing());

        // Half deflection to the right.
        s.drag(1, Vec2::new(120.0, 100.0));
        assert_eq!(s.move_axis(), Vec2::new(0.5, 0.0));
        assert!(!s.is_dashing());
    }

    #[test]
    fn test_auto_dash_threshold() {
        let mut s = stick();
        s.try_grab(1, Vec2::new(100.0 + 32.0, 100.0), 60.0);
        assert!(!s.is_dashing());
        s.drag(1, Vec2::new(100.0 + 33.0, 100.0));
        assert!(s.is_dashing());
    }

    #[test]
    fn test_one_finger_owns_stick() {
        let mut s = stick();
        assert!(!s.try_grab(1, Vec2::new(300.0, 300.0), 60.0));
        assert!(s.try_grab(1, Vec2::new(110.0, 100.0), 60.0));
        assert!(!s.try_grab(2, Vec2::new(100.0, 100.0), 60.0));
        assert!(!s.drag(2, Vec2::new(0.0, 0.0)));
        assert!(!s.release(2));
        assert!(s.release(1));
        assert_eq!(s.knob(), Vec2::ZERO);
        assert!(!s.is_held());
    }

    #[test]
    fn test_gesture_drag_and_pinch() {
        let mut g = LookGesture::default();
        // First sighting: no motion.
        assert_eq!(g.update(&[(7, Vec2::new(10.0, 10.0))]), (Vec2::ZERO, 0.0));
        let (drag, _) = g.update(&[(7, Vec2::new(15.0, 8.0))]);
        assert_eq!(drag, Vec2::new(5.0, -2.0));

        // Second finger arrives: establishes the pinch baseline only.
        let (_, pinch) = g.update(&[(7, Vec2::new(15.0, 8.0)), (8, Vec2::new(115.0, 8.0))]);
        assert_eq!(pinch, 0.0);
        let (drag, pinch) = g.update(&[(7, Vec2::new(5.0, 8.0)), (8, Vec2::new(125.0, 8.0))]);
        assert_eq!(drag, Vec2::ZERO);
        assert_eq!(pinch, 20.0);
    }

    #[test]
    fn test_touch_intent() {
        let mut t = TouchControls {
            movement: stick(),
            camera: Joystick::new(Vec2::new(500.0, 100.0)),
            ..default()
        };
        t.movement.try_grab(1, Vec2::new(100.0, 60.0), 60.0);
        t.press_jump();
        t.add_gesture(Vec2::new(10.0, 0.0), 20.0);

        let intent = t.intent(0.016);
        assert_eq!(intent.move_axis, Vec2::new(0.0, 1.0));
        assert!(intent.run, "full deflection dashes");
        assert!(intent.jump);
        assert!((intent.look.x - (-10.0 * TOUCH_DRAG_YAW_PER_PIXEL)).abs() < 1e-6);
        assert!((intent.zoom - (-0.2)).abs() < 1e-6);

        t.clear_one_shots();
        let intent = t.intent(0.016);
        assert!(!intent.jump);
        assert_eq!(intent.zoom, 0.0);
        // The stick is still held.
        assert_eq!(intent.move_axis, Vec2::new(0.0, 1.0));
    }
}
