//! On-screen touch controls
//!
//! Layout (logical pixels, anchored to the bottom corners):
//! - movement stick bottom-right, camera stick bottom-left
//! - jump and dash buttons above the movement stick
//! - any other finger drags to look, two fingers pinch to zoom
//!
//! The overlay only shows once a touch has been seen.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use roomwalk_shared::{
    touch::{Joystick, JOYSTICK_RADIUS},
    InputAggregator, InputSource,
};

/// Distance from the screen edges to each stick centre.
const STICK_INSET: f32 = 90.0;

/// A touch this close to a stick centre grabs it.
const STICK_GRAB_RADIUS: f32 = 70.0;

const BUTTON_RADIUS: f32 = 32.0;
const KNOB_RADIUS: f32 = 18.0;

const BASE_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.12);
const KNOB_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.45);
const BUTTON_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.2);
const BUTTON_HELD_COLOR: Color = Color::srgba(1.0, 0.6, 0.3, 0.5);

pub struct TouchControlsPlugin;

impl Plugin for TouchControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TouchFingers>();
        app.add_systems(Startup, spawn_touch_overlay);
        app.add_systems(
            Update,
            (read_touches, update_touch_overlay)
                .chain()
                .before(crate::systems::poll_room_load),
        );
    }
}

/// Fingers currently holding an on-screen button.
#[derive(Resource, Default)]
struct TouchFingers {
    jump: Option<u64>,
    dash: Option<u64>,
}

#[derive(Component)]
struct TouchOverlay;

#[derive(Component, Clone, Copy, PartialEq, Eq)]
enum StickSide {
    Movement,
    Camera,
}

#[derive(Component)]
struct StickBase(StickSide);

#[derive(Component)]
struct StickKnob(StickSide);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum TouchButton {
    Jump,
    Dash,
}

/// Screen-space anchors for the current window size.
struct TouchLayout {
    movement: Vec2,
    camera: Vec2,
    jump: Vec2,
    dash: Vec2,
}

impl TouchLayout {
    fn new(movement: Vec2, camera: Vec2) -> Self {
        Self {
            movement,
            camera,
            jump: movement + Vec2::new(-40.0, -110.0),
            dash: movement + Vec2::new(40.0, -110.0),
        }
    }

    fn for_window(size: Vec2) -> Self {
        Self::new(
            Vec2::new(size.x - STICK_INSET, size.y - STICK_INSET),
            Vec2::new(STICK_INSET, size.y - STICK_INSET),
        )
    }

    fn button_at(&self, position: Vec2) -> Option<TouchButton> {
        if position.distance(self.jump) <= BUTTON_RADIUS {
            Some(TouchButton::Jump)
        } else if position.distance(self.dash) <= BUTTON_RADIUS {
            Some(TouchButton::Dash)
        } else {
            None
        }
    }
}

fn spawn_touch_overlay(mut commands: Commands) {
    commands
        .spawn((
            TouchOverlay,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            for side in [StickSide::Movement, StickSide::Camera] {
                parent
                    .spawn((
                        StickBase(side),
                        circle_node(JOYSTICK_RADIUS + KNOB_RADIUS),
                        BackgroundColor(BASE_COLOR),
                        BorderRadius::MAX,
                    ))
                    .with_children(|base| {
                        base.spawn((
                            StickKnob(side),
                            circle_node(KNOB_RADIUS),
                            BackgroundColor(KNOB_COLOR),
                            BorderRadius::MAX,
                        ));
                    });
            }

            for (button, label) in [(TouchButton::Jump, "JUMP"), (TouchButton::Dash, "DASH")] {
                parent
                    .spawn((
                        button,
                        Node {
                            justify_content: JustifyContent::Center,
                            align_items: AlignItems::Center,
                            ..circle_node(BUTTON_RADIUS)
                        },
                        BackgroundColor(BUTTON_COLOR),
                        BorderRadius::MAX,
                    ))
                    .with_children(|btn| {
                        btn.spawn((
                            Text::new(label),
                            TextFont {
                                font_size: 12.0,
                                ..default()
                            },
                            TextColor(Color::WHITE),
                        ));
                    });
            }
        });
}

fn circle_node(radius: f32) -> Node {
    Node {
        position_type: PositionType::Absolute,
        width: Val::Px(radius * 2.0),
        height: Val::Px(radius * 2.0),
        ..default()
    }
}

/// Route every touch to a stick, a button or the look gesture.
fn read_touches(
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut fingers: ResMut<TouchFingers>,
    mut input: ResMut<InputAggregator>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let layout = TouchLayout::for_window(window.size());

    if touches.any_just_pressed() {
        input.activate(InputSource::Touch);
    }

    let controls = &mut input.touch;
    controls.movement.set_center(layout.movement);
    controls.camera.set_center(layout.camera);

    for touch in touches.iter_just_released().chain(touches.iter_just_canceled()) {
        let id = touch.id();
        controls.release_finger(id);
        if fingers.jump == Some(id) {
            fingers.jump = None;
        }
        if fingers.dash == Some(id) {
            fingers.dash = None;
        }
    }

    for touch in touches.iter_just_pressed() {
        let (id, position) = (touch.id(), touch.position());
        match layout.button_at(position) {
            Some(TouchButton::Jump) => {
                fingers.jump = Some(id);
                controls.press_jump();
            }
            Some(TouchButton::Dash) => fingers.dash = Some(id),
            None => {
                if !controls.movement.try_grab(id, position, STICK_GRAB_RADIUS) {
                    controls.camera.try_grab(id, position, STICK_GRAB_RADIUS);
                }
            }
        }
    }

    let mut free = Vec::new();
    for touch in touches.iter() {
        let (id, position) = (touch.id(), touch.position());
        let owned = controls.movement.drag(id, position)
            || controls.camera.drag(id, position)
            || fingers.jump == Some(id)
            || fingers.dash == Some(id);
        if !owned {
            free.push((id, position));
        }
    }

    let (drag, pinch) = controls.gesture.update(&free);
    controls.add_gesture(drag, pinch);
    controls.dash_held = fingers.dash.is_some();
}

/// Show the overlay for touch input and move the knobs.
fn update_touch_overlay(
    input: Res<InputAggregator>,
    fingers: Res<TouchFingers>,
    mut overlay: Query<&mut Visibility, With<TouchOverlay>>,
    mut bases: Query<(&StickBase, &mut Node), Without<StickKnob>>,
    mut knobs: Query<(&StickKnob, &mut Node), (Without<StickBase>, Without<TouchButton>)>,
    mut buttons: Query<
        (&TouchButton, &mut Node, &mut BackgroundColor),
        (Without<StickBase>, Without<StickKnob>),
    >,
) {
    let Ok(mut visibility) = overlay.single_mut() else {
        return;
    };
    let touch_active = input.active_source() == InputSource::Touch;
    *visibility = if touch_active {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    if !touch_active {
        return;
    }

    let base_radius = JOYSTICK_RADIUS + KNOB_RADIUS;
    for (base, mut node) in bases.iter_mut() {
        let center = stick(&input, base.0).center();
        node.left = Val::Px(center.x - base_radius);
        node.top = Val::Px(center.y - base_radius);
    }
    for (knob, mut node) in knobs.iter_mut() {
        // Knob position is relative to its base.
        let offset = stick(&input, knob.0).knob() + Vec2::splat(base_radius - KNOB_RADIUS);
        node.left = Val::Px(offset.x);
        node.top = Val::Px(offset.y);
    }

    let layout = TouchLayout::new(input.touch.movement.center(), input.touch.camera.center());
    for (button, mut node, mut color) in buttons.iter_mut() {
        let (center, held) = match button {
            TouchButton::Jump => (layout.jump, fingers.jump.is_some()),
            TouchButton::Dash => (
                layout.dash,
                fingers.dash.is_some() || input.touch.movement.is_dashing(),
            ),
        };
        node.left = Val::Px(center.x - BUTTON_RADIUS);
        node.top = Val::Px(center.y - BUTTON_RADIUS);
        color.0 = if held { BUTTON_HELD_COLOR } else { BUTTON_COLOR };
    }
}

fn stick(input: &InputAggregator, side: StickSide) -> &Joystick {
    match side {
        StickSide::Movement => &input.touch.movement,
        StickSide::Camera => &input.touch.camera,
    }
}
