//! Frame driver system
//!
//! The single place the walkthrough advances. Runs after input and collider
//! systems and before anything copies poses onto transforms.

use bevy::prelude::*;
use roomwalk_shared::{CollisionWorld, InputAggregator, Walkthrough};

/// Advance avatar and camera by one frame.
pub fn drive_frame(
    time: Res<Time>,
    world: Res<CollisionWorld>,
    mut input: ResMut<InputAggregator>,
    mut walkthrough: ResMut<Walkthrough>,
) {
    let report = walkthrough.advance(time.delta_secs(), &mut input, &world);

    if time.delta_secs() > report.dt {
        debug!(
            "Long frame {:.3}s shortened to {:.3}s",
            time.delta_secs(),
            report.dt
        );
    }
    if let Some(fps) = report.fps {
        trace!("FPS {:.1}", fps);
    }
}
