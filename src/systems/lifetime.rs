//! Tick-counted entity expiry.

use bevy_ecs::{component::Component, entity::Entity, system::Commands, system::Query};

/// Remaining ticks before the entity is despawned.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToLive(pub u32);

impl TimeToLive {
    pub fn new(ticks: u32) -> Self {
        Self(ticks)
    }
}

pub fn time_to_live_system(mut commands: Commands, mut entities: Query<(Entity, &mut TimeToLive)>) {
    for (entity, mut ttl) in entities.iter_mut() {
        ttl.0 = ttl.0.saturating_sub(1);
        if ttl.0 == 0 {
            commands.entity(entity).despawn();
        }
    }
}
