//! Test fixtures and helpers.
//!
//! Pre-built units and candidates for consistent testing.

use fixed::types::I32F32;

use turret_core::math::Vec3Fixed;
use turret_core::targeting::{Candidate, EntityId, TargetCategory};
use turret_core::unit::TurretUnitParams;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Position at integer block coordinates.
#[must_use]
pub fn pos(x: i32, y: i32, z: i32) -> Vec3Fixed {
    Vec3Fixed::from_blocks(x, y, z)
}

/// A hostile mob at the given x offset from the origin.
#[must_use]
pub fn hostile_at(id: EntityId, x: i32) -> Candidate {
    Candidate::new(id, pos(x, 0, 0), TargetCategory::Hostile)
}

/// A player at the given x offset from the origin.
#[must_use]
pub fn player_at(id: EntityId, x: i32) -> Candidate {
    Candidate::new(id, pos(x, 0, 0), TargetCategory::Player)
}

/// A passive creature at the given x offset from the origin.
#[must_use]
pub fn passive_at(id: EntityId, x: i32) -> Candidate {
    Candidate::new(id, pos(x, 0, 0), TargetCategory::Passive)
}

/// Parameters for a fully fueled and loaded turret at `position`.
#[must_use]
pub fn armed_turret(position: Vec3Fixed, tier: u8) -> TurretUnitParams {
    let mut params = TurretUnitParams::at(position, tier);
    params.initial_energy = u32::MAX / 2;
    params.initial_ammo = 10_000;
    params
}
