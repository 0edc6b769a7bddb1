//! Configuration types for the world and its playfield.

use serde::{Deserialize, Serialize};

use crate::float::Float;
use crate::vec::Vec2;

/// Axis-aligned playfield rectangle. `min` is the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds<F: Float> {
    pub min: Vec2<F>,
    pub max: Vec2<F>,
}

impl<F: Float> Bounds<F> {
    pub fn new(min: Vec2<F>, max: Vec2<F>) -> Self {
        Bounds { min, max }
    }

    /// Whether `point` lies farther than `margin` outside the rectangle.
    pub fn is_beyond(&self, point: Vec2<F>, margin: F) -> bool {
        point.x > self.max.x + margin
            || point.x < self.min.x - margin
            || point.y > self.max.y + margin
            || point.y < self.min.y - margin
    }
}

/// Process-wide simulation switches and the playfield they act in.
///
/// # Builder Pattern
/// ```
/// use trestle::config::{Bounds, WorldConfig};
/// use trestle::vec::Vec2;
///
/// let config: WorldConfig<f32> = WorldConfig::new()
///     .with_bounds(Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0)))
///     .with_gravity(false)
///     .with_restitution(0.25);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig<F: Float> {
    /// Restore the gravity term into force accumulators. Default: true.
    pub gravity: bool,
    /// Zero velocities after every integration. Default: false.
    pub frozen: bool,
    /// Let overstressed members start failing. Default: true.
    pub failures: bool,
    /// Playfield rectangle. Default: 1600 x 900 from the origin.
    pub bounds: Bounds<F>,
    /// Distance outside `bounds` at which unbounded masses are deleted. Default: 200.
    pub deletion_margin: F,
    /// Fraction of velocity kept (and inverted) on an edge bounce. Default: 0.5.
    pub restitution: F,
}

impl<F: Float> WorldConfig<F> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        WorldConfig {
            gravity: true,
            frozen: false,
            failures: true,
            bounds: Bounds::new(
                Vec2::zero(),
                Vec2::new(F::from_f32(1600.0), F::from_f32(900.0)),
            ),
            deletion_margin: F::from_f32(200.0),
            restitution: F::from_f32(0.5),
        }
    }

    /// Editing preset: no gravity, frozen, failures off.
    pub fn builder_mode(self) -> Self {
        self.with_gravity(false).with_frozen(true).with_failures(false)
    }

    /// Running preset: gravity, motion and failures on.
    pub fn simulation_mode(self) -> Self {
        self.with_gravity(true).with_frozen(false).with_failures(true)
    }

    pub fn with_gravity(mut self, gravity: bool) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn with_failures(mut self, failures: bool) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_deletion_margin(mut self, margin: F) -> Self {
        self.deletion_margin = margin;
        self
    }

    /// Set the bounce restitution, clamped to [0, 1].
    pub fn with_restitution(mut self, restitution: F) -> Self {
        self.restitution = restitution.clamp(F::zero(), F::one());
        self
    }
}

impl<F: Float> Default for WorldConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}
