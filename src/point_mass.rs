//! Point masses integrated with explicit Euler steps and quadratic drag.

use crate::config::WorldConfig;
use crate::error::PhysicsError;
use crate::float::Float;
use crate::material::{MassKind, MassProperties};
use crate::vec::Vec2;

/// Velocity multiplier used by the drag clamp and the creep decay.
const DECAY: f32 = 0.99;
/// Per-axis speed below which velocity decays every tick.
const CREEP_SPEED: f32 = 0.01;

/// A massed material point.
///
/// Forces written between two integrations accumulate in `force`; the
/// accumulator is consumed and reset to the gravity term by [`integrate`].
///
/// [`integrate`]: PointMass::integrate
#[derive(Clone, Debug)]
pub struct PointMass<F: Float> {
    pub pos: Vec2<F>,
    pub vel: Vec2<F>,
    pub force: Vec2<F>,
    /// Drag computed during the last integration. Not persisted.
    pub friction: Vec2<F>,
    kind: MassKind,
    mass: F,
    gravity: F,
    damping: F,
    radius: F,
    anchored: bool,
    bounded: bool,
    persist: bool,
    pending_deletion: bool,
}

impl<F: Float> PointMass<F> {
    /// Create a mass with the table properties of `kind`.
    ///
    /// Fails with [`PhysicsError::Configuration`] for [`MassKind::VehicleCustom`],
    /// which needs [`PointMass::with_properties`] and explicit overrides.
    pub fn new(pos: Vec2<F>, kind: MassKind) -> Result<Self, PhysicsError> {
        Self::with_properties(pos, kind.properties())
    }

    pub fn with_properties(pos: Vec2<F>, props: MassProperties<F>) -> Result<Self, PhysicsError> {
        let (Some(gravity), Some(mass)) = (props.gravity, props.mass) else {
            return Err(PhysicsError::configuration(format!(
                "{} mass created without mass and gravity overrides",
                props.kind
            )));
        };
        if !(mass.is_finite() && mass > F::zero()) {
            return Err(PhysicsError::InvalidMass);
        }
        if !gravity.is_finite() || !pos.is_finite() {
            return Err(PhysicsError::configuration("mass position and gravity must be finite"));
        }
        Ok(PointMass {
            pos,
            vel: Vec2::zero(),
            force: Vec2::new(F::zero(), gravity),
            friction: Vec2::zero(),
            kind: props.kind,
            mass,
            gravity,
            damping: props.damping,
            radius: props.radius,
            anchored: props.anchored,
            bounded: props.bounded,
            persist: props.persist,
            pending_deletion: false,
        })
    }

    /// Add `force` to the accumulator.
    pub fn apply_force(&mut self, force: Vec2<F>) {
        self.force += force;
    }

    /// Advance one tick and reset the force accumulator.
    ///
    /// Anchored masses skip motion entirely; only the reset happens.
    pub fn integrate(&mut self, dt: F, config: &WorldConfig<F>) {
        if !self.anchored {
            self.advance(dt, config);
        }
        self.reset_force(config.gravity);
        if config.frozen && !self.anchored {
            self.vel = Vec2::zero();
        }
    }

    fn advance(&mut self, dt: F, config: &WorldConfig<F>) {
        self.friction = Vec2::new(
            drag(self.vel.x, self.damping),
            drag(self.vel.y, self.damping),
        );
        self.vel.x = axis_velocity(self.vel.x, self.force.x, self.friction.x, self.mass, dt);
        self.vel.y = axis_velocity(self.vel.y, self.force.y, self.friction.y, self.mass, dt);

        self.pos += self.vel.scale(dt);

        if self.bounded {
            self.reflect(config);
        } else if config.bounds.is_beyond(self.pos, config.deletion_margin) {
            self.pending_deletion = true;
        }
    }

    fn reflect(&mut self, config: &WorldConfig<F>) {
        let bounds = &config.bounds;
        let r = config.restitution;
        if self.pos.x < bounds.min.x {
            self.pos.x = bounds.min.x;
            self.vel.x = -self.vel.x * r;
        } else if self.pos.x > bounds.max.x {
            self.pos.x = bounds.max.x;
            self.vel.x = -self.vel.x * r;
        }
        if self.pos.y < bounds.min.y {
            self.pos.y = bounds.min.y;
            self.vel.y = -self.vel.y * r;
        } else if self.pos.y > bounds.max.y {
            self.pos.y = bounds.max.y;
            self.vel.y = -self.vel.y * r;
        }
    }

    /// Set the accumulator to the baseline term for the next tick.
    pub fn reset_force(&mut self, gravity_on: bool) {
        let fy = if gravity_on { self.gravity } else { F::zero() };
        self.force = Vec2::new(F::zero(), fy);
    }

    /// Flag the mass so incident members detach on the next tick.
    pub fn mark_for_deletion(&mut self) {
        self.pending_deletion = true;
    }

    pub fn is_pending_deletion(&self) -> bool { self.pending_deletion }
    pub fn kind(&self) -> MassKind { self.kind }
    pub fn mass(&self) -> F { self.mass }
    pub fn gravity(&self) -> F { self.gravity }
    pub fn damping(&self) -> F { self.damping }
    pub fn radius(&self) -> F { self.radius }
    pub fn is_anchored(&self) -> bool { self.anchored }
    pub fn is_bounded(&self) -> bool { self.bounded }
    pub fn persists(&self) -> bool { self.persist }

    pub fn kinetic_energy(&self) -> F {
        F::from_f32(0.5) * self.mass * self.vel.length_sq()
    }
}

/// Quadratic drag `v * |v| * damping`.
fn drag<F: Float>(v: F, damping: F) -> F {
    v * v.abs() * damping
}

fn axis_velocity<F: Float>(v: F, force: F, friction: F, mass: F, dt: F) -> F {
    let decay = F::from_f32(DECAY);
    // Drag stronger than the applied force would reverse the motion.
    let v = if friction.abs() > force.abs() {
        v * decay
    } else {
        v + (force - friction) / mass * dt
    };
    if v.abs() < F::from_f32(CREEP_SPEED) {
        v * decay
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    fn calm() -> WorldConfig<f64> {
        WorldConfig::new().with_gravity(false)
    }

    #[test]
    fn custom_mass_requires_overrides() {
        let err = PointMass::<f64>::new(Vec2::zero(), MassKind::VehicleCustom).unwrap_err();
        assert!(matches!(err, PhysicsError::Configuration { .. }));

        let props = MassKind::VehicleCustom.properties().with_overrides(1500.0, 1000.0);
        let m = PointMass::<f64>::with_properties(Vec2::zero(), props).unwrap();
        assert_eq!(m.mass(), 1000.0);
        assert_eq!(m.force.y, 1500.0);
    }

    #[test]
    fn non_positive_mass_is_rejected() {
        let props = MassKind::VehicleCustom.properties().with_overrides(10.0, 0.0);
        assert_eq!(
            PointMass::<f32>::with_properties(Vec2::zero(), props).unwrap_err(),
            PhysicsError::InvalidMass
        );
    }

    #[test]
    fn strong_drag_only_decays_velocity() {
        let mut m = PointMass::<f64>::new(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
        m.vel = Vec2::new(10.0, 0.0);
        m.force = Vec2::zero();
        m.integrate(0.1, &calm());
        // drag 10 * 10 * 3 = 300 exceeds the zero applied force
        assert!((m.vel.x - 9.9).abs() < 1e-6);
        assert!((m.friction.x - 300.0).abs() < 1e-12);
    }

    #[test]
    fn force_accelerates_when_drag_is_weaker() {
        let mut m = PointMass::<f64>::new(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
        m.force = Vec2::new(3000.0, 0.0);
        m.integrate(0.1, &calm());
        // (3000 - 0) / 3000 * 0.1
        assert!((m.vel.x - 0.1).abs() < 1e-12);
        assert!((m.pos.x - 100.01).abs() < 1e-12);
    }

    #[test]
    fn creeping_velocity_decays() {
        let mut m = PointMass::<f64>::new(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
        m.vel = Vec2::new(0.001, -0.001);
        m.force = Vec2::zero();
        m.integrate(0.1, &calm());
        // drag beats the zero force, then the creep decay applies on top
        assert!((m.vel.x - 0.001 * 0.99 * 0.99).abs() < 1e-9);
        assert!((m.vel.y + 0.001 * 0.99 * 0.99).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_gravity_term() {
        let mut m = PointMass::<f32>::new(Vec2::new(10.0, 10.0), MassKind::Normal).unwrap();
        m.apply_force(Vec2::new(5.0, 5.0));
        m.integrate(0.1, &WorldConfig::new());
        assert_eq!(m.force, Vec2::new(0.0, 1500.0));
        m.integrate(0.1, &WorldConfig::new().with_gravity(false));
        assert_eq!(m.force, Vec2::zero());
    }

    #[test]
    fn bounded_mass_bounces_with_restitution() {
        let config = calm().with_bounds(Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));
        let mut m = PointMass::<f64>::new(Vec2::new(99.0, 50.0), MassKind::Normal).unwrap();
        m.vel = Vec2::new(20.0, 0.0);
        m.force = Vec2::new(1.0e6, 0.0);
        m.integrate(1.0, &config);
        assert_eq!(m.pos.x, 100.0);
        assert!(m.vel.x < 0.0);
        assert!(!m.is_pending_deletion());
    }

    #[test]
    fn unbounded_mass_far_outside_is_marked() {
        let config = calm().with_bounds(Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));
        let mut m = PointMass::<f64>::new(Vec2::new(50.0, 350.0), MassKind::VehicleLight).unwrap();
        m.integrate(0.1, &config);
        assert!(m.is_pending_deletion());
    }

    #[test]
    fn frozen_world_zeroes_velocity() {
        let mut m = PointMass::<f64>::new(Vec2::new(50.0, 50.0), MassKind::Normal).unwrap();
        m.vel = Vec2::new(5.0, 5.0);
        m.integrate(0.1, &WorldConfig::new().builder_mode());
        assert_eq!(m.vel, Vec2::zero());
    }
}
