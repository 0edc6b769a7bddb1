//! Elastic members: axial force model, failure countdown and probe contact.

use crate::contact::{Contact, Probe};
use crate::float::Float;
use crate::material::{MemberKind, MemberProperties};
use crate::point_mass::PointMass;
use crate::vec::Vec2;
use crate::world::MassKey;

/// Factor applied to the thickness offset when pushing a probe out.
const CONTACT_CLEARANCE: f32 = 1.1;

/// Lifecycle of a member.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberState {
    /// Applies structural force every tick.
    Healthy,
    /// Overstressed. Mechanically inert; removed when `remaining` reaches zero.
    Failing { remaining: u32 },
    /// Detached. Never leaves this state.
    Removed,
}

/// Sign of the axial load.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Load {
    Compression,
    Tension,
    Neutral,
}

/// What happened to a member during one update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Steady,
    /// Overstressed this tick; the countdown has started.
    Failed,
    /// An endpoint is gone or leaving the world.
    Detached,
    /// The failure countdown ran out.
    Broken,
}

/// A linear elastic connector between two point masses.
///
/// The member stores handles, not the masses themselves; the world passes the
/// endpoint masses in for every update.
#[derive(Clone, Debug)]
pub struct Member<F: Float> {
    a: MassKey,
    b: MassKey,
    props: MemberProperties<F>,
    rest_length: F,
    current_length: F,
    force_total: F,
    force: Vec2<F>,
    state: MemberState,
}

impl<F: Float> Member<F> {
    /// Connect `a` and `b`.
    ///
    /// The rest length is `rest_length` when given, the current separation
    /// otherwise, and is then scaled by the preload ratio. Coincident endpoints
    /// produce a member that is already [`MemberState::Removed`].
    pub fn new(
        a: MassKey,
        a_pos: Vec2<F>,
        b: MassKey,
        b_pos: Vec2<F>,
        props: MemberProperties<F>,
        rest_length: Option<F>,
    ) -> Self {
        let separation = a_pos.distance(b_pos);
        let rest_length = rest_length.unwrap_or(separation) * props.preload;
        let degenerate = a_pos == b_pos || !(rest_length > F::zero());
        Member {
            a,
            b,
            props,
            rest_length,
            current_length: separation,
            force_total: F::zero(),
            force: Vec2::zero(),
            state: if degenerate { MemberState::Removed } else { MemberState::Healthy },
        }
    }

    /// Run one tick of the state machine against the endpoint masses.
    pub fn update(&mut self, a: &mut PointMass<F>, b: &mut PointMass<F>, failures: bool) -> Transition {
        if a.is_pending_deletion() || b.is_pending_deletion() {
            self.state = MemberState::Removed;
            return Transition::Detached;
        }
        match self.state {
            MemberState::Removed => Transition::Detached,
            MemberState::Failing { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = MemberState::Removed;
                    Transition::Broken
                } else {
                    self.state = MemberState::Failing { remaining };
                    Transition::Steady
                }
            }
            // members without a threshold are collision geometry only
            MemberState::Healthy if self.props.max_force.is_none() => Transition::Steady,
            MemberState::Healthy => {
                self.accumulate(a, b);
                if failures && self.is_overstressed() {
                    self.state = MemberState::Failing { remaining: self.props.fail_anim_len };
                    Transition::Failed
                } else {
                    Transition::Steady
                }
            }
        }
    }

    /// Compute the axial force and add it into both endpoints.
    ///
    /// The split between axes is proportional to `|dx|` and `|dy|`, so
    /// `Fx + Fy == F_total`. Skipped when the endpoints coincide.
    pub fn accumulate(&mut self, a: &mut PointMass<F>, b: &mut PointMass<F>) {
        let delta = a.pos.abs_diff(b.pos);
        let span = delta.x + delta.y;
        if span == F::zero() {
            return;
        }
        self.current_length = delta.length();
        let stiffness = if self.rest_length > self.current_length {
            self.props.compression_stiffness
        } else {
            self.props.tension_stiffness
        };
        self.force_total = (self.rest_length - self.current_length).abs() * stiffness;
        let fx = self.force_total * delta.x / span;
        let fy = self.force_total - fx;
        self.force = Vec2::new(fx, fy);

        let sx = if a.pos.x > b.pos.x { -fx } else { fx };
        let sy = if a.pos.y > b.pos.y { -fy } else { fy };
        a.apply_force(Vec2::new(sx, sy));
        b.apply_force(Vec2::new(-sx, -sy));
    }

    /// Test a probe against this member's segment.
    ///
    /// `a_pos` and `b_pos` are the current endpoint positions. On overlap the
    /// returned contact holds the probe's position pushed out along the upward
    /// normal and the share of the probe's vertical force each endpoint takes.
    /// Vertical members never report a contact.
    pub fn resolve_probe(&self, a_pos: Vec2<F>, b_pos: Vec2<F>, probe: &Probe<F>) -> Option<Contact<F>> {
        let c = probe.position;
        if a_pos.x == b_pos.x || c.x < a_pos.x.min(b_pos.x) || c.x > a_pos.x.max(b_pos.x) {
            return None;
        }
        let delta = a_pos.abs_diff(b_pos);
        let length = delta.length();
        let thickness = self.props.thickness;
        let slope = (a_pos.y - b_pos.y) / (a_pos.x - b_pos.x);
        let y_off = (thickness * delta.x / length).abs();
        let x_off = (thickness * delta.y / length).abs();

        let surface = slope * (c.x - a_pos.x) + a_pos.y;
        if !(c.y + y_off > surface && surface > c.y - y_off - y_off) {
            return None;
        }

        // foot of the perpendicular from the probe onto the member's line
        let xd = (slope * (slope * a_pos.x + c.y - a_pos.y) + c.x) / (slope * slope + F::one());
        let yd = slope * (xd - a_pos.x) + a_pos.y;
        let clearance = F::from_f32(CONTACT_CLEARANCE);
        let x = if slope < F::zero() { xd - x_off * clearance } else { xd + x_off * clearance };
        let y = yd - y_off * clearance;

        Some(Contact {
            position: Vec2::new(x, y),
            load_a: probe.force_y * ((a_pos.x - c.x) / delta.x).abs(),
            load_b: probe.force_y * ((b_pos.x - c.x) / delta.x).abs(),
        })
    }

    fn is_overstressed(&self) -> bool {
        self.props.max_force.is_some_and(|max| self.force_total.abs() > max)
    }

    pub fn endpoints(&self) -> (MassKey, MassKey) { (self.a, self.b) }
    pub fn kind(&self) -> MemberKind { self.props.kind }
    pub fn properties(&self) -> &MemberProperties<F> { &self.props }
    pub fn state(&self) -> MemberState { self.state }
    pub fn rest_length(&self) -> F { self.rest_length }
    pub fn current_length(&self) -> F { self.current_length }
    pub fn thickness(&self) -> F { self.props.thickness }
    pub fn is_solid(&self) -> bool { self.props.solid }
    pub fn persists(&self) -> bool { self.props.persist }

    /// Signed axial force: positive pulls, negative pushes.
    pub fn force_total(&self) -> F { self.force_total }

    /// Per-axis split `(Fx, Fy)` of the last force update; `Fx + Fy == F_total`.
    pub fn force_components(&self) -> Vec2<F> { self.force }

    pub fn is_healthy(&self) -> bool { self.state == MemberState::Healthy }
    pub fn is_failing(&self) -> bool { matches!(self.state, MemberState::Failing { .. }) }
    pub fn is_removed(&self) -> bool { self.state == MemberState::Removed }

    /// Ticks left before removal; 0 unless failing.
    pub fn countdown(&self) -> u32 {
        match self.state {
            MemberState::Failing { remaining } => remaining,
            _ => 0,
        }
    }

    /// Fraction of the failure countdown already elapsed, in [0, 1].
    pub fn failure_progress(&self) -> F {
        match self.state {
            MemberState::Healthy => F::zero(),
            MemberState::Removed => F::one(),
            MemberState::Failing { remaining } => {
                let total = self.props.fail_anim_len as f32;
                F::from_f32((total - remaining as f32) / total)
            }
        }
    }

    /// `|F_total| / max_force`; `None` for members that cannot fail.
    pub fn stress_ratio(&self) -> Option<F> {
        self.props.max_force.map(|max| self.force_total.abs() / max)
    }

    pub fn load(&self) -> Load {
        if self.force_total == F::zero() {
            Load::Neutral
        } else if self.rest_length > self.current_length {
            Load::Compression
        } else {
            Load::Tension
        }
    }

    /// Rest length with the preload ratio divided back out, as persisted.
    pub fn unloaded_rest_length(&self) -> F {
        self.rest_length / self.props.preload
    }

    /// Purchase price of this member at its rest length.
    pub fn cost(&self) -> F {
        self.props.cost_for(self.rest_length)
    }
}
