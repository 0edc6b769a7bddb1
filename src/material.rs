//! Closed material tables for point masses and members.
//!
//! Every kind resolves once, at construction, to a fixed property record. The
//! string tags are the persisted names and are stable.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;
use crate::float::Float;

/// Divisor applied to `unit_cost * length²` when pricing a member.
const COST_SCALE: f32 = 100_000.0;

/// Kind of a point mass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum MassKind {
    /// Player-built joint. Bounded by the playfield.
    Normal,
    /// Vehicle mass whose gravity and mass are supplied by the builder.
    VehicleCustom,
    /// Light vehicle frame mass.
    VehicleLight,
    /// Vehicle wheel; the usual collision probe.
    VehicleWheel,
    /// Anchored foundation the player can attach to.
    Based,
    /// Anchored, hidden level geometry.
    Ground,
}

impl MassKind {
    pub const ALL: [MassKind; 6] = [
        MassKind::Normal,
        MassKind::VehicleCustom,
        MassKind::VehicleLight,
        MassKind::VehicleWheel,
        MassKind::Based,
        MassKind::Ground,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            MassKind::Normal => "normal",
            MassKind::VehicleCustom => "car_custom",
            MassKind::VehicleLight => "car_light",
            MassKind::VehicleWheel => "car_wheel",
            MassKind::Based => "based",
            MassKind::Ground => "ground",
        }
    }

    /// The fixed property record for this kind.
    pub fn properties<F: Float>(self) -> MassProperties<F> {
        let (gravity, mass, damping, radius, anchored, bounded) = match self {
            MassKind::Normal => (Some(1500.0), Some(3000.0), 3.0, 9.0, false, true),
            MassKind::VehicleCustom => (None, None, 3.0, 7.0, false, false),
            MassKind::VehicleLight => (Some(200.0), Some(100.0), 2.0, 6.0, false, false),
            MassKind::VehicleWheel => (Some(200.0), Some(100.0), 2.0, 12.0, false, false),
            MassKind::Based => (Some(1000.0), Some(250.0), 1.0, 11.0, true, false),
            MassKind::Ground => (Some(1000.0), Some(250.0), 1.0, 11.0, true, false),
        };
        MassProperties {
            kind: self,
            gravity: gravity.map(F::from_f32),
            mass: mass.map(F::from_f32),
            damping: F::from_f32(damping),
            radius: F::from_f32(radius),
            anchored,
            bounded,
            persist: !self.is_vehicle(),
        }
    }

    pub fn is_vehicle(self) -> bool {
        matches!(
            self,
            MassKind::VehicleCustom | MassKind::VehicleLight | MassKind::VehicleWheel
        )
    }
}

/// Property record of a point mass.
///
/// `gravity` and `mass` are `None` only for [`MassKind::VehicleCustom`], which
/// must receive both through overrides.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassProperties<F: Float> {
    pub kind: MassKind,
    /// Baseline downward force restored into the accumulator every tick.
    pub gravity: Option<F>,
    pub mass: Option<F>,
    /// Coefficient of the quadratic velocity drag.
    pub damping: F,
    pub radius: F,
    pub anchored: bool,
    /// Reflects off the playfield edge instead of being deleted outside it.
    pub bounded: bool,
    pub persist: bool,
}

impl<F: Float> MassProperties<F> {
    /// Supply gravity and mass, replacing the table values.
    pub fn with_overrides(mut self, gravity: F, mass: F) -> Self {
        self.gravity = Some(gravity);
        self.mass = Some(mass);
        self
    }
}

/// Kind of an elastic member.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum MemberKind {
    /// Road deck: solid, so vehicles drive on it.
    Paved,
    /// Vehicle suspension spring.
    VehicleSpring,
    /// Vehicle chassis member.
    VehicleFrame,
    /// Plain structural beam.
    Normal,
    /// Tension-only cable, slightly pre-tensioned.
    Cable,
    /// Level terrain. Solid and unbreakable.
    Ground,
}

impl MemberKind {
    pub const ALL: [MemberKind; 6] = [
        MemberKind::Paved,
        MemberKind::VehicleSpring,
        MemberKind::VehicleFrame,
        MemberKind::Normal,
        MemberKind::Cable,
        MemberKind::Ground,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            MemberKind::Paved => "paved",
            MemberKind::VehicleSpring => "car_spring",
            MemberKind::VehicleFrame => "car_frame",
            MemberKind::Normal => "normal",
            MemberKind::Cable => "cable",
            MemberKind::Ground => "ground",
        }
    }

    /// The fixed property record for this kind.
    pub fn properties<F: Float>(self) -> MemberProperties<F> {
        // (k_tension, k_compression, thickness, max_force, unit_cost, preload, solid, persist)
        let (k_tens, k_comp, thick, max_force, cost, preload, solid, persist) = match self {
            MemberKind::Paved => (20000.0, -20000.0, 10.0, Some(30000.0), 300.0, 1.0, true, true),
            MemberKind::VehicleSpring => (4000.0, -4000.0, 3.0, Some(90000.0), 0.0, 1.0, false, false),
            MemberKind::VehicleFrame => (8000.0, -8000.0, 3.0, Some(90000.0), 0.0, 1.0, false, false),
            MemberKind::Normal => (20000.0, -20000.0, 5.0, Some(30000.0), 100.0, 1.0, false, true),
            MemberKind::Cable => (20000.0, 0.0, 2.0, Some(50000.0), 1.0, 0.994, false, true),
            MemberKind::Ground => (20000.0, -20000.0, 10.0, None, 0.0, 1.0, true, true),
        };
        MemberProperties {
            kind: self,
            tension_stiffness: F::from_f32(k_tens),
            compression_stiffness: F::from_f32(k_comp),
            thickness: F::from_f32(thick),
            max_force: max_force.map(F::from_f32),
            fail_anim_len: 15,
            preload: F::from_f32(preload),
            solid,
            persist,
            unit_cost: F::from_f32(cost),
        }
    }
}

/// Property record of a member.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MemberProperties<F: Float> {
    pub kind: MemberKind,
    /// Stiffness when stretched; non-negative so stretched members pull.
    pub tension_stiffness: F,
    /// Stiffness when shortened; non-positive so compressed members push.
    pub compression_stiffness: F,
    /// Collision half-width.
    pub thickness: F,
    /// Absolute axial force above which the member starts failing.
    pub max_force: Option<F>,
    /// Ticks between overstress and removal.
    pub fail_anim_len: u32,
    /// Ratio applied once to the rest length at construction.
    pub preload: F,
    pub solid: bool,
    pub persist: bool,
    pub unit_cost: F,
}

impl<F: Float> MemberProperties<F> {
    /// Reject parameter sets the force model cannot run with.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let zero = F::zero();
        if !(self.tension_stiffness.is_finite() && self.tension_stiffness >= zero) {
            return Err(PhysicsError::configuration("tension stiffness must be finite and >= 0"));
        }
        if !(self.compression_stiffness.is_finite() && self.compression_stiffness <= zero) {
            return Err(PhysicsError::configuration("compression stiffness must be finite and <= 0"));
        }
        if !(self.thickness.is_finite() && self.thickness > zero) {
            return Err(PhysicsError::configuration("thickness must be finite and > 0"));
        }
        if !(self.preload.is_finite() && self.preload > zero) {
            return Err(PhysicsError::configuration("preload must be finite and > 0"));
        }
        if let Some(max) = self.max_force {
            if !(max.is_finite() && max > zero) {
                return Err(PhysicsError::configuration("max force must be finite and > 0"));
            }
        }
        if self.fail_anim_len == 0 {
            return Err(PhysicsError::configuration("fail animation needs at least one tick"));
        }
        Ok(())
    }

    /// Price of a member of this kind spanning `length`.
    pub fn cost_for(&self, length: F) -> F {
        self.unit_cost / F::from_f32(COST_SCALE) * length * length
    }
}

impl fmt::Display for MassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MassKind {
    type Err = PhysicsError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        MassKind::ALL
            .into_iter()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| PhysicsError::UnknownMaterialKind { tag: tag.to_string() })
    }
}

impl FromStr for MemberKind {
    type Err = PhysicsError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        MemberKind::ALL
            .into_iter()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| PhysicsError::UnknownMaterialKind { tag: tag.to_string() })
    }
}

impl TryFrom<String> for MassKind {
    type Error = PhysicsError;
    fn try_from(tag: String) -> Result<Self, Self::Error> { tag.parse() }
}

impl TryFrom<String> for MemberKind {
    type Error = PhysicsError;
    fn try_from(tag: String) -> Result<Self, Self::Error> { tag.parse() }
}

impl From<MassKind> for &'static str {
    fn from(kind: MassKind) -> Self { kind.tag() }
}

impl From<MemberKind> for &'static str {
    fn from(kind: MemberKind) -> Self { kind.tag() }
}
