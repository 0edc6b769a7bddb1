//! Flat, index-addressed save format of a world graph.
//!
//! A snapshot lists masses in sequence; members refer to their endpoints by
//! position in that sequence. Handles never appear in a snapshot.

use std::io;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{info, warn};

use crate::error::PhysicsError;
use crate::float::Float;
use crate::material::{MassKind, MemberKind};
use crate::vec::Vec2;
use crate::world::{MassKey, World};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MassRecord<F: Float> {
    pub position: Vec2<F>,
    pub kind: MassKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord<F: Float> {
    pub endpoint_a: usize,
    pub endpoint_b: usize,
    pub kind: MemberKind,
    /// Rest length before the preload ratio is applied.
    pub rest_length: F,
}

/// Persistable part of a world plus the player's budget.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<F: Float> {
    pub masses: Vec<MassRecord<F>>,
    pub members: Vec<MemberRecord<F>>,
    pub budget: F,
}

impl<F: Float> Snapshot<F> {
    /// Check every index, length and position without touching any world.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.budget.is_finite() {
            return Err(PhysicsError::corrupt("budget is not finite"));
        }
        for (i, record) in self.masses.iter().enumerate() {
            if !record.position.is_finite() {
                return Err(PhysicsError::corrupt(format!("mass {} has a non-finite position", i)));
            }
        }
        let count = self.masses.len();
        for (i, record) in self.members.iter().enumerate() {
            if record.endpoint_a >= count || record.endpoint_b >= count {
                return Err(PhysicsError::corrupt(format!(
                    "member {} references mass {} or {} of {}",
                    i, record.endpoint_a, record.endpoint_b, count
                )));
            }
            if !(record.rest_length.is_finite() && record.rest_length > F::zero()) {
                return Err(PhysicsError::corrupt(format!("member {} has an invalid rest length", i)));
            }
        }
        Ok(())
    }
}

impl<F: Float + Serialize + DeserializeOwned> Snapshot<F> {
    pub fn to_json(&self) -> Result<String, PhysicsError> {
        serde_json::to_string(self).map_err(|e| PhysicsError::corrupt(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        serde_json::from_str::<RawSnapshot<F>>(json)
            .map_err(|e| PhysicsError::corrupt(e.to_string()))?
            .try_into()
    }

    pub fn write_json<W: io::Write>(&self, writer: W) -> Result<(), PhysicsError> {
        serde_json::to_writer(writer, self).map_err(|e| PhysicsError::corrupt(e.to_string()))
    }

    pub fn read_json<R: io::Read>(reader: R) -> Result<Self, PhysicsError> {
        serde_json::from_reader::<_, RawSnapshot<F>>(reader)
            .map_err(|e| PhysicsError::corrupt(e.to_string()))?
            .try_into()
    }
}

// Decoded with kinds left as text so an unknown tag keeps its own error.
#[derive(Deserialize)]
struct RawMassRecord<F: Float> {
    position: Vec2<F>,
    kind: String,
}

#[derive(Deserialize)]
struct RawMemberRecord<F: Float> {
    endpoint_a: usize,
    endpoint_b: usize,
    kind: String,
    rest_length: F,
}

#[derive(Deserialize)]
struct RawSnapshot<F: Float> {
    masses: Vec<RawMassRecord<F>>,
    members: Vec<RawMemberRecord<F>>,
    budget: F,
}

impl<F: Float> TryFrom<RawSnapshot<F>> for Snapshot<F> {
    type Error = PhysicsError;

    fn try_from(raw: RawSnapshot<F>) -> Result<Self, Self::Error> {
        let masses = raw
            .masses
            .into_iter()
            .map(|m| Ok(MassRecord { position: m.position, kind: m.kind.parse()? }))
            .collect::<Result<_, PhysicsError>>()?;
        let members = raw
            .members
            .into_iter()
            .map(|m| {
                Ok(MemberRecord {
                    endpoint_a: m.endpoint_a,
                    endpoint_b: m.endpoint_b,
                    kind: m.kind.parse()?,
                    rest_length: m.rest_length,
                })
            })
            .collect::<Result<_, PhysicsError>>()?;
        Ok(Snapshot { masses, members, budget: raw.budget })
    }
}

impl<F: Float> World<F> {
    /// Capture every live, persistable mass and every non-removed,
    /// persistable member between two such masses.
    pub fn snapshot(&self) -> Snapshot<F> {
        let mut index: SecondaryMap<MassKey, usize> = SecondaryMap::new();
        let mut masses = Vec::new();
        for (key, mass) in self.masses.iter() {
            if mass.persists() && !mass.is_pending_deletion() {
                index.insert(key, masses.len());
                masses.push(MassRecord { position: mass.pos, kind: mass.kind() });
            }
        }

        let mut members = Vec::new();
        for (key, member) in self.members.iter() {
            if !member.persists() || member.is_removed() {
                continue;
            }
            let (a, b) = member.endpoints();
            match (index.get(a), index.get(b)) {
                (Some(&endpoint_a), Some(&endpoint_b)) => members.push(MemberRecord {
                    endpoint_a,
                    endpoint_b,
                    kind: member.kind(),
                    rest_length: member.unloaded_rest_length(),
                }),
                _ => warn!(?key, kind = %member.kind(), "member endpoint not persisted, skipping"),
            }
        }

        info!(masses = masses.len(), members = members.len(), "snapshot taken");
        Snapshot { masses, members, budget: self.budget }
    }

    /// Replace the whole world with the contents of `snapshot`.
    ///
    /// Nothing changes unless the snapshot validates and every entity builds.
    pub fn restore(&mut self, snapshot: &Snapshot<F>) -> Result<(), PhysicsError> {
        if let Err(err) = snapshot.validate() {
            warn!(%err, "rejecting snapshot");
            return Err(err);
        }

        let mut scratch = World::new(self.config.clone());
        let mut keys = Vec::with_capacity(snapshot.masses.len());
        for record in &snapshot.masses {
            keys.push(scratch.add_mass(record.position, record.kind)?);
        }
        for record in &snapshot.members {
            let (a, b) = (keys[record.endpoint_a], keys[record.endpoint_b]);
            scratch.add_member_with(a, b, record.kind.properties(), Some(record.rest_length))?;
        }
        scratch.budget = snapshot.budget;

        info!(masses = scratch.mass_count(), members = scratch.member_count(), "snapshot restored");
        *self = scratch;
        Ok(())
    }
}
