//! Charging topology: locations own chargers, chargers own points.
//!
//! All entities live in flat arenas inside [`Infrastructure`] and reference
//! each other by id.  A vehicle's use of a point is recorded only in the
//! point's `occupants` list, which the simulation clears when the charge task
//! ends.  Nothing on the vehicle side points back into this arena except a
//! `PointId`.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use fc_core::{ChargerId, LocationId, PlugTypeId, PointId, VehicleId};

use crate::{InfraError, InfraResult, LocationOutput, PlugType};

// ── Entities ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LocationKind {
    Depot,
    Station,
}

impl FromStr for LocationKind {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depot" => Ok(Self::Depot),
            "station" => Ok(Self::Station),
            other => Err(InfraError::Parse(format!(
                "invalid location type {other:?}: expected \"depot\" or \"station\""
            ))),
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Depot => "depot",
            Self::Station => "station",
        })
    }
}

#[derive(Clone, Debug)]
pub struct Location {
    pub id:              LocationId,
    pub name:            String,
    pub kind:            LocationKind,
    pub chargers:        Vec<ChargerId>,
    /// Maximum simultaneous draw of the grid connection.  `None` = unlimited.
    pub grid_ceiling_kw: Option<f64>,
    pub output:          LocationOutput,
}

#[derive(Clone, Debug)]
pub struct Charger {
    pub id:       ChargerId,
    pub name:     String,
    pub location: LocationId,
    pub points:   Vec<PointId>,
}

#[derive(Clone, Debug)]
pub struct ChargingPoint {
    pub id:            PointId,
    pub charger:       ChargerId,
    pub location:      LocationId,
    pub plugs:         Vec<PlugTypeId>,
    pub max_occupancy: u8,
    occupants:         Vec<VehicleId>,
}

impl ChargingPoint {
    #[inline]
    pub fn occupants(&self) -> &[VehicleId] {
        &self.occupants
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupants.len() < self.max_occupancy as usize
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }

    /// `true` if any plug of this point is in `compatible`.
    pub fn accepts(&self, compatible: &[PlugTypeId]) -> bool {
        self.plugs.iter().any(|p| compatible.contains(p))
    }
}

// ── Infrastructure ────────────────────────────────────────────────────────────

/// Arena of all plug types, locations, chargers and points for one run.
#[derive(Clone, Debug)]
pub struct Infrastructure {
    plug_types:     Vec<PlugType>,
    locations:      Vec<Location>,
    chargers:       Vec<Charger>,
    points:         Vec<ChargingPoint>,
    location_names: FxHashMap<String, LocationId>,
    plug_names:     FxHashMap<String, PlugTypeId>,
}

impl Infrastructure {
    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn points(&self) -> &[ChargingPoint] {
        &self.points
    }

    pub fn plug_types(&self) -> &[PlugType] {
        &self.plug_types
    }

    pub fn location(&self, id: LocationId) -> InfraResult<&Location> {
        self.locations
            .get(id.index())
            .ok_or(InfraError::LocationNotFound(id))
    }

    pub fn location_mut(&mut self, id: LocationId) -> InfraResult<&mut Location> {
        self.locations
            .get_mut(id.index())
            .ok_or(InfraError::LocationNotFound(id))
    }

    pub fn location_by_name(&self, name: &str) -> InfraResult<LocationId> {
        self.location_names
            .get(name.trim())
            .copied()
            .ok_or_else(|| InfraError::UnknownLocation(name.to_string()))
    }

    pub fn plug_type_by_name(&self, name: &str) -> InfraResult<PlugTypeId> {
        self.plug_names
            .get(name.trim())
            .copied()
            .ok_or_else(|| InfraError::UnknownPlugType(name.to_string()))
    }

    pub fn charger(&self, id: ChargerId) -> InfraResult<&Charger> {
        self.chargers
            .get(id.index())
            .ok_or(InfraError::ChargerNotFound(id))
    }

    pub fn point(&self, id: PointId) -> InfraResult<&ChargingPoint> {
        self.points.get(id.index()).ok_or(InfraError::PointNotFound(id))
    }

    /// All points at `location`, ascending by id.
    pub fn points_at(&self, location: LocationId) -> impl Iterator<Item = &ChargingPoint> {
        self.points.iter().filter(move |p| p.location == location)
    }

    // ── Capacities ────────────────────────────────────────────────────────

    /// Nameplate rating of a point: its strongest plug.
    pub fn point_capacity_kw(&self, id: PointId) -> InfraResult<f64> {
        let point = self.point(id)?;
        Ok(point
            .plugs
            .iter()
            .filter_map(|p| self.plug_types.get(p.index()))
            .map(|p| p.capacity_kw)
            .fold(0.0, f64::max))
    }

    /// Rating of a point as seen by a vehicle with plugs `compatible`: the
    /// strongest plug both sides share.  `None` if they share none.
    pub fn point_rated_kw(&self, id: PointId, compatible: &[PlugTypeId]) -> InfraResult<Option<f64>> {
        let point = self.point(id)?;
        Ok(point
            .plugs
            .iter()
            .filter(|p| compatible.contains(p))
            .filter_map(|p| self.plug_types.get(p.index()))
            .map(|p| p.capacity_kw)
            .reduce(f64::max))
    }

    /// Sum of the point ratings of a charger.
    pub fn charger_capacity_kw(&self, id: ChargerId) -> InfraResult<f64> {
        let charger = self.charger(id)?;
        charger
            .points
            .iter()
            .try_fold(0.0, |acc, &p| -> InfraResult<f64> { Ok(acc + self.point_capacity_kw(p)?) })
    }

    /// The location's grid ceiling, or the sum of its chargers when the
    /// connection is unconstrained.
    pub fn location_capacity_kw(&self, id: LocationId) -> InfraResult<f64> {
        let location = self.location(id)?;
        if let Some(ceiling) = location.grid_ceiling_kw {
            return Ok(ceiling);
        }
        location
            .chargers
            .iter()
            .try_fold(0.0, |acc, &c| -> InfraResult<f64> { Ok(acc + self.charger_capacity_kw(c)?) })
    }

    /// Free points at `location` that accept one of `compatible`, ascending by id.
    pub fn free_compatible_points(
        &self,
        location:   LocationId,
        compatible: &[PlugTypeId],
    ) -> Vec<PointId> {
        self.points_at(location)
            .filter(|p| p.is_free() && p.accepts(compatible))
            .map(|p| p.id)
            .collect()
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    /// Attach `vehicle` to `point`.
    pub fn assign(&mut self, point: PointId, vehicle: VehicleId) -> InfraResult<()> {
        let p = self
            .points
            .get_mut(point.index())
            .ok_or(InfraError::PointNotFound(point))?;
        if !p.is_free() {
            return Err(InfraError::PointOccupied { point, vehicle });
        }
        p.occupants.push(vehicle);
        Ok(())
    }

    /// Detach `vehicle` from `point`.  Returns `false` if it wasn't attached.
    pub fn release(&mut self, point: PointId, vehicle: VehicleId) -> bool {
        match self.points.get_mut(point.index()) {
            Some(p) => {
                let before = p.occupants.len();
                p.occupants.retain(|&v| v != vehicle);
                p.occupants.len() != before
            }
            None => false,
        }
    }

    /// Detach every vehicle from `point` and return them.
    pub fn force_release(&mut self, point: PointId) -> InfraResult<Vec<VehicleId>> {
        let p = self
            .points
            .get_mut(point.index())
            .ok_or(InfraError::PointNotFound(point))?;
        Ok(std::mem::take(&mut p.occupants))
    }

    /// Zero every location's output accumulator.
    pub fn reset_outputs(&mut self) {
        for location in &mut self.locations {
            location.output.reset();
        }
    }
}

// ── InfrastructureBuilder ─────────────────────────────────────────────────────

/// Incremental builder.  Ids are assigned densely in insertion order.
#[derive(Default)]
pub struct InfrastructureBuilder {
    plug_types: Vec<PlugType>,
    locations:  Vec<Location>,
    chargers:   Vec<Charger>,
    points:     Vec<ChargingPoint>,
}

impl InfrastructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plug_type(&mut self, name: &str, capacity_kw: f64) -> InfraResult<PlugTypeId> {
        if capacity_kw.is_nan() || capacity_kw <= 0.0 {
            return Err(InfraError::InvalidValue { what: "plug capacity", value: capacity_kw });
        }
        if self.plug_types.iter().any(|p| p.name == name) {
            return Err(InfraError::DuplicateName { what: "plug type", name: name.into() });
        }
        let id: PlugTypeId = next_id(self.plug_types.len(), "plug types")?;
        self.plug_types.push(PlugType { id, name: name.into(), capacity_kw });
        Ok(id)
    }

    pub fn add_location(
        &mut self,
        name:            &str,
        kind:            LocationKind,
        grid_ceiling_kw: Option<f64>,
    ) -> InfraResult<LocationId> {
        if let Some(c) = grid_ceiling_kw {
            if c.is_nan() || c < 0.0 {
                return Err(InfraError::InvalidValue { what: "grid ceiling", value: c });
            }
        }
        if self.locations.iter().any(|l| l.name == name) {
            return Err(InfraError::DuplicateName { what: "location", name: name.into() });
        }
        let id: LocationId = next_id(self.locations.len(), "locations")?;
        self.locations.push(Location {
            id,
            name: name.into(),
            kind,
            chargers: Vec::new(),
            grid_ceiling_kw,
            output: LocationOutput::default(),
        });
        Ok(id)
    }

    pub fn add_charger(&mut self, location: LocationId, name: &str) -> InfraResult<ChargerId> {
        let id: ChargerId = next_id(self.chargers.len(), "chargers")?;
        self.locations
            .get_mut(location.index())
            .ok_or(InfraError::LocationNotFound(location))?
            .chargers
            .push(id);
        self.chargers.push(Charger { id, name: name.into(), location, points: Vec::new() });
        Ok(id)
    }

    pub fn add_point(
        &mut self,
        charger:       ChargerId,
        plugs:         &[PlugTypeId],
        max_occupancy: u8,
    ) -> InfraResult<PointId> {
        if let Some(bad) = plugs.iter().find(|p| p.index() >= self.plug_types.len()) {
            return Err(InfraError::UnknownPlugType(bad.to_string()));
        }
        let id: PointId = next_id(self.points.len(), "charging points")?;
        let c = self
            .chargers
            .get_mut(charger.index())
            .ok_or(InfraError::ChargerNotFound(charger))?;
        c.points.push(id);
        self.points.push(ChargingPoint {
            id,
            charger,
            location: c.location,
            plugs: plugs.to_vec(),
            max_occupancy: max_occupancy.max(1),
            occupants: Vec::new(),
        });
        Ok(id)
    }

    pub fn build(self) -> Infrastructure {
        let location_names = self
            .locations
            .iter()
            .map(|l| (l.name.clone(), l.id))
            .collect();
        let plug_names = self
            .plug_types
            .iter()
            .map(|p| (p.name.clone(), p.id))
            .collect();
        Infrastructure {
            plug_types: self.plug_types,
            locations: self.locations,
            chargers: self.chargers,
            points: self.points,
            location_names,
            plug_names,
        }
    }
}

/// Id for the next arena slot, failing once the id type is exhausted.
pub(crate) fn next_id<I: TryFrom<usize>>(len: usize, what: &'static str) -> InfraResult<I> {
    I::try_from(len).map_err(|_| InfraError::TooMany(what))
}
