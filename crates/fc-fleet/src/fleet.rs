//! The fleet arena: vehicle types and vehicles, addressed by id.

use std::collections::HashMap;

use rustc_hash::FxHashMap;

use fc_core::{LocationId, VehicleId, VehicleTypeId};

use crate::{FleetError, FleetResult, Task, Vehicle, VehicleType};

#[derive(Clone, Debug, Default)]
pub struct Fleet {
    vehicle_types: Vec<VehicleType>,
    vehicles:      Vec<Vehicle>,
    type_names:    FxHashMap<String, VehicleTypeId>,
    vehicle_names: FxHashMap<String, VehicleId>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type.  Its `id` field is overwritten with the assigned id.
    pub fn add_vehicle_type(&mut self, mut vehicle_type: VehicleType) -> FleetResult<VehicleTypeId> {
        vehicle_type.validate()?;
        if self.type_names.contains_key(&vehicle_type.name) {
            return Err(FleetError::DuplicateName { what: "vehicle type", name: vehicle_type.name });
        }
        let id = VehicleTypeId::try_from(self.vehicle_types.len()).map_err(|_| FleetError::Invalid {
            what:   "vehicle type",
            reason: "too many vehicle types".into(),
        })?;
        vehicle_type.id = id;
        self.type_names.insert(vehicle_type.name.clone(), id);
        self.vehicle_types.push(vehicle_type);
        Ok(id)
    }

    pub fn add_vehicle(
        &mut self,
        name:         &str,
        vehicle_type: VehicleTypeId,
        soc:          f64,
        location:     LocationId,
    ) -> FleetResult<VehicleId> {
        self.vehicle_type(vehicle_type)?;
        if !(0.0..=1.0).contains(&soc) {
            return Err(FleetError::Invalid {
                what:   "initial SOC",
                reason: format!("{name}: {soc} is outside [0, 1]"),
            });
        }
        if self.vehicle_names.contains_key(name) {
            return Err(FleetError::DuplicateName { what: "vehicle", name: name.into() });
        }
        let id = VehicleId::try_from(self.vehicles.len()).map_err(|_| FleetError::Invalid {
            what:   "vehicle",
            reason: "too many vehicles".into(),
        })?;
        self.vehicle_names.insert(name.into(), id);
        self.vehicles.push(Vehicle::new(id, name, vehicle_type, soc, location));
        Ok(id)
    }

    /// Attach tasks loaded from a schedule, keyed by vehicle name.
    pub fn assign_schedule(&mut self, schedule: HashMap<String, Vec<Task>>) -> FleetResult<()> {
        let mut entries: Vec<_> = schedule.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, tasks) in entries {
            let id = self.vehicle_by_name(&name)?;
            for task in tasks {
                self.vehicles[id.index()].add_task(task)?;
            }
        }
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    pub fn vehicle(&self, id: VehicleId) -> FleetResult<&Vehicle> {
        self.vehicles.get(id.index()).ok_or(FleetError::VehicleNotFound(id))
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> FleetResult<&mut Vehicle> {
        self.vehicles
            .get_mut(id.index())
            .ok_or(FleetError::VehicleNotFound(id))
    }

    pub fn vehicle_type(&self, id: VehicleTypeId) -> FleetResult<&VehicleType> {
        self.vehicle_types
            .get(id.index())
            .ok_or(FleetError::VehicleTypeNotFound(id))
    }

    /// The type of vehicle `id`.
    pub fn type_of(&self, id: VehicleId) -> FleetResult<&VehicleType> {
        self.vehicle_type(self.vehicle(id)?.vehicle_type)
    }

    pub fn vehicle_by_name(&self, name: &str) -> FleetResult<VehicleId> {
        self.vehicle_names
            .get(name.trim())
            .copied()
            .ok_or_else(|| FleetError::UnknownVehicle(name.into()))
    }

    pub fn vehicle_type_by_name(&self, name: &str) -> FleetResult<VehicleTypeId> {
        self.type_names
            .get(name.trim())
            .copied()
            .ok_or_else(|| FleetError::UnknownVehicleType(name.into()))
    }

    /// Split borrow: shared types, mutable vehicles.
    pub fn split_mut(&mut self) -> (&[VehicleType], &mut [Vehicle]) {
        (&self.vehicle_types, &mut self.vehicles)
    }
}
