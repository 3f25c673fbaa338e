//! TOML scenario files.
//!
//! A scenario names the simulation window, the charging infrastructure, the
//! fleet and two CSV inputs (schedule and grid).  CSV paths are resolved
//! relative to the scenario file.
//!
//! ```toml
//! [simulation]
//! start_date = "2023-01-01 00:00:00"
//! end_date   = "2023-01-02 00:00:00"
//! step_size  = 15            # minutes
//! rng_seed   = 7             # optional, only breaks exact ties
//!
//! [files]
//! schedule = "schedule.csv"
//! grid     = "grid.csv"
//!
//! [weights]
//! distance = 1.0
//! price    = 2.0
//!
//! [[plug_types]]
//! name        = "ccs"
//! capacity_kw = 150.0
//!
//! [[locations]]
//! name            = "depot"
//! kind            = "depot"
//! grid_ceiling_kw = 300.0
//!
//!   [[locations.chargers]]
//!   name = "hall"
//!
//!     [[locations.chargers.points]]
//!     plugs = ["ccs"]
//!     count = 4
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use fc_charge::{DEFAULT_DETOUR_SPEED_KMH, LocationSelector, Weights};
use fc_core::{PlugTypeId, SimConfig, VehicleTypeId};
use fc_fleet::{ChargingCurve, Fleet, VehicleType, load_schedule_csv};
use fc_infra::{
    DistanceTable, GridSeries, Infrastructure, InfrastructureBuilder, LocationKind, load_grid_csv,
};
use fc_sim::{Sim, SimBuilder, SimResult};

// ── File format ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub simulation:    SimulationSection,
    pub files:         FilesSection,
    /// Criterion name → weight.  Empty keeps the selector defaults.
    #[serde(default)]
    pub weights:       BTreeMap<String, f64>,
    pub plug_types:    Vec<PlugTypeSection>,
    pub vehicle_types: Vec<VehicleTypeSection>,
    pub locations:     Vec<LocationSection>,
    #[serde(default)]
    pub distances:     Vec<DistanceSection>,
    pub vehicles:      Vec<VehicleSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    pub start_date:         String,
    /// Exclusive.
    pub end_date:           String,
    /// Step length in minutes.
    pub step_size:          u32,
    #[serde(default)]
    pub rng_seed:           Option<u64>,
    #[serde(default)]
    pub num_threads:        Option<usize>,
    #[serde(default = "one")]
    pub output_interval:    u64,
    #[serde(default = "default_soc_min")]
    pub soc_min:            f64,
    /// kW.
    #[serde(default)]
    pub min_charging_power: f64,
    /// Price per kWh of locally fed-in energy.
    #[serde(default)]
    pub feed_in_price:      f64,
    #[serde(default)]
    pub ignore_warnings:    bool,
    #[serde(default)]
    pub max_detour_km:      Option<f64>,
    #[serde(default = "default_detour_speed")]
    pub detour_speed_kmh:   f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesSection {
    pub schedule: PathBuf,
    pub grid:     PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlugTypeSection {
    pub name:        String,
    pub capacity_kw: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleTypeSection {
    pub name:                        String,
    pub battery_capacity_kwh:        f64,
    pub base_consumption_kwh_per_km: f64,
    /// `(soc, kW)` breakpoints.  Either this or `charging_power_kw`.
    #[serde(default)]
    pub charging_curve:              Option<Vec<(f64, f64)>>,
    #[serde(default)]
    pub charging_power_kw:           Option<f64>,
    #[serde(default)]
    pub soc_min:                     Option<f64>,
    #[serde(default)]
    pub min_charging_power_kw:       Option<f64>,
    pub plugs:                       Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationSection {
    pub name:            String,
    pub kind:            String,
    #[serde(default)]
    pub grid_ceiling_kw: Option<f64>,
    #[serde(default)]
    pub chargers:        Vec<ChargerSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChargerSection {
    pub name:   String,
    pub points: Vec<PointSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointSection {
    pub plugs:         Vec<String>,
    #[serde(default = "one_u8")]
    pub max_occupancy: u8,
    /// Identical points to create.
    #[serde(default = "one_usize")]
    pub count:         usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistanceSection {
    pub from: String,
    pub to:   String,
    pub km:   f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleSection {
    pub name:         String,
    pub vehicle_type: String,
    pub soc:          f64,
    pub location:     String,
}

fn one() -> u64 {
    1
}

fn one_u8() -> u8 {
    1
}

fn one_usize() -> usize {
    1
}

fn default_soc_min() -> f64 {
    SimConfig::DEFAULT_SOC_MIN
}

fn default_detour_speed() -> f64 {
    DEFAULT_DETOUR_SPEED_KMH
}

impl ScenarioFile {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid scenario file")
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}

// ── Loaded scenario ───────────────────────────────────────────────────────────

/// Every input of a run, loaded and cross-referenced.  Cloned once per repeat.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub config:    SimConfig,
    pub fleet:     Fleet,
    pub infra:     Infrastructure,
    pub distances: DistanceTable,
    pub grid:      GridSeries,
    pub selector:  LocationSelector,
}

impl Scenario {
    /// Parse `path` and load the CSV files it references.
    pub fn load(path: &Path) -> Result<Self> {
        let file = ScenarioFile::from_toml_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(file, base)
    }

    pub fn from_file(file: ScenarioFile, base: &Path) -> Result<Self> {
        let config = sim_config(&file.simulation)?;
        let (infra, plugs) = infrastructure(&file)?;
        let fleet = fleet(&file, &config, &infra, &plugs)?;
        let mut scenario = Self {
            distances: distances(&file, &infra)?,
            selector: selector(&file)?,
            grid: GridSeries::new(),
            config,
            fleet,
            infra,
        };

        let clock = scenario.config.make_clock();
        let schedule_path = base.join(&file.files.schedule);
        let schedule = load_schedule_csv(&schedule_path, &clock, &scenario.infra)
            .with_context(|| format!("loading schedule {}", schedule_path.display()))?;
        scenario.fleet.assign_schedule(schedule)?;

        let grid_path = base.join(&file.files.grid);
        scenario.grid = load_grid_csv(&grid_path, &clock, scenario.config.total_ticks, &scenario.infra)
            .with_context(|| format!("loading grid data {}", grid_path.display()))?;

        tracing::info!(
            vehicles = scenario.fleet.len(),
            locations = scenario.infra.locations().len(),
            ticks = scenario.config.total_ticks,
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// A fresh simulation over a copy of this scenario, tie-breaking with `seed`.
    pub fn build_sim(&self, seed: Option<u64>) -> SimResult<Sim<GridSeries>> {
        let config = SimConfig { seed, ..self.config.clone() };
        SimBuilder::new(config, self.fleet.clone(), self.infra.clone(), self.grid.clone())
            .distances(self.distances.clone())
            .selector(self.selector.clone())
            .build()
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

fn sim_config(s: &SimulationSection) -> Result<SimConfig> {
    let mut config = SimConfig::from_dates(&s.start_date, &s.end_date, s.step_size)?;
    config.seed = s.rng_seed;
    config.num_threads = s.num_threads;
    config.output_interval_ticks = s.output_interval;
    config.soc_min = s.soc_min;
    config.min_charging_power_kw = s.min_charging_power;
    config.feed_in_price_per_kwh = s.feed_in_price;
    config.ignore_warnings = s.ignore_warnings;
    config.validate()?;
    Ok(config)
}

fn infrastructure(file: &ScenarioFile) -> Result<(Infrastructure, HashMap<String, PlugTypeId>)> {
    let mut b = InfrastructureBuilder::new();
    let mut plugs = HashMap::new();
    for p in &file.plug_types {
        plugs.insert(p.name.clone(), b.add_plug_type(&p.name, p.capacity_kw)?);
    }

    for l in &file.locations {
        let kind: LocationKind = l.kind.parse()?;
        let location = b.add_location(&l.name, kind, l.grid_ceiling_kw)?;
        for c in &l.chargers {
            let charger = b.add_charger(location, &c.name)?;
            for p in &c.points {
                let ids = plug_ids(&plugs, &p.plugs)
                    .with_context(|| format!("charger {} at {}", c.name, l.name))?;
                for _ in 0..p.count {
                    b.add_point(charger, &ids, p.max_occupancy)?;
                }
            }
        }
    }
    Ok((b.build(), plugs))
}

fn plug_ids(plugs: &HashMap<String, PlugTypeId>, names: &[String]) -> Result<Vec<PlugTypeId>> {
    names
        .iter()
        .map(|n| match plugs.get(n) {
            Some(&id) => Ok(id),
            None => bail!("unknown plug type {n:?}"),
        })
        .collect()
}

fn fleet(
    file:   &ScenarioFile,
    config: &SimConfig,
    infra:  &Infrastructure,
    plugs:  &HashMap<String, PlugTypeId>,
) -> Result<Fleet> {
    let mut fleet = Fleet::new();
    for t in &file.vehicle_types {
        let charging_curve = match (&t.charging_curve, t.charging_power_kw) {
            (Some(points), None) => ChargingCurve::new(points.clone())?,
            (None, Some(kw)) => ChargingCurve::constant(kw),
            _ => bail!(
                "vehicle type {}: set exactly one of charging_curve and charging_power_kw",
                t.name
            ),
        };
        fleet.add_vehicle_type(VehicleType {
            id: VehicleTypeId(0),
            name: t.name.clone(),
            battery_capacity_kwh: t.battery_capacity_kwh,
            base_consumption_kwh_per_km: t.base_consumption_kwh_per_km,
            charging_curve,
            soc_min: t.soc_min.unwrap_or(config.soc_min),
            min_charging_power_kw: t.min_charging_power_kw.unwrap_or(config.min_charging_power_kw),
            plugs: plug_ids(plugs, &t.plugs).with_context(|| format!("vehicle type {}", t.name))?,
        })?;
    }

    for v in &file.vehicles {
        let vehicle_type = fleet.vehicle_type_by_name(&v.vehicle_type)?;
        let location = infra.location_by_name(&v.location)?;
        fleet.add_vehicle(&v.name, vehicle_type, v.soc, location)?;
    }
    Ok(fleet)
}

fn distances(file: &ScenarioFile, infra: &Infrastructure) -> Result<DistanceTable> {
    let mut table = DistanceTable::new();
    for d in &file.distances {
        table.insert(infra.location_by_name(&d.from)?, infra.location_by_name(&d.to)?, d.km)?;
    }
    Ok(table)
}

fn selector(file: &ScenarioFile) -> Result<LocationSelector> {
    let weights = if file.weights.is_empty() {
        Weights::default()
    } else {
        Weights::from_pairs(file.weights.iter().map(|(k, &v)| (k, v)))?
    };
    let s = &file.simulation;
    if s.detour_speed_kmh.is_nan() || s.detour_speed_kmh <= 0.0 {
        bail!("detour_speed_kmh {} must be positive", s.detour_speed_kmh);
    }
    Ok(LocationSelector {
        weights,
        max_detour_km: s.max_detour_km,
        detour_speed_kmh: s.detour_speed_kmh,
    })
}
