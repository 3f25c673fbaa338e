//! Fluent builder for constructing a [`Sim`].

use fc_charge::{ChargeAllocator, ChargingOracle, CurveOracle, LocationSelector, Weights};
use fc_core::{SimConfig, SimRng};
use fc_fleet::{ConsumptionModel, Fleet, LinearConsumption, validate_fleet};
use fc_infra::{DistanceTable, GridContext, Infrastructure};

use crate::{AbortHandle, ResultAggregator, RunStatus, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<G, O, C>`].
///
/// # Required inputs
///
/// - [`SimConfig`]
/// - [`Fleet`] with tasks attached
/// - [`Infrastructure`]
/// - `G: GridContext`
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                 |
/// |---------------------|-----------------------------------------|
/// | `.distances(d)`     | empty: only the current location counts |
/// | `.weights(w)`       | `Weights::default()`                    |
/// | `.selector(s)`      | `LocationSelector::new(weights)`        |
/// | `.oracle(o)`        | `CurveOracle::default()`                |
/// | `.consumption(c)`   | `LinearConsumption::default()`          |
///
/// `build` runs every pre-run check: config values, references from the
/// fleet into the infrastructure, and each vehicle's task list.
pub struct SimBuilder<G: GridContext, O: ChargingOracle = CurveOracle, C: ConsumptionModel = LinearConsumption> {
    config:      SimConfig,
    fleet:       Fleet,
    infra:       Infrastructure,
    grid:        G,
    distances:   DistanceTable,
    weights:     Weights,
    selector:    Option<LocationSelector>,
    oracle:      O,
    consumption: C,
}

impl<G: GridContext> SimBuilder<G> {
    pub fn new(config: SimConfig, fleet: Fleet, infra: Infrastructure, grid: G) -> Self {
        Self {
            config,
            fleet,
            infra,
            grid,
            distances:   DistanceTable::new(),
            weights:     Weights::default(),
            selector:    None,
            oracle:      CurveOracle::default(),
            consumption: LinearConsumption::default(),
        }
    }
}

impl<G: GridContext, O: ChargingOracle, C: ConsumptionModel> SimBuilder<G, O, C> {
    pub fn distances(mut self, distances: DistanceTable) -> Self {
        self.distances = distances;
        self
    }

    pub fn weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// Use a fully configured selector; overrides `.weights`.
    pub fn selector(mut self, selector: LocationSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn oracle<O2: ChargingOracle>(self, oracle: O2) -> SimBuilder<G, O2, C> {
        SimBuilder {
            config:      self.config,
            fleet:       self.fleet,
            infra:       self.infra,
            grid:        self.grid,
            distances:   self.distances,
            weights:     self.weights,
            selector:    self.selector,
            oracle,
            consumption: self.consumption,
        }
    }

    pub fn consumption<C2: ConsumptionModel>(self, consumption: C2) -> SimBuilder<G, O, C2> {
        SimBuilder {
            config:      self.config,
            fleet:       self.fleet,
            infra:       self.infra,
            grid:        self.grid,
            distances:   self.distances,
            weights:     self.weights,
            selector:    self.selector,
            oracle:      self.oracle,
            consumption,
        }
    }

    /// Validate inputs and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<G, O, C>> {
        self.config.validate()?;
        if let Some(max) = self.selector.as_ref().and_then(|s| s.max_detour_km) {
            if max.is_nan() || max < 0.0 {
                return Err(SimError::Configuration(format!("max detour {max} km is negative")));
            }
        }

        // ── References into the infrastructure ────────────────────────────
        for vt in self.fleet.vehicle_types() {
            if let Some(bad) = vt.plugs.iter().find(|p| p.index() >= self.infra.plug_types().len()) {
                return Err(SimError::Configuration(format!(
                    "vehicle type {} uses unknown plug type {bad}",
                    vt.name
                )));
            }
        }
        for v in self.fleet.vehicles() {
            self.infra.location(v.location)?;
        }

        // ── Task lists ────────────────────────────────────────────────────
        validate_fleet(&self.fleet, &self.consumption, &self.infra, Some(&self.grid as &dyn GridContext))?;

        tracing::debug!(
            vehicles = self.fleet.len(),
            locations = self.infra.locations().len(),
            distances = self.distances.len(),
            seeded = self.config.seed.is_some(),
            "simulation built"
        );

        let selector = self.selector.unwrap_or_else(|| LocationSelector::new(self.weights));
        Ok(Sim {
            clock:       self.config.make_clock(),
            rng:         self.config.seed.map(SimRng::new),
            aggregator:  ResultAggregator::new(self.infra.locations().len()),
            config:      self.config,
            fleet:       self.fleet,
            infra:       self.infra,
            distances:   self.distances,
            grid:        self.grid,
            consumption: self.consumption,
            selector,
            allocator:   ChargeAllocator::new(self.oracle),
            abort:       AbortHandle::default(),
            status:      RunStatus::Pending,
        })
    }
}
