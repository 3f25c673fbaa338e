//! Charging location selection.
//!
//! For a vehicle that needs a point, every free compatible point at a
//! reachable location becomes a [`Candidate`].  Each criterion is min–max
//! normalised across the candidate set (1 = best), except [`Criterion::Soc`]
//! which has a fixed scale; the results are weighted and summed.  The
//! best score wins; exact ties go to the lowest `(LocationId, PointId)`, or to
//! a seeded draw when the simulation has a seed.

use fc_core::{EPSILON, LocationId, PointId, SimRng, Tick};
use fc_fleet::{ConsumptionModel, DriveTask, Vehicle, VehicleType};
use fc_infra::{DistanceTable, GridContext, Infrastructure};

use crate::{ChargeResult, Criterion, Weights};

/// Speed assumed for the drive to a remote charging location.
pub const DEFAULT_DETOUR_SPEED_KMH: f64 = 50.0;

/// Scores closer than this are considered equal.
const TIE_EPS: f64 = 1e-9;

/// The world as seen by the selector in one step.
pub struct SelectionContext<'a> {
    pub infra:       &'a Infrastructure,
    pub distances:   &'a DistanceTable,
    pub grid:        &'a dyn GridContext,
    pub consumption: &'a dyn ConsumptionModel,
    pub now:         Tick,
    pub step_hours:  f64,
    /// End of the charge task the vehicle is in, if any.
    pub window_end:  Option<Tick>,
}

/// One free point the vehicle could take.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub location:    LocationId,
    pub point:       PointId,
    pub distance_km: f64,
    /// Energy spent reaching the location (kWh); 0 for the current location.
    pub detour_kwh:  f64,
    /// Raw criterion values, indexed like [`Criterion::ALL`].
    pub raw:         [f64; Criterion::ALL.len()],
}

impl Candidate {
    #[inline]
    pub fn value(&self, criterion: Criterion) -> f64 {
        self.raw[criterion.index()]
    }
}

/// The selector's pick.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub location:    LocationId,
    pub point:       PointId,
    pub distance_km: f64,
    pub detour_kwh:  f64,
    pub score:       f64,
}

#[derive(Clone, Debug)]
pub struct LocationSelector {
    pub weights:          Weights,
    /// Locations further away than this are never considered.
    pub max_detour_km:    Option<f64>,
    pub detour_speed_kmh: f64,
}

impl Default for LocationSelector {
    fn default() -> Self {
        Self::new(Weights::default())
    }
}

impl LocationSelector {
    pub fn new(weights: Weights) -> Self {
        Self {
            weights,
            max_detour_km: None,
            detour_speed_kmh: DEFAULT_DETOUR_SPEED_KMH,
        }
    }

    /// Every free compatible point the vehicle can reach without dropping
    /// below its minimum SOC, ascending by `(location, point)`.
    pub fn candidates(
        &self,
        vehicle:      &Vehicle,
        vehicle_type: &VehicleType,
        ctx:          &SelectionContext<'_>,
    ) -> ChargeResult<Vec<Candidate>> {
        let mut out = Vec::new();
        let mut ambient_c: Option<f64> = None;
        let window_h = ctx
            .window_end
            .map_or(0.0, |end| end.since(ctx.now) as f64 * ctx.step_hours);

        for location in ctx.infra.locations() {
            let Some(distance_km) = ctx.distances.get(vehicle.location, location.id) else {
                continue;
            };
            if self.max_detour_km.is_some_and(|max| distance_km > max + EPSILON) {
                continue;
            }
            let points = ctx.infra.free_compatible_points(location.id, &vehicle_type.plugs);
            if points.is_empty() {
                continue;
            }

            let detour_kwh = if distance_km > 0.0 {
                let temperature_c = match ambient_c {
                    Some(t) => t,
                    None => {
                        let t = ctx.grid.sample(vehicle.location, ctx.now)?.temperature_c;
                        ambient_c = Some(t);
                        t
                    }
                };
                let drive = DriveTask {
                    destination: location.id,
                    distance_km,
                    speed_kmh: self.detour_speed_kmh,
                    temperature_c: Some(temperature_c),
                };
                ctx.consumption.energy_kwh(vehicle_type, &drive, temperature_c)
            } else {
                0.0
            };
            if distance_km > 0.0
                && vehicle.soc - vehicle_type.soc_of(detour_kwh) < vehicle_type.soc_min - EPSILON
            {
                tracing::trace!(
                    vehicle = %vehicle.id,
                    location = %location.id,
                    distance_km,
                    "location out of reach"
                );
                continue;
            }

            let sample = ctx.grid.sample(location.id, ctx.now)?;
            let occupied_kw = ctx
                .infra
                .points_at(location.id)
                .filter(|p| p.is_occupied())
                .try_fold(0.0, |acc, p| -> ChargeResult<f64> {
                    Ok(acc + ctx.infra.point_capacity_kw(p.id)?)
                })?;
            let headroom_kw = (ctx.infra.location_capacity_kw(location.id)? - occupied_kw).max(0.0);
            let time_share = if distance_km <= 0.0 {
                0.0
            } else if window_h > 0.0 && self.detour_speed_kmh > 0.0 {
                (2.0 * distance_km / self.detour_speed_kmh / window_h).min(1.0)
            } else {
                1.0
            };

            for point in points {
                let rated_kw = ctx
                    .infra
                    .point_rated_kw(point, &vehicle_type.plugs)?
                    .unwrap_or(0.0);
                let mut raw = [0.0; Criterion::ALL.len()];
                raw[Criterion::Distance.index()] = distance_km;
                raw[Criterion::GridHeadroom.index()] = headroom_kw;
                raw[Criterion::Price.index()] = sample.price_per_kwh;
                raw[Criterion::Emission.index()] = sample.emission_g_per_kwh;
                raw[Criterion::FeedIn.index()] = sample.feed_in_kwh;
                raw[Criterion::Power.index()] = rated_kw;
                raw[Criterion::Time.index()] = time_share;
                raw[Criterion::Soc.index()] = vehicle.soc;
                out.push(Candidate { location: location.id, point, distance_km, detour_kwh, raw });
            }
        }
        Ok(out)
    }

    /// Weighted normalised score per candidate, same order as `candidates`.
    pub fn score(&self, candidates: &[Candidate]) -> Vec<f64> {
        let mut scores = vec![0.0; candidates.len()];
        for (criterion, weight) in self.weights.active() {
            let (lo, hi) = candidates.iter().map(|c| c.value(criterion)).fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), v| (lo.min(v), hi.max(v)),
            );
            let span = hi - lo;
            for (score, candidate) in scores.iter_mut().zip(candidates) {
                let v = candidate.value(criterion);
                let norm = if criterion == Criterion::Soc {
                    (1.0 - v).clamp(0.0, 1.0)
                } else if span <= EPSILON {
                    1.0
                } else if criterion.higher_is_better() {
                    (v - lo) / span
                } else {
                    (hi - v) / span
                };
                *score += weight * norm;
            }
        }
        scores
    }

    /// Pick the best point for `vehicle`, or `None` when nothing is free and
    /// reachable.  `rng` is only drawn from when several candidates tie.
    pub fn select(
        &self,
        vehicle:      &Vehicle,
        vehicle_type: &VehicleType,
        ctx:          &SelectionContext<'_>,
        rng:          Option<&mut SimRng>,
    ) -> ChargeResult<Option<Selection>> {
        let candidates = self.candidates(vehicle, vehicle_type, ctx)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        let scores = self.score(&candidates);
        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s >= best - TIE_EPS)
            .map(|(i, _)| i)
            .collect();

        let pick = match rng {
            Some(rng) if tied.len() > 1 => rng.pick_index(tied.len()).map_or(tied[0], |i| tied[i]),
            _ => tied[0],
        };
        let chosen = &candidates[pick];
        tracing::debug!(
            vehicle = %vehicle.id,
            location = %chosen.location,
            point = %chosen.point,
            score = scores[pick],
            candidates = candidates.len(),
            "charging point selected"
        );
        Ok(Some(Selection {
            location:    chosen.location,
            point:       chosen.point,
            distance_km: chosen.distance_km,
            detour_kwh:  chosen.detour_kwh,
            score:       scores[pick],
        }))
    }
}
