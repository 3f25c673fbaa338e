//! Capacity-constrained power allocation.

use rustc_hash::FxHashMap;

use fc_core::{ChargerId, EPSILON, LocationId, PointId, Tick, VehicleId};
use fc_fleet::{Fleet, VehicleType};
use fc_infra::{GridContext, GridSample, Infrastructure};

use crate::{ChargeError, ChargeResult, ChargingOracle, CurveOracle, OracleBatch, OracleRequest};

/// Slack allowed on oracle results before they count as over-delivery.
const DELIVERY_TOLERANCE: f64 = 1e-6;

/// Power a vehicle would draw with no infrastructure limit: its curve at
/// `soc`, or zero when full or below the type's minimum charging power.
pub fn desired_power_kw(vehicle_type: &VehicleType, soc: f64) -> f64 {
    if soc >= 1.0 - EPSILON {
        return 0.0;
    }
    let kw = vehicle_type.charging_curve.power_at(soc);
    if kw < vehicle_type.min_charging_power_kw || kw <= 0.0 {
        0.0
    } else {
        kw
    }
}

/// One vehicle's settled charge for a step.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    pub vehicle:       VehicleId,
    pub point:         PointId,
    pub location:      LocationId,
    pub desired_kw:    f64,
    /// After point, charger and location clipping.
    pub requested_kw:  f64,
    pub delivered_kw:  f64,
    pub delivered_kwh: f64,
    pub soc:           f64,
}

#[derive(Clone, Debug)]
struct Planned {
    vehicle:      VehicleId,
    point:        PointId,
    location:     LocationId,
    rated_kw:     f64,
    desired_kw:   f64,
    requested_kw: f64,
    soc:          f64,
}

pub struct ChargeAllocator<O: ChargingOracle = CurveOracle> {
    oracle: O,
}

impl Default for ChargeAllocator<CurveOracle> {
    fn default() -> Self {
        Self::new(CurveOracle::default())
    }
}

impl<O: ChargingOracle> ChargeAllocator<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Settle one step for every connected `(vehicle, point)` pair.
    ///
    /// Pairs are processed in ascending point id; each is clipped to the
    /// remaining capacity of its point, charger and location before the next
    /// one is considered.  The oracle is called once with the whole batch.
    /// Vehicle SOC and the locations' output accumulators are updated.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &self,
        pairs:         &[(VehicleId, PointId)],
        fleet:         &mut Fleet,
        infra:         &mut Infrastructure,
        grid:          &dyn GridContext,
        now:           Tick,
        step_hours:    f64,
        feed_in_price: f64,
    ) -> ChargeResult<Vec<Settlement>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let mut pairs = pairs.to_vec();
        pairs.sort_by_key(|&(vehicle, point)| (point, vehicle));

        let plan = self.clip(&pairs, fleet, infra)?;

        let mut locations: Vec<LocationId> = plan.iter().map(|p| p.location).collect();
        locations.sort_unstable();
        locations.dedup();
        let samples = locations
            .iter()
            .map(|&loc| Ok((loc, grid.sample(loc, now)?)))
            .collect::<ChargeResult<Vec<(LocationId, GridSample)>>>()?;

        let result = {
            let requests = plan
                .iter()
                .map(|p| {
                    Ok(OracleRequest {
                        vehicle:        p.vehicle,
                        location:       p.location,
                        point:          p.point,
                        vehicle_type:   fleet.type_of(p.vehicle)?,
                        soc:            p.soc,
                        point_rated_kw: p.rated_kw,
                        requested_kw:   p.requested_kw,
                    })
                })
                .collect::<ChargeResult<Vec<_>>>()?;
            let batch = OracleBatch { step_hours, requests, grid: samples.clone() };
            self.oracle.settle(&batch)?
        };

        if result.deliveries.len() != plan.len() {
            return Err(ChargeError::OracleShape { expected: plan.len(), got: result.deliveries.len() });
        }

        // ── Check and apply deliveries ────────────────────────────────────
        let mut settlements = Vec::with_capacity(plan.len());
        let mut delivered_at: FxHashMap<LocationId, f64> = FxHashMap::default();
        for (p, d) in plan.iter().zip(&result.deliveries) {
            if d.vehicle != p.vehicle {
                return Err(ChargeError::OracleInvalid {
                    vehicle: p.vehicle,
                    reason:  format!("delivery out of order (got {})", d.vehicle),
                });
            }
            check_delivery(p, d.delivered_kw, d.delivered_kwh, d.soc, step_hours)?;
            let soc = d.soc.clamp(0.0, 1.0);

            fleet.vehicle_mut(p.vehicle)?.apply_charge(d.delivered_kw, d.delivered_kwh, soc);
            let out = &mut infra.location_mut(p.location)?.output;
            out.power_kw += d.delivered_kw;
            out.energy_kwh += d.delivered_kwh;
            out.connected_vehicles += 1;
            *delivered_at.entry(p.location).or_insert(0.0) += d.delivered_kwh;

            settlements.push(Settlement {
                vehicle:       p.vehicle,
                point:         p.point,
                location:      p.location,
                desired_kw:    p.desired_kw,
                requested_kw:  p.requested_kw,
                delivered_kw:  d.delivered_kw,
                delivered_kwh: d.delivered_kwh,
                soc,
            });
        }

        // ── Grid / feed-in split, cost and emission ───────────────────────
        for draw in &result.draws {
            let Some(&(_, sample)) = samples.iter().find(|(loc, _)| *loc == draw.location) else {
                return Err(ChargeError::OracleDraw(format!("{} was not in the batch", draw.location)));
            };
            let delivered = delivered_at.get(&draw.location).copied().unwrap_or(0.0);
            let drawn = draw.grid_kwh + draw.feed_in_kwh;
            if draw.grid_kwh < -DELIVERY_TOLERANCE
                || draw.feed_in_kwh < -DELIVERY_TOLERANCE
                || (drawn - delivered).abs() > DELIVERY_TOLERANCE * delivered.max(1.0)
            {
                return Err(ChargeError::OracleDraw(format!(
                    "{}: grid {:.6} + feed-in {:.6} kWh does not match {:.6} kWh delivered",
                    draw.location, draw.grid_kwh, draw.feed_in_kwh, delivered
                )));
            }
            let grid_kwh = draw.grid_kwh.max(0.0);
            let feed_in_kwh = draw.feed_in_kwh.max(0.0);
            let out = &mut infra.location_mut(draw.location)?.output;
            out.grid_kwh += grid_kwh;
            out.feed_in_kwh += feed_in_kwh;
            out.cost += grid_kwh * sample.price_per_kwh + feed_in_kwh * feed_in_price;
            out.emission_g += grid_kwh * sample.emission_g_per_kwh;
        }

        tracing::debug!(tick = %now, vehicles = settlements.len(), "charge settled");
        Ok(settlements)
    }

    /// Desired power, then the point → charger → location caps, in pair order.
    fn clip(
        &self,
        pairs: &[(VehicleId, PointId)],
        fleet: &Fleet,
        infra: &Infrastructure,
    ) -> ChargeResult<Vec<Planned>> {
        let mut point_left: FxHashMap<PointId, f64> = FxHashMap::default();
        let mut charger_left: FxHashMap<ChargerId, f64> = FxHashMap::default();
        let mut location_left: FxHashMap<LocationId, f64> = FxHashMap::default();
        let mut plan = Vec::with_capacity(pairs.len());

        for &(vehicle_id, point_id) in pairs {
            let vehicle = fleet.vehicle(vehicle_id)?;
            let vt = fleet.vehicle_type(vehicle.vehicle_type)?;
            let point = infra.point(point_id)?;
            let rated_kw = infra.point_rated_kw(point_id, &vt.plugs)?.unwrap_or(0.0);
            let desired_kw = desired_power_kw(vt, vehicle.soc);

            let point_cap = infra.point_capacity_kw(point_id)?;
            let charger_cap = infra.charger_capacity_kw(point.charger)?;
            let ceiling = infra.location(point.location)?.grid_ceiling_kw;
            let p_left = point_left.entry(point_id).or_insert(point_cap);
            let c_left = charger_left.entry(point.charger).or_insert(charger_cap);
            let l_left = location_left
                .entry(point.location)
                .or_insert(ceiling.unwrap_or(f64::INFINITY));

            let requested_kw = desired_kw
                .min(rated_kw)
                .min(*p_left)
                .min(*c_left)
                .min(*l_left)
                .max(0.0);
            *p_left -= requested_kw;
            *c_left -= requested_kw;
            *l_left -= requested_kw;

            if requested_kw + EPSILON < desired_kw {
                tracing::trace!(
                    vehicle = %vehicle_id,
                    point = %point_id,
                    desired_kw,
                    requested_kw,
                    "request clipped"
                );
            }
            plan.push(Planned {
                vehicle: vehicle_id,
                point: point_id,
                location: point.location,
                rated_kw,
                desired_kw,
                requested_kw,
                soc: vehicle.soc,
            });
        }
        Ok(plan)
    }
}

fn check_delivery(
    p:             &Planned,
    delivered_kw:  f64,
    delivered_kwh: f64,
    soc:           f64,
    step_hours:    f64,
) -> ChargeResult<()> {
    if !delivered_kw.is_finite() || !delivered_kwh.is_finite() || soc.is_nan() {
        return Err(ChargeError::OracleInvalid { vehicle: p.vehicle, reason: "non-finite value".into() });
    }
    if delivered_kw > p.requested_kw + DELIVERY_TOLERANCE
        || delivered_kwh > p.requested_kw * step_hours + DELIVERY_TOLERANCE
    {
        return Err(ChargeError::OracleOverDelivery {
            vehicle:   p.vehicle,
            requested: p.requested_kw,
            delivered: delivered_kw.max(delivered_kwh / step_hours.max(f64::MIN_POSITIVE)),
        });
    }
    if delivered_kw < -DELIVERY_TOLERANCE || soc < p.soc - DELIVERY_TOLERANCE {
        return Err(ChargeError::OracleInvalid {
            vehicle: p.vehicle,
            reason:  format!("charge went backwards (SOC {:.4} → {:.4})", p.soc, soc),
        });
    }
    Ok(())
}
