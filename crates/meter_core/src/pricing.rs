//! Fare calculation for a trip snapshot.
//!
//! Base fare rules, first match wins:
//!
//! 1. Special zone with a chosen zone: flat zone fare.
//! 2. Stepped trip types: flat price plus a fee per started km past the included distance.
//! 3. Everything else: a base fare (special service, sub-trip, fixed price or tier base)
//!    priced by distance, plus the route surcharge when it applies.
//!
//! Stops, waiting minutes, pet and extra passengers are added on top of every rule.

use serde::Serialize;

use crate::schedule::{BracketPrice, FareSchedule, TripPricing};
use crate::surcharges::StopAggregate;
use crate::trip::FareSelection;

/// Which base rule priced the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseRule {
    SpecialZone,
    Stepped,
    FixedRoute,
    Metered,
}

/// Fare components. [FareBreakdown::total] is the trip cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FareBreakdown {
    pub rule: BaseRule,
    pub base: f64,
    pub route_surcharge: f64,
    pub stops: f64,
    pub waiting: f64,
    pub pet: f64,
    pub extra_passengers: f64,
}

impl FareBreakdown {
    pub fn total(&self) -> f64 {
        self.base + self.route_surcharge + self.stops + self.waiting + self.pet + self.extra_passengers
    }
}

/// Price a trip snapshot. Pure: identical inputs always give identical output.
///
/// Negative distances are clamped to zero.
pub fn calculate_fare(
    schedule: &FareSchedule,
    distance_km: f64,
    waiting_minutes: u64,
    selection: &FareSelection,
    stops: &StopAggregate,
) -> FareBreakdown {
    let d = distance_km.max(0.0);
    let (rule, base, route_surcharge) = base_component(schedule, d, selection);

    FareBreakdown {
        rule,
        base,
        route_surcharge,
        stops: stops.accumulated_cost,
        waiting: waiting_minutes as f64 * schedule.waiting_rate_per_minute,
        pet: selection.pet.charge(),
        extra_passengers: selection.extra_passengers.charge(),
    }
}

fn base_component(schedule: &FareSchedule, d: f64, selection: &FareSelection) -> (BaseRule, f64, f64) {
    if selection.zone.is_flat_fare() {
        return (BaseRule::SpecialZone, schedule.special_zone_fare, 0.0);
    }

    if let TripPricing::Stepped {
        base_price,
        included_km,
        per_started_km,
    } = selection.trip_type.pricing
    {
        let base = if d <= included_km {
            base_price
        } else {
            base_price + (d - included_km).ceil() * per_started_km
        };
        return (BaseRule::Stepped, base, 0.0);
    }

    let base_fare = base_fare(schedule, selection);
    let metered = selection.trip_type.is_metered();
    let (rule, base) = if metered {
        let base = match schedule.bracket_price(d) {
            BracketPrice::Flat(price) => base_fare + (price - schedule.base_fare),
            BracketPrice::Open {
                base_price,
                extra_km,
                per_km,
            } => (base_price - schedule.base_fare) + base_fare + extra_km * per_km,
        };
        (BaseRule::Metered, base)
    } else {
        let rates = schedule.fixed_route;
        let base = base_fare + (d - rates.included_km).max(0.0) * rates.per_km;
        (BaseRule::FixedRoute, base)
    };

    let surcharge = &schedule.route_surcharge;
    let route_surcharge = if (!metered || selection.zone.is_pending()) && d >= surcharge.min_km {
        surcharge.amount
    } else {
        0.0
    };

    (rule, base, route_surcharge)
}

fn base_fare(schedule: &FareSchedule, selection: &FareSelection) -> f64 {
    if selection.special_service.active() {
        return selection.special_service.cost();
    }
    if let Some(sub_trip) = &selection.sub_trip {
        if matches!(selection.trip_type.pricing, TripPricing::FixedRoute { .. }) {
            return sub_trip.fixed_price;
        }
    }
    match selection.trip_type.pricing {
        TripPricing::FixedRoute {
            fixed_price: Some(price),
            ..
        } => price,
        _ => schedule.tier_base_fare(selection.tier),
    }
}
