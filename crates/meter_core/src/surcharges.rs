//! Surcharge selections, special zones and the stop aggregate.
//!
//! Each config derives `active` and `cost` from its selection, so the two can
//! never disagree with the fields they summarize.

use serde::{Deserialize, Serialize};

use crate::schedule::{StopFees, SurchargeFees};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetCarrier {
    Cage,
    NoCage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PetConfig {
    active: bool,
    with_cage: Option<bool>,
    cost: f64,
}

impl PetConfig {
    pub fn select(carrier: PetCarrier, fees: &SurchargeFees) -> Self {
        let (with_cage, cost) = match carrier {
            PetCarrier::Cage => (true, fees.pet_with_cage),
            PetCarrier::NoCage => (false, fees.pet_without_cage),
        };
        Self {
            active: true,
            with_cage: Some(with_cage),
            cost,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn with_cage(&self) -> Option<bool> {
        self.with_cage
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Amount added to the fare.
    pub fn charge(&self) -> f64 {
        if self.active {
            self.cost
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Pickup,
    Purchase,
}

/// Pickup/purchase errand. When active its cost replaces the base fare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpecialServiceConfig {
    active: bool,
    kind: Option<ServiceKind>,
    cost: f64,
}

impl SpecialServiceConfig {
    pub fn select(kind: ServiceKind, fees: &SurchargeFees) -> Self {
        let cost = match kind {
            ServiceKind::Pickup => fees.pickup_service,
            ServiceKind::Purchase => fees.purchase_service,
        };
        Self {
            active: true,
            kind: Some(kind),
            cost,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn kind(&self) -> Option<ServiceKind> {
        self.kind
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerKind {
    Adult,
    Child,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExtraPassengersConfig {
    active: bool,
    children: u32,
    adults: u32,
    cost: f64,
}

impl ExtraPassengersConfig {
    pub fn new(adults: u32, children: u32, fees: &SurchargeFees) -> Self {
        Self {
            active: adults > 0 || children > 0,
            children,
            adults,
            cost: f64::from(adults) * fees.per_adult + f64::from(children) * fees.per_child,
        }
    }

    /// Adds `delta` passengers of `kind`, saturating at zero.
    pub fn adjusted(&self, kind: PassengerKind, delta: i32, fees: &SurchargeFees) -> Self {
        let shift = |count: u32| {
            if delta >= 0 {
                count.saturating_add(delta.unsigned_abs())
            } else {
                count.saturating_sub(delta.unsigned_abs())
            }
        };
        match kind {
            PassengerKind::Adult => Self::new(shift(self.adults), self.children, fees),
            PassengerKind::Child => Self::new(self.adults, shift(self.children), fees),
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn charge(&self) -> f64 {
        if self.active {
            self.cost
        } else {
            0.0
        }
    }
}

/// Special-zone toggle and optional chosen zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpecialZoneSelection {
    pub active: bool,
    pub zone: Option<String>,
}

impl SpecialZoneSelection {
    /// Active with a zone chosen: the trip is billed at the flat zone fare.
    pub fn is_flat_fare(&self) -> bool {
        self.active && self.zone.is_some()
    }

    /// Active without a zone: counts toward the route surcharge.
    pub fn is_pending(&self) -> bool {
        self.active && self.zone.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    /// Flat fee only.
    Quick,
    /// Flat fee and a fresh distance leg.
    Service,
}

impl StopKind {
    pub fn fee(self, fees: &StopFees) -> f64 {
        match self {
            StopKind::Quick => fees.quick,
            StopKind::Service => fees.service,
        }
    }

    pub fn resets_distance(self) -> bool {
        matches!(self, StopKind::Service)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StopAggregate {
    pub count: u32,
    pub accumulated_cost: f64,
}

impl StopAggregate {
    pub fn record(&mut self, kind: StopKind, fees: &StopFees) {
        self.count += 1;
        self.accumulated_cost += kind.fee(fees);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_cost_follows_carrier() {
        let fees = SurchargeFees::default();
        let caged = PetConfig::select(PetCarrier::Cage, &fees);
        assert!(caged.active());
        assert_eq!(caged.with_cage(), Some(true));
        assert_eq!(caged.charge(), 20.0);
        assert_eq!(PetConfig::select(PetCarrier::NoCage, &fees).charge(), 30.0);
        assert_eq!(PetConfig::default().charge(), 0.0);
    }

    #[test]
    fn passengers_activate_only_with_a_count() {
        let fees = SurchargeFees::default();
        let none = ExtraPassengersConfig::default();
        assert!(!none.active());

        let two_adults_one_child = none
            .adjusted(PassengerKind::Adult, 2, &fees)
            .adjusted(PassengerKind::Child, 1, &fees);
        assert!(two_adults_one_child.active());
        assert_eq!(two_adults_one_child.cost(), 50.0);

        let cleared = two_adults_one_child
            .adjusted(PassengerKind::Adult, -5, &fees)
            .adjusted(PassengerKind::Child, -1, &fees);
        assert!(!cleared.active());
        assert_eq!(cleared.adults(), 0);
        assert_eq!(cleared.cost(), 0.0);
    }

    #[test]
    fn special_service_costs() {
        let fees = SurchargeFees::default();
        assert_eq!(SpecialServiceConfig::select(ServiceKind::Pickup, &fees).cost(), 60.0);
        assert_eq!(SpecialServiceConfig::select(ServiceKind::Purchase, &fees).cost(), 70.0);
        assert!(!SpecialServiceConfig::default().active());
    }

    #[test]
    fn stop_aggregate_accumulates_fees() {
        let fees = StopFees {
            quick: 20.0,
            service: 50.0,
        };
        let mut stops = StopAggregate::default();
        stops.record(StopKind::Quick, &fees);
        stops.record(StopKind::Service, &fees);
        assert_eq!(stops.count, 2);
        assert_eq!(stops.accumulated_cost, 70.0);
        assert!(StopKind::Service.resets_distance());
        assert!(!StopKind::Quick.resets_distance());
    }
}
