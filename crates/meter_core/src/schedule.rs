//! Fare schedule: rates, surcharge constants and the trip-type catalog.
//!
//! Everything here is plain data. [crate::pricing] reads it; nothing mutates it
//! once a controller is built.

use serde::{Deserialize, Serialize};

/// Base fare selector used when the trip type does not fix its own price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FareTier {
    #[default]
    Normal,
    Special,
}

/// Named variant of a fixed-route trip with its own flat price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTrip {
    pub id: String,
    pub name: String,
    pub fixed_price: f64,
}

/// How a trip type turns distance into a base fare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripPricing {
    /// Distance bracket table.
    Metered,
    /// Flat price (or tier base when unset) plus a per-km rate past the included distance.
    FixedRoute {
        fixed_price: Option<f64>,
        route_km: Option<f64>,
    },
    /// Flat price up to `included_km`, then `per_started_km` for every started km beyond it.
    Stepped {
        base_price: f64,
        included_km: f64,
        per_started_km: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pricing: TripPricing,
    #[serde(default)]
    pub sub_trips: Vec<SubTrip>,
}

impl TripType {
    pub fn is_metered(&self) -> bool {
        matches!(self.pricing, TripPricing::Metered)
    }

    pub fn sub_trip(&self, id: &str) -> Option<&SubTrip> {
        self.sub_trips.iter().find(|s| s.id == id)
    }
}

/// Half-open distance bracket `[previous upper bound, upto_km)` with a flat price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareBracket {
    pub upto_km: f64,
    pub price: f64,
}

/// Open-ended last bracket: `base_price` plus `per_km` past `from_km`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenBracket {
    pub from_km: f64,
    pub base_price: f64,
    pub per_km: f64,
}

/// Bracket matched for a metered distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BracketPrice {
    Flat(f64),
    Open { base_price: f64, extra_km: f64, per_km: f64 },
}

/// Per-km pricing past the included distance on non-metered routes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedRouteRates {
    pub included_km: f64,
    pub per_km: f64,
}

/// Flat surcharge for non-metered trips (or a zone toggle without a zone) past `min_km`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSurcharge {
    pub amount: f64,
    pub min_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopFees {
    pub quick: f64,
    pub service: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurchargeFees {
    pub pet_with_cage: f64,
    pub pet_without_cage: f64,
    pub pickup_service: f64,
    pub purchase_service: f64,
    pub per_adult: f64,
    pub per_child: f64,
}

impl Default for SurchargeFees {
    fn default() -> Self {
        Self {
            pet_with_cage: 20.0,
            pet_without_cage: 30.0,
            pickup_service: 60.0,
            purchase_service: 70.0,
            per_adult: 20.0,
            per_child: 10.0,
        }
    }
}

/// Fare schedule. Defaults are the production rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FareSchedule {
    /// Normal-tier base fare; also the reference price bracket adjustments are relative to.
    pub base_fare: f64,
    pub special_base_fare: f64,
    pub waiting_rate_per_minute: f64,
    /// Sorted by `upto_km`; distances past the last bound fall into `open_bracket`.
    pub brackets: Vec<FareBracket>,
    pub open_bracket: OpenBracket,
    pub fixed_route: FixedRouteRates,
    pub route_surcharge: RouteSurcharge,
    pub special_zone_fare: f64,
    pub stop_fees: StopFees,
    pub surcharges: SurchargeFees,
    /// The first entry is the default selection.
    pub trip_types: Vec<TripType>,
    pub special_zones: Vec<String>,
}

impl Default for FareSchedule {
    fn default() -> Self {
        let mut special_zones: Vec<String> = [
            "Américas",
            "Col. San José",
            "Emiliano Zapata",
            "Las Garzas",
            "Las Lomas",
            "Pueblos de Jalisco",
            "Valle de Zapotlan",
        ]
        .iter()
        .map(|z| z.to_string())
        .collect();
        special_zones.sort();

        Self {
            base_fare: 50.0,
            special_base_fare: 60.0,
            waiting_rate_per_minute: 3.0,
            brackets: vec![
                FareBracket { upto_km: 4.0, price: 50.0 },
                FareBracket { upto_km: 5.0, price: 55.0 },
                FareBracket { upto_km: 6.0, price: 60.0 },
                FareBracket { upto_km: 7.0, price: 65.0 },
                FareBracket { upto_km: 8.0, price: 70.0 },
            ],
            open_bracket: OpenBracket {
                from_km: 8.0,
                base_price: 80.0,
                per_km: 16.0,
            },
            fixed_route: FixedRouteRates {
                included_km: 5.0,
                per_km: 10.0,
            },
            route_surcharge: RouteSurcharge {
                amount: 5.0,
                min_km: 3.7,
            },
            special_zone_fare: 70.0,
            stop_fees: StopFees {
                quick: 20.0,
                service: 50.0,
            },
            surcharges: SurchargeFees::default(),
            trip_types: default_trip_types(),
            special_zones,
        }
    }
}

fn default_trip_types() -> Vec<TripType> {
    let sub_trip = |id: &str, name: &str, fixed_price: f64| SubTrip {
        id: id.to_string(),
        name: name.to_string(),
        fixed_price,
    };
    vec![
        TripType {
            id: "normal".to_string(),
            name: "Viaje Normal".to_string(),
            description: "Tarifa por distancia recorrida".to_string(),
            pricing: TripPricing::Metered,
            sub_trips: Vec::new(),
        },
        TripType {
            id: "walmart".to_string(),
            name: "Ruta Walmart".to_string(),
            description: "Centro → Walmart Guzmán".to_string(),
            pricing: TripPricing::FixedRoute {
                fixed_price: Some(60.0),
                route_km: Some(5.2),
            },
            sub_trips: Vec::new(),
        },
        TripType {
            id: "tecnologico".to_string(),
            name: "Ruta Tecnológico".to_string(),
            description: "Centro → Tec. Guzmán".to_string(),
            pricing: TripPricing::FixedRoute {
                fixed_price: Some(70.0),
                route_km: Some(5.9),
            },
            sub_trips: Vec::new(),
        },
        TripType {
            id: "cristoRey".to_string(),
            name: "Ruta Cristo Rey".to_string(),
            description: "Centro → Cerro Cristo Rey".to_string(),
            pricing: TripPricing::FixedRoute {
                fixed_price: None,
                route_km: None,
            },
            sub_trips: vec![
                sub_trip("cristoRey-cano", "Caño", 60.0),
                sub_trip("cristoRey-mitad", "Mitad", 70.0),
                sub_trip("cristoRey-arriba", "Arriba", 80.0),
            ],
        },
        TripType {
            id: "colmena".to_string(),
            name: "La Colmena".to_string(),
            description: "Precio base $120".to_string(),
            pricing: TripPricing::Stepped {
                base_price: 120.0,
                included_km: 4.9,
                per_started_km: 10.0,
            },
            sub_trips: Vec::new(),
        },
    ]
}

impl FareSchedule {
    pub fn tier_base_fare(&self, tier: FareTier) -> f64 {
        match tier {
            FareTier::Normal => self.base_fare,
            FareTier::Special => self.special_base_fare,
        }
    }

    /// Bracket for a metered distance. Negative input is treated as zero.
    pub fn bracket_price(&self, distance_km: f64) -> BracketPrice {
        let d = distance_km.max(0.0);
        match self.brackets.iter().find(|b| d < b.upto_km) {
            Some(bracket) => BracketPrice::Flat(bracket.price),
            None => BracketPrice::Open {
                base_price: self.open_bracket.base_price,
                extra_km: (d - self.open_bracket.from_km).max(0.0),
                per_km: self.open_bracket.per_km,
            },
        }
    }

    pub fn trip_type(&self, id: &str) -> Option<&TripType> {
        self.trip_types.iter().find(|t| t.id == id)
    }

    /// Default selection: the first catalog entry, or a bare metered type for an empty catalog.
    pub fn default_trip_type(&self) -> TripType {
        self.trip_types.first().cloned().unwrap_or_else(|| TripType {
            id: "normal".to_string(),
            name: "Viaje Normal".to_string(),
            description: String::new(),
            pricing: TripPricing::Metered,
            sub_trips: Vec::new(),
        })
    }

    pub fn is_special_zone(&self, name: &str) -> bool {
        self.special_zones.iter().any(|z| z == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_are_half_open() {
        let schedule = FareSchedule::default();
        assert_eq!(schedule.bracket_price(0.0), BracketPrice::Flat(50.0));
        assert_eq!(schedule.bracket_price(3.999), BracketPrice::Flat(50.0));
        assert_eq!(schedule.bracket_price(4.0), BracketPrice::Flat(55.0));
        assert_eq!(schedule.bracket_price(7.99), BracketPrice::Flat(70.0));
    }

    #[test]
    fn open_bracket_starts_at_eight_km() {
        let schedule = FareSchedule::default();
        assert_eq!(
            schedule.bracket_price(8.0),
            BracketPrice::Open {
                base_price: 80.0,
                extra_km: 0.0,
                per_km: 16.0
            }
        );
        match schedule.bracket_price(10.0) {
            BracketPrice::Open { extra_km, .. } => assert!((extra_km - 2.0).abs() < 1e-12),
            other => panic!("expected open bracket, got {other:?}"),
        }
    }

    #[test]
    fn catalog_defaults_to_metered_normal_trip() {
        let schedule = FareSchedule::default();
        let default = schedule.default_trip_type();
        assert_eq!(default.id, "normal");
        assert!(default.is_metered());
        assert_eq!(
            schedule
                .trip_type("cristoRey")
                .and_then(|t| t.sub_trip("cristoRey-arriba"))
                .map(|s| s.fixed_price),
            Some(80.0)
        );
    }

    #[test]
    fn special_zones_are_sorted() {
        let schedule = FareSchedule::default();
        let mut sorted = schedule.special_zones.clone();
        sorted.sort();
        assert_eq!(schedule.special_zones, sorted);
        assert!(schedule.is_special_zone("Las Lomas"));
        assert!(!schedule.is_special_zone("Centro"));
    }

    #[test]
    fn partial_json_overrides_keep_defaults() {
        let schedule: FareSchedule =
            serde_json::from_str(r#"{ "base_fare": 55.0, "waiting_rate_per_minute": 4.0 }"#)
                .expect("schedule json");
        assert_eq!(schedule.base_fare, 55.0);
        assert_eq!(schedule.waiting_rate_per_minute, 4.0);
        assert_eq!(schedule.special_base_fare, 60.0);
        assert_eq!(schedule.trip_types.len(), 5);
    }
}
