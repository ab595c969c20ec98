//! Class resolution and per-class box sizes.

use shared_types::ObjectClass;
use std::collections::BTreeMap;

/// Guess a class from the vehicle id when the simulator gives none.
///
/// Substring checks run in a fixed order, so `"motorbike"` is a motorcycle
/// and `"unicycle"` a bicycle.
pub fn infer_class_from_id(vehicle_id: &str) -> ObjectClass {
    let id = vehicle_id.to_lowercase();
    let has = |needle: &str| id.contains(needle);

    if has("truck") || has("freight") {
        ObjectClass::Truck
    } else if has("bus") {
        ObjectClass::Bus
    } else if has("bike") || has("motorcycle") {
        ObjectClass::Motorcycle
    } else if has("bicycle") || has("cycle") {
        ObjectClass::Bicycle
    } else if has("pedestrian") || has("person") {
        ObjectClass::Person
    } else {
        ObjectClass::Car
    }
}

/// Map a simulator class through `vehicle_types`; unmapped classes are cars.
pub fn class_for_sumo_class(vehicle_types: &BTreeMap<String, u8>, sumo_class: &str) -> u8 {
    vehicle_types
        .get(sumo_class)
        .copied()
        .unwrap_or(ObjectClass::Car.id())
}

/// Half width and half height in pixels before speed scaling.
pub fn base_half_size(class_id: u8) -> (f64, f64) {
    match ObjectClass::from_id(class_id) {
        Some(ObjectClass::Person) => (8.0, 8.0),
        Some(ObjectClass::Truck) => (18.0, 8.0),
        Some(ObjectClass::Bus) => (20.0, 10.0),
        Some(ObjectClass::Motorcycle) => (6.0, 4.0),
        Some(ObjectClass::Bicycle) => (4.0, 4.0),
        Some(ObjectClass::Car) | None => (12.0, 6.0),
    }
}

/// Half sizes grown by up to 30% with speed, truncated to whole pixels.
pub fn half_size(class_id: u8, speed: f64) -> (f64, f64) {
    let (w, h) = base_half_size(class_id);
    let factor = 1.0 + (speed * 0.01).min(0.3);
    ((w * factor).trunc(), (h * factor).trunc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::default_vehicle_types;

    #[test]
    fn test_infer_from_id_in_order() {
        assert_eq!(infer_class_from_id("Freight_3"), ObjectClass::Truck);
        assert_eq!(infer_class_from_id("city_bus.0"), ObjectClass::Bus);
        assert_eq!(infer_class_from_id("motorbike_1"), ObjectClass::Motorcycle);
        assert_eq!(infer_class_from_id("BICYCLE_2"), ObjectClass::Bicycle);
        assert_eq!(infer_class_from_id("person_9"), ObjectClass::Person);
        assert_eq!(infer_class_from_id("veh_0"), ObjectClass::Car);
    }

    #[test]
    fn test_sumo_class_mapping() {
        let types = default_vehicle_types();
        assert_eq!(class_for_sumo_class(&types, "bus"), 3);
        assert_eq!(class_for_sumo_class(&types, "emergency"), 1);
    }

    #[test]
    fn test_half_size_speed_scaling() {
        assert_eq!(half_size(1, 0.0), (12.0, 6.0));
        // 10 m/s grows by 10%
        assert_eq!(half_size(3, 10.0), (22.0, 11.0));
        // capped at 30%
        assert_eq!(half_size(2, 100.0), (23.0, 10.0));
        assert_eq!(half_size(42, 0.0), (12.0, 6.0));
    }
}
