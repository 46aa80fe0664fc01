//! Deterministic emission order: manufacturer code, then code.
//!
//! Items without a manufacturer code sort first. Ties keep
//! declaration order (the sort is stable).

use matter_data_model::{AttributeDef, ClusterInstance, CommandDef, Endpoint, EventDef};

pub trait EmissionOrder {
    fn order_key(&self) -> (Option<u16>, u16);
}

impl EmissionOrder for ClusterInstance {
    fn order_key(&self) -> (Option<u16>, u16) {
        (self.manufacturer_code, self.code)
    }
}

impl EmissionOrder for AttributeDef {
    fn order_key(&self) -> (Option<u16>, u16) {
        (self.manufacturer_code, self.code)
    }
}

impl EmissionOrder for CommandDef {
    fn order_key(&self) -> (Option<u16>, u16) {
        (self.manufacturer_code, self.code)
    }
}

impl EmissionOrder for EventDef {
    fn order_key(&self) -> (Option<u16>, u16) {
        (self.manufacturer_code, self.code)
    }
}

/// References to `items` in emission order.
pub fn in_emission_order<T: EmissionOrder>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| item.order_key());
    sorted
}

/// Endpoints by ascending id, ties in declaration order.
pub fn endpoints_by_id(endpoints: &[Endpoint]) -> Vec<&Endpoint> {
    let mut sorted: Vec<&Endpoint> = endpoints.iter().collect();
    sorted.sort_by_key(|e| e.id);
    sorted
}

/// Manufacturer/code composite identifier.
pub fn mei(manufacturer_code: Option<u16>, code: u16) -> u32 {
    (u32::from(manufacturer_code.unwrap_or(0)) << 16) | u32::from(code)
}
