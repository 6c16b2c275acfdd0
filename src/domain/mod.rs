// Domain layer: patient record, feature contract and ports. No external dependencies beyond std/serde.

pub mod contract;
pub mod model;
pub mod ports;
