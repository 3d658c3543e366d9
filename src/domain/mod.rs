// Domain layer: DTOs and ports. No HTTP or filesystem code here.

pub mod model;
pub mod ports;
