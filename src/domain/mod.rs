// Domain layer: protocol models and ports (interfaces).

pub mod model;
pub mod ports;
