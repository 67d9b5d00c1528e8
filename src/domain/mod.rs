// Domain layer: data model and ports. Nothing here spawns processes.

pub mod model;
pub mod ports;
