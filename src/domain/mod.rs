// Domain layer: run data and ports (interfaces). Only std/serde here.

pub mod model;
pub mod ports;
