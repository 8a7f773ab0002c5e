// Domain layer: core models and ports (interfaces) shared by the pipeline stages and adapters.

pub mod model;
pub mod ports;
