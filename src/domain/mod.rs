// Domain layer: contract traits and wire models. No transport or runtime concerns here.

pub mod model;
pub mod ports;
