// Domain layer: request/response models and the ports the fetcher is built against.

pub mod model;
pub mod ports;
