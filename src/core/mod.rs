//! Core building blocks: scratch pools, parameters, the inference seam and the
//! processing stages. These are consumed by the high-level `api` module.
pub mod engine;
pub mod params;
pub mod pool;
pub mod processing;
