//! HTTP API for the relgraph relatedness engine

pub mod rest;

pub use rest::{ApiState, RestApi};
