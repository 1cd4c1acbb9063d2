//! # cgmes-sim: State Projection and Measurement Synthesis
//!
//! Turns solved network state into CGMES triples:
//!
//! - [`SvProfileBuilder`] projects a solved result into `SvVoltage` objects
//!   (state-variables profile) with the mandatory model header.
//! - [`PowerMeasurementBuilder`] synthesizes `Analog`/`AnalogValue`
//!   measurement pairs from `SvPowerFlow` results, with limits from a
//!   voltage-bracketed range table and reproducible gaussian noise.
//!
//! Both builders write through the [`cgmes_core::TripleStore`] capability,
//! so tests run against the in-memory store.

pub mod power;
pub mod ranges;
pub mod state;
pub mod sv_builder;

pub use power::{
    fetch_sv_power_rows, MeasurementBuildReport, MeasurementSource, PowerMeasurementBuilder,
    SvPowerRow, MEAS_TIMESTAMP,
};
pub use ranges::{MeasurementRange, MeasurementRangeSet, RangeBracket};
pub use state::{NodeResult, SolvedState, TopologyMap};
pub use sv_builder::{SvBuildReport, SvProfileBuilder};
