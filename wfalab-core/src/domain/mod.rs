//! Domain types for WFALab

pub mod bar;
pub mod params;
pub mod signal;
pub mod trade;

pub use bar::{compare_time, Bar, BarTime};
pub use params::{merge_params, round3, ParameterSet};
pub use signal::{Signal, SignalSide};
pub use trade::Trade;
