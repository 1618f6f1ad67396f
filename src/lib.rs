//! Frequency-sweep combiner and viewer.
//!
//! The data layer is shared by the `combine_freq` batch tool and the
//! `freqview` egui viewer.

pub mod config;
pub mod data;
