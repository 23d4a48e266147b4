#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Orchestration for the `heatwave` command line tool.
//!
//! [`pipeline`] wires the table files under a [`heatwave_tabular::DataLayout`]
//! to the climatology, detection, and risk stages. [`commands`] and
//! [`interactive`] are the two front ends over it, and [`report`] renders
//! the scored forecast for the terminal.

pub mod commands;
pub mod interactive;
pub mod pipeline;
pub mod report;
