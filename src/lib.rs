//! Replay a CSV or JSON file as if it were a live feed.
//!
//! The file is loaded once when the simulator is built. A run then hands the
//! rows to a callback in fixed-size windows, sleeping a fixed lapse before
//! each window:
//!
//! ```no_run
//! use dataming::{CsvOptions, OutputShape, SimulatorConfig, StreamingSimulator};
//!
//! let config = SimulatorConfig::new()
//!     .with_lapse(0.5)
//!     .with_data_window(10)
//!     .with_response_type(OutputShape::ArrayDict);
//! let sim = StreamingSimulator::csv("readings.csv", &config, &CsvOptions::default())?;
//!
//! sim.simulate(|window| {
//!     for record in window {
//!         println!("{record}");
//!     }
//! });
//! # Ok::<(), dataming::SimulatorError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod simulator;

pub use config::{CsvOptions, JsonOptions, OutputShape, SimulatorConfig, SourceFormat};
pub use data::model::{format_window, Dataset, Fields, Record, Row, Value};
pub use error::{Result, SimulatorError};
pub use simulator::StreamingSimulator;
