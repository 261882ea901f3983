//! Clinical calculators engine
//!
//! This crate exposes independently authored clinical calculators through an
//! HTTP API, a command-line interface and direct library calls. Every surface
//! goes through the same dispatcher, so inputs are validated and responses
//! shaped identically wherever a calculation is requested.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let response = clinical_calculators::dispatch(
//!     "dcct_ifcc",
//!     &json!({"input_unit": "dcct", "value": 7.0}),
//! )
//! .unwrap();
//!
//! assert_eq!(response.result, json!(53.01));
//! assert_eq!(response.working["formula"], "IFCC = (DCCT - 2.15) × 10.929");
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod calculators;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;

pub use engine::dispatch;
