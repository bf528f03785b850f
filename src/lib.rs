//! Core library for the notion-sheets command line application.
//!
//! The library synchronises tabular data with Notion databases in both
//! directions. The modules are structured to keep responsibilities narrow
//! and composable: wire value objects live under [`model`] and [`blocks`],
//! the property schema in [`schema`], property translation in [`values`],
//! the tabular representation in [`frame`], workbook adapters under [`io`],
//! the REST client in [`client`], and the load/upload orchestration under
//! [`sync`].

pub mod blocks;
pub mod client;
pub mod error;
pub mod frame;
pub mod io;
pub mod model;
pub mod schema;
pub mod sync;
pub mod values;

pub use error::{Result, SyncError};
