//! jobdex - skill-keyed inverted index over job posting records.
//!
//! The [`index`] module builds a compressed skill → record-offset index from
//! a delimited record store; [`query`] answers conjunctive skill queries
//! against it; [`server`] and [`client`] put that behind a small framed TCP
//! protocol.

pub mod app;
pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod launcher;
pub mod query;
pub mod server;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use error::{JobdexError, Result};
