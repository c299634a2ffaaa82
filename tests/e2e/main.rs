//! End-to-end tests: build an index from a store, serve it over TCP and
//! query it through the client.

#[path = "../common/mod.rs"]
mod common;

mod engine_workflow;
mod index_build;
