//! Research datamodel
//!
//! Schema graph registry and dependency scanner for a research project
//! store: the tables and their foreign keys as a weighted graph, cheapest
//! join paths between tables, and scan plans that select every row hanging
//! off one partition or project.

pub mod collections;
pub mod config;
pub mod datamodel;
pub mod db;
pub mod duplication;
pub mod error;
pub mod graph;
pub mod models;
pub mod routes;
pub mod state;

pub use datamodel::{Datamodel, DatamodelError};
pub use duplication::{DependencyScanner, DuplicationPolicy, PartitionModelDuplicator, ScanPlan};
pub use graph::Graph;
