//! Typed data-access layer for the career data model: per-entity CRUD,
//! structured filters, aggregation and group-by over PostgreSQL.

pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod query;
pub mod repos;

pub use client::Client;
pub use config::Config;
pub use errors::{StoreError, StoreResult};
pub use query::{
    AggregateResult, AggregateSpec, Direction, Filter, GroupByRow, ListQuery, Scalar, Sort,
};
