//! In-memory tables, their schema descriptors and the relational store they
//! are materialized into.

pub mod column;
pub mod period;
pub mod schema;
pub mod store;
pub mod table;
