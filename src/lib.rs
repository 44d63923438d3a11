//! Back-office services for a small shop with a read-through, write-invalidate
//! entity cache in front of the relational store.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
