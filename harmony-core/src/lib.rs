//! Harmony Core
//!
//! Core types shared by the Harmony analysis client crates.
//!
//! This crate contains:
//! - Domain types: the channel a job is scoped to, commands, job state and observations
//! - DTOs: wire payloads exchanged with the analysis server

pub mod domain;
pub mod dto;
