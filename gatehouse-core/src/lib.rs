//! Gatehouse Core
//!
//! Core types and abstractions for the Gatehouse policy gateway.
//!
//! This crate contains:
//! - Domain types: Core business entities (Credential, Tunnel, PipelineRun)
//! - DTOs: Data transfer objects for the gateway HTTP API

pub mod domain;
pub mod dto;
