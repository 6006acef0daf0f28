//! Infrastructure layer: wire formats and concrete collaborators.

pub mod dto;
pub mod registry;
pub mod repository;
