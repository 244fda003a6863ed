//! Library crate for quiz-buzzer-client, the client-side synchronization core of a quiz buzzer
//! room, exposing modules for the replay binary and integration tests.

pub mod config;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
pub mod transport;
