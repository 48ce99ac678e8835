//! Heading classification and section extraction, shared by the note and
//! report paths.

pub mod classify;
pub mod extract;
pub mod tables;

pub use classify::*;
pub use extract::*;
pub use tables::*;
