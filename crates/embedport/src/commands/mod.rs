//! CLI command implementations for embedport

mod common;
mod export;
mod inspect;
mod verify;

pub use export::export;
pub use inspect::inspect;
pub use verify::verify;
