//! Navigation state — the session gate and the screen state machine.

pub mod gate;
pub mod screen;

pub use gate::Gate;
pub use screen::{DetailOrigin, Flow, Screen};
