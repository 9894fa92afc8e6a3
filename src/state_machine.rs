//! Connection state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{session_url, ConnContext, ConnState, Status};
pub use transition::{frame_effects, transition, TransitionError, TransitionResult};
