//! Controller layer: session/view state, user actions, reducer transitions, and
//! orchestration of backend calls.

pub mod events;
pub mod orchestration;
pub mod reducer;
pub mod state;
