//! Token secrets and the session-owned token state.

pub mod secret;
pub mod state;
