//! Slotspire simulation core: weighted reels, manual spin sessions, win
//! evaluation, heat, and the round → fight → run loop.

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod fight;
pub mod heat;
pub mod machine;
pub mod modifiers;
pub mod port;
pub mod reel;
pub mod rng;
pub mod round;
pub mod run;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod strip;
pub mod timer;
pub mod types;
pub mod validation;
