//! # ttt-receiver: Game Observer
//!
//! Runs next to the switch. Every poll captures the frames headed to
//! the game peer, renders the newest board and prints how the game
//! stands. Missing or unreadable frames are reported and polling goes
//! on until Ctrl-C.

pub mod console;
