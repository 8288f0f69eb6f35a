//! # ttt-sender: Tic-Tac-Toe Player
//!
//! Reads one move per line from the terminal, sends it to the switch
//! in a ttt frame and prints the board and verdict that come back.
//! Typing `quit` (or closing stdin) ends the session.

pub mod console;
pub mod input;
