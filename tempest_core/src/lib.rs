//! Search and evaluation core for a pocket/stack chess variant.
//!
//! The variant plays on an 8x8 board with a pool of fairy pieces, per-piece
//! move/stun resource stacks, per-side pockets that pieces can be dropped
//! from, and an explicit succession action that crowns a new royal. The
//! `logic` module holds the rules layer (board, piece specs, move
//! generation); the `engine` module holds the bot (alpha-beta search with a
//! transposition table, two evaluators, iterative deepening with aspiration
//! windows).

pub mod engine;
pub mod logic;
