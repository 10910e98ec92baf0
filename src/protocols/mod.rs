//! Wire protocol codecs.
//!
//! Each tier speaks its own newline-terminated ASCII text format:
//!
//! - `game`: colon-delimited commands between clients and the game host
//! - `lifeline`: dash-delimited requests between the game host and the
//!   lifeline service

pub mod game;
pub mod lifeline;
