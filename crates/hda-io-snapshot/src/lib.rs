//! Deterministic snapshot encoding for the HD Audio codec device.

pub mod io;
