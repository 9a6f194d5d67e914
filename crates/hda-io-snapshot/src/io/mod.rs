pub mod audio;
pub mod state;
