//! Price estimation, community tips and snapshot range planning for ArDrive
//! uploads behind a small command line.

pub mod cli;
mod run;

pub use self::run::{run, start};
