// Author: Dustin Pilgrim
// License: MIT

pub mod command;
pub mod daemon_mode;
pub mod platform;
