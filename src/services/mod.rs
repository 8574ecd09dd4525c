// Author: Dustin Pilgrim
// License: MIT

pub mod host;
pub mod records;
pub mod storage;
pub mod ticker;
pub mod viewer;
