//! Stream multiplexing.
//!
//! [`BlockStream`] turns the producers' handoff channel into an ordinary
//! sequential byte source implementing [`std::io::Read`]. Blocks are served
//! in arrival order, whichever producer finished them; the stream never
//! ends on its own.

mod reader;

pub use reader::BlockStream;
