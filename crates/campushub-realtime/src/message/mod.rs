//! Message persistence and fan-out.

pub mod fanout;

pub use fanout::FanoutEngine;
