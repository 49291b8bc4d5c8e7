//! Scanning and reporting behind the `typedb` binary.
//!
//! The binary (`src/main.rs`) only parses arguments and prints; the pieces it drives live here
//! so they can be unit tested without spawning a process.

pub mod report;
pub mod scan;
