//! Compiles declarative mail filter rules into criteria trees a restricted
//! downstream filter system can express.

pub mod ast;
pub mod compiler;
pub mod config;
pub mod parser;
pub mod pretty;
pub mod simplify;
