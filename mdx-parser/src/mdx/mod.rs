//! Main module for MDX library functionality

pub mod ast;
pub mod lexing;
pub mod parsing;
