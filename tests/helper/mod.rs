#![allow(dead_code)]

pub mod checker;

pub use checker::*;
