//! Motor de MetaLens: detección, inspección y limpieza de metadata sensible.

pub mod backends;
pub mod cli;
pub mod commands;
pub mod detect;
pub mod formatting;
pub mod fsutil;
pub mod hashing;
pub mod model;
pub mod policy;
pub mod report;
pub mod risk;
pub mod sanitize;
pub mod ui;
