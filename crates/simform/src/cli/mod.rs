//! CLI module for Simform
//!
//! `check` inspects a schema, `edit` drives the form engine headlessly,
//! `config` shows where things live.

pub mod check;
pub mod config;
pub mod edit;
pub mod error;
pub mod output;
