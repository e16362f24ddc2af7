//! Core domain types and logic.

pub mod account;
pub mod aligned;
pub mod backtest;
pub mod batch;
pub mod candle;
pub mod condition;
pub mod condition_eval;
pub mod config_validation;
pub mod consensus;
pub mod dsl_parser;
pub mod error;
pub mod history;
pub mod indicator;
pub mod indicator_adapter;
pub mod metrics;
pub mod position;
pub mod report;
pub mod signal;
pub mod strategy;
