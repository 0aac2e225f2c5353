pub mod answers;
pub mod autofill;
pub mod backend;
pub mod config;
pub mod error;
pub mod jobs;
pub mod launcher;
pub mod login;
pub mod monitor;
pub mod outcome;
pub mod outcome_log;
pub mod runner;
pub mod selector;
pub mod session;
pub mod workflow;
