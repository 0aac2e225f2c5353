pub mod backend;
pub mod cdp;
mod eval;
