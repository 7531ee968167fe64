// Resume optimizer: analysis and cover-letter generation.
// All model calls run through crate::resilience, no retry loops here.

pub mod handlers;
pub mod input;
pub mod prompts;
pub mod service;
