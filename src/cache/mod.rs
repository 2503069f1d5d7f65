pub mod credential;
pub mod token_cache;
