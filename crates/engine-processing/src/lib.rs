pub mod error;
pub mod fetcher;
pub mod retry;
pub mod transform;
pub mod writer;
