pub mod fetcher;
pub mod normalizer;

pub use fetcher::*;
pub use normalizer::*;
