pub mod enrichment;
pub mod exclusions;
pub mod normalizer;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod resolver;
pub mod seeds;
