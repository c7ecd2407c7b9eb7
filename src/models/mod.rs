mod candidate;
mod product;

pub use candidate::{Candidate, MatchScore, Source, Tier};
pub use product::{format_price, ProductRecord, UNKNOWN_BRAND};
