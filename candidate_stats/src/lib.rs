mod aggregate;
mod filter;
pub mod manual;
mod table;

pub use crate::aggregate::*;
pub use crate::filter::*;
pub use crate::table::*;

// The names of the columns, after normalization.

pub const PARTY: &str = "Party";
pub const GENDER: &str = "Gender";
pub const DISTRICT: &str = "District";
pub const CONSTITUENCY: &str = "Constituency";
pub const CANDIDATE: &str = "Candidate";
pub const CASES_TOTAL: &str = "Cases Total";
pub const TOTAL_ASSETS: &str = "Total Assets";
pub const AGE: &str = "Age";
pub const EDUCATION: &str = "Education";
