//! Challenge content: domain types, hint files and the directory accessor.

pub mod hints_file;
pub mod repository;
pub mod types;

pub use hints_file::{parse_hints, read_hints_file, render_hints};
pub use repository::{stage_number, ChallengeRepository};
pub use types::{
    Hint, PreviousStageSolution, ReferenceExample, StageBundle, StageKind, FALLBACK_HINT_TITLES,
};
