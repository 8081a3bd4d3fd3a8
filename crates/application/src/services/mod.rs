pub mod candidate_directory;

pub use candidate_directory::{CandidateDirectory, CandidateId};
