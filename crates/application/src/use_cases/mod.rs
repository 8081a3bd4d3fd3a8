pub mod locate_dc;

pub use locate_dc::{LocateDcUseCase, LocateOptions, LocateRequest};
