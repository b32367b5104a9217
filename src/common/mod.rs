pub mod response;
pub mod status;

pub use response::{ErrorResponse, InternalCallSubError, SubError, ValidationSubError};
pub use status::HttpStatus;
