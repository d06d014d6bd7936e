//! Wire formats exchanged with the external executable

pub mod request;
pub mod response;

pub use request::InvocationRequest;
pub use response::{InvocationResult, decode_output};
