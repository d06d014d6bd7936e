//! I/O boundary: the parameter file on disk and the external executable

pub mod parameter_file;
pub mod process;

pub use parameter_file::read_parameter_file;
pub use process::{Invoker, ProcessInvoker};
