// Core modules binding the rdb engine: raw FFI, buffers, status codes, and the handle.
pub(crate) mod bridge;
pub mod buffer;
pub mod database;
pub mod error;
pub(crate) mod native;
pub mod status;
