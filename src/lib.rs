//! Purpose: Safe Rust binding over the rdb key-value engine's C ABI.
//! Exports: `api` (database handle, errors, buffer views) and `core` internals.
//! Role: Library backing the `rdb` CLI and any embedding application.
//! Invariants: All engine calls go through `core::native` (serialized, error slot read under lock).
//! Invariants: Engine-owned bytes are copied before they leave a call or visitor scope.
pub mod api;
pub mod core;
