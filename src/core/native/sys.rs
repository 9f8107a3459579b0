// Raw FFI bindings to the rdb engine (`native/rdb.h`).
use std::os::raw::{c_char, c_void};

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RdbBytes {
    pub ptr: *mut c_char,
    pub len: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RdbOpenResult {
    pub database: *mut c_void,
    pub error: *mut c_char,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RdbOptionalBytes {
    pub bytes: RdbBytes,
    pub valid: bool,
}

pub type RdbForeachFn =
    unsafe extern "C" fn(context: *mut c_void, key: RdbBytes, value: RdbBytes) -> bool;

unsafe extern "C" {
    pub fn rdb_open(path: RdbBytes) -> RdbOpenResult;

    pub fn rdb_close(db: *mut c_void);

    pub fn rdb_get(db: *mut c_void, key: RdbBytes) -> RdbOptionalBytes;

    pub fn rdb_set(db: *mut c_void, key: RdbBytes, value: RdbBytes) -> bool;

    pub fn rdb_remove(db: *mut c_void, key: RdbBytes) -> bool;

    pub fn rdb_foreach(db: *mut c_void, context: *mut c_void, callback: RdbForeachFn) -> bool;

    pub fn rdb_last_error() -> i32;

    #[cfg(rdb_bundled)]
    pub fn rdb_fault_inject(db: *mut c_void, code: i32);
}
