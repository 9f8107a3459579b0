// Engine status code table: raw `rdb_last_error` values <-> `ErrorKind`.
use crate::core::error::{Error, ErrorKind};

pub const OK: i32 = 0;
pub const CLOSED: i32 = 1;
pub const UNEXPECTED_EOF: i32 = 2;
pub const UNSEEKABLE: i32 = 50;
pub const BROKEN_PIPE: i32 = 51;
pub const NOT_OPEN_FOR_WRITING: i32 = 52;
pub const LOCK_VIOLATION: i32 = 53;
pub const IS_DIR: i32 = 54;
pub const OUT_OF_MEMORY: i32 = 55;
pub const ACCESS_DENIED: i32 = 56;
pub const UNEXPECTED: i32 = 99;
pub const UNDOCUMENTED: i32 = 100;

/// Translates a raw status code. `0` means no error; unknown codes keep their value.
pub fn translate(code: i32) -> Option<ErrorKind> {
    let kind = match code {
        OK => return None,
        CLOSED => ErrorKind::Closed,
        UNEXPECTED_EOF => ErrorKind::UnexpectedEof,
        UNSEEKABLE => ErrorKind::Unseekable,
        BROKEN_PIPE => ErrorKind::BrokenPipe,
        NOT_OPEN_FOR_WRITING => ErrorKind::NotOpenForWriting,
        LOCK_VIOLATION => ErrorKind::LockViolation,
        IS_DIR => ErrorKind::IsDir,
        OUT_OF_MEMORY => ErrorKind::OutOfMemory,
        ACCESS_DENIED => ErrorKind::AccessDenied,
        UNEXPECTED => ErrorKind::Unexpected,
        other => ErrorKind::Undocumented(other),
    };
    Some(kind)
}

/// Inverse of [`translate`] for the engine kinds; local kinds have no code.
pub fn code_of(kind: ErrorKind) -> Option<i32> {
    let code = match kind {
        ErrorKind::Closed => CLOSED,
        ErrorKind::UnexpectedEof => UNEXPECTED_EOF,
        ErrorKind::Unseekable => UNSEEKABLE,
        ErrorKind::BrokenPipe => BROKEN_PIPE,
        ErrorKind::NotOpenForWriting => NOT_OPEN_FOR_WRITING,
        ErrorKind::LockViolation => LOCK_VIOLATION,
        ErrorKind::IsDir => IS_DIR,
        ErrorKind::OutOfMemory => OUT_OF_MEMORY,
        ErrorKind::AccessDenied => ACCESS_DENIED,
        ErrorKind::Unexpected => UNEXPECTED,
        ErrorKind::Undocumented(code) => code,
        ErrorKind::NotFound | ErrorKind::Busy | ErrorKind::Usage => return None,
    };
    Some(code)
}

/// Builds a structured error for a non-zero status code.
pub fn error_from_code(code: i32) -> Option<Error> {
    translate(code).map(|kind| Error::new(kind).with_code(code))
}

#[cfg(test)]
mod tests {
    use super::{code_of, error_from_code, translate};
    use crate::core::error::ErrorKind;

    #[test]
    fn code_table_is_exact() {
        let cases = [
            (1, ErrorKind::Closed),
            (2, ErrorKind::UnexpectedEof),
            (50, ErrorKind::Unseekable),
            (51, ErrorKind::BrokenPipe),
            (52, ErrorKind::NotOpenForWriting),
            (53, ErrorKind::LockViolation),
            (54, ErrorKind::IsDir),
            (55, ErrorKind::OutOfMemory),
            (56, ErrorKind::AccessDenied),
            (99, ErrorKind::Unexpected),
            (100, ErrorKind::Undocumented(100)),
        ];

        for (code, kind) in cases {
            assert_eq!(translate(code), Some(kind), "code {code}");
            assert_eq!(code_of(kind), Some(code));
        }
    }

    #[test]
    fn zero_is_no_error() {
        assert_eq!(translate(0), None);
        assert!(error_from_code(0).is_none());
    }

    #[test]
    fn unknown_codes_keep_raw_value() {
        for code in [3, 49, 57, 98, 101, -1, i32::MAX, i32::MIN] {
            assert_eq!(translate(code), Some(ErrorKind::Undocumented(code)));
        }
    }

    #[test]
    fn error_from_code_records_raw_code() {
        let err = error_from_code(53).expect("error");
        assert_eq!(err.kind(), ErrorKind::LockViolation);
        assert_eq!(err.code(), Some(53));
    }

    #[test]
    fn local_kinds_have_no_code() {
        assert_eq!(code_of(ErrorKind::NotFound), None);
        assert_eq!(code_of(ErrorKind::Busy), None);
        assert_eq!(code_of(ErrorKind::Usage), None);
    }
}
