//! Standard exit codes (BSD sysexits.h compatible)

/// Some items of a batch operation failed
pub const FAILURE: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error
pub const DATAERR: i32 = 65;

/// Cannot open input (record not found)
pub const NOINPUT: i32 = 66;

/// Addressee unknown (user not found)
pub const NOUSER: i32 = 67;

/// Service unavailable (component disabled)
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Permission denied
pub const NOPERM: i32 = 77;

/// Configuration error
pub const CONFIG: i32 = 78;
