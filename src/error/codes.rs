#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArguments = 2,
    DirectoryNotFound = 3,
    CapacityExceeded = 4,
    ConfirmationDeclined = 5,
    CleanupError = 6,
    PermissionError = 7,
    InconsistentState = 8,
    RenameError = 9,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}
