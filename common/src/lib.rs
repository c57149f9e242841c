mod buffer2;

pub mod cancel;
pub mod file_utils;
pub mod log_setup;
pub mod parallel;
pub mod test_utils;

pub use buffer2::Buffer2;
pub use cancel::CancelToken;
