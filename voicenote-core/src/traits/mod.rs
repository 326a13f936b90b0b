pub mod analysis_backend;
pub mod assistant_client;
pub mod capture_backend;
pub mod recorder_delegate;
