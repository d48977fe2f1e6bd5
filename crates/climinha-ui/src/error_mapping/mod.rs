//! Maps UI service errors to climinha_core::AppError for consistent user-facing messages.

mod weather;
