//! Request handlers.
//!
//! Handlers are thin: they extract the request, call the workflow crate and
//! wrap the result in a [`DataResponse`](crate::response::DataResponse).
//! Errors map through [`AppError`](crate::error::AppError).

pub mod bulk;
pub mod configurations;
pub mod freelancers;
pub mod onboarding;
pub mod platforms;
