//! Common utilities for integration tests.
//!
//! Shared LocalStack setup for S3 buckets and objects.

pub mod localstack;

pub use localstack::{LocalStackTestContext, MemoryAudit};
