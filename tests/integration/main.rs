//! Integration tests for bucket-relay.
//!
//! These tests require LocalStack to be running. They are marked as `#[ignore]`
//! by default to avoid running them in CI without proper setup.
//!
//! ## Running Integration Tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run --rm -d -p 4566:4566 -e SERVICES=s3 localstack/localstack
//!    ```
//!
//! 2. Run the integration tests:
//!    ```bash
//!    AWS_ACCESS_KEY_ID=test AWS_SECRET_ACCESS_KEY=test \
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 \
//!        cargo test -p integration-tests -- --ignored
//!    ```

#[cfg(test)]
mod common;
#[cfg(test)]
mod relay_test;
