//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one part of the stack
//! through the public API against in-memory outputs and transports.  All
//! tests run on the host with no serial hardware required.

mod dispatch_tests;
mod mock_output;
mod server_tests;
mod streaming_tests;
