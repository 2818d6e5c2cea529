//! Client-level test suites run against a fake simulator socket.

mod support;
