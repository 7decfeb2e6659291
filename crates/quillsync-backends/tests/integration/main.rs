//! Integration tests for the HTTP-based backends
//!
//! Uses wiremock to simulate a WebDAV server and the Cloud Files API
//! and verifies end-to-end adapter behavior including error mapping
//! and throttle retries.

mod common;

mod test_cloudfiles;
mod test_webdav;
