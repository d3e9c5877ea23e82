//! Integration tests
//!
//! End-to-end pipeline runs over scripted providers: no network, no model
//! calls, real driver and parser code paths.

mod pipeline_test;
