//! Integration tests against a live router and an in-memory database

mod api_tests;
mod common;
mod lending_tests;
