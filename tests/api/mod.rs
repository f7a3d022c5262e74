//! REST API endpoint tests

mod auth_tests;
mod health_tests;
mod services_tests;
