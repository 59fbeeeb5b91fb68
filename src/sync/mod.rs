pub mod google_api;
pub mod google_auth;
pub mod loopback_flow;
