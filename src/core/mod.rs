pub mod auth;
pub mod distribution;
pub mod error;
pub mod launch;
pub mod manifest;
pub mod maven;
pub mod os;
pub mod services;
pub mod session;
pub mod settings;
pub mod version;
