//! Jenkins build-server client for Relay.

pub mod jenkins;

pub use jenkins::{JenkinsClient, JenkinsConfig};
