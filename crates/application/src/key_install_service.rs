//! Key provisioning for running jobs.
//!
//! Looks up private key material in the job's secret set and hands it to
//! the worker runtime for installation on disk. A failed install is
//! reported once; nothing is retried.

mod ports;
mod service;


pub use ports::{InstalledKey, KeyInstaller};
pub use service::{KeyInstallRequest, KeyInstallService};
