/// Comparing the original and updated checksums of tracked configuration files.
pub mod checksum;
/// Reading the stack manifest and finding the services mounting a configuration.
pub mod manifest;
/// Asking the control endpoint to restart a service.
pub mod restart;
