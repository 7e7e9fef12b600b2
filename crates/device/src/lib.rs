//! Robot device client for roverctl.
//!
//! Issues HTTP GET requests against the robot's REST API (`/api/motor/*`,
//! `/api/camera/photo`, `/api/status`) and turns camera bytes into rotated,
//! archived, base64-encoded photo artifacts.
//!
//! The robot address is injected at construction and never mutated — there
//! is no process-wide device state.

pub mod client;
pub mod photo;

pub use client::{DeviceClient, DeviceStatus, DeviceTransport, HttpTransport, TransportError, TransportResponse};
pub use photo::Photo;
