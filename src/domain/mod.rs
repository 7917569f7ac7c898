//! Domain types and the ports through which external collaborators are reached.

pub mod notification;
pub mod params;
pub mod ports;
pub mod request;
pub mod response;
