pub mod network_utils;
pub mod socket_guard;
