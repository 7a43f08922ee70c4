pub mod udp_listener;
pub mod udp_sink;
