pub mod datagram_sink;
pub mod network_emitter;
pub mod wire_message;
