/// Domain interface for fire-and-forget datagram delivery.
///
/// No acknowledgment, no retry: an `Err` only means this datagram was lost.
pub trait DatagramSink: Send {
    fn send(&mut self, payload: &[u8]) -> std::io::Result<()>;

    /// Human-readable destination, for logs.
    fn destination(&self) -> String;
}
