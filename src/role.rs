/// Which side of the connection is encoding frames.
///
/// Clients must mask every frame they send, servers must never mask.
pub trait EncodePolicy {
    const MASK_OUTGOING: bool;
    /// Short tag used in log lines.
    const TAG: &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct Client;

#[derive(Debug, Clone, Copy)]
pub struct Server;

impl EncodePolicy for Client {
    const MASK_OUTGOING: bool = true;
    const TAG: &'static str = "CLI";
}

impl EncodePolicy for Server {
    const MASK_OUTGOING: bool = false;
    const TAG: &'static str = "SRV";
}
