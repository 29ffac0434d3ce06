/// Process-tunable knobs for a [`MountRegistry`](crate::MountRegistry).
///
/// Constructed once by the caller and passed by value; nothing in this
/// crate reads an environment variable or process-global for these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Size, in bytes, of the scratch buffer reused for every RPC message on
    /// a mount. Bounds the largest message (and so the largest single READ
    /// or WRITE chunk) the client can exchange.
    pub buffer_size: usize,

    /// The first local UDP source port handed out to a mount; the registry
    /// increments this per successful mount.
    pub client_port_base: u16,

    /// The remote portmapper port (almost always 111).
    pub portmapper_port: u16,

    /// Number of retransmits attempted per RPC call before failing with
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub udp_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8192,
            client_port_base: 600,
            portmapper_port: 111,
            udp_retries: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.buffer_size, 8192);
        assert_eq!(c.client_port_base, 600);
        assert_eq!(c.portmapper_port, 111);
        assert_eq!(c.udp_retries, 2);
    }
}
