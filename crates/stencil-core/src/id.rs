use uuid::Uuid;

/// Generates time-based (version 1) UUIDs for new templates.
///
/// The node id is fixed for the lifetime of the generator. [`IdGenerator::random`]
/// picks one per process, since there is no meaningful MAC address to use.
#[derive(Debug, Clone, Copy)]
pub struct IdGenerator {
    node_id: [u8; 6],
}

impl IdGenerator {
    pub fn random() -> Self {
        let seed = Uuid::new_v4();
        let mut node_id = [0u8; 6];
        node_id.copy_from_slice(&seed.as_bytes()[..6]);
        // Multicast bit marks the node id as not derived from a MAC (RFC 4122 §4.5).
        node_id[0] |= 0x01;
        Self { node_id }
    }

    pub fn with_node_id(node_id: [u8; 6]) -> Self {
        Self { node_id }
    }

    pub fn node_id(&self) -> [u8; 6] {
        self.node_id
    }

    pub fn next_id(&self) -> String {
        Uuid::now_v1(&self.node_id).to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::random()
    }
}
