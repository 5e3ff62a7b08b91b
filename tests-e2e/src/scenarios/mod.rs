pub mod concurrent_packets;
pub mod funding;
pub mod misbehaviour;
