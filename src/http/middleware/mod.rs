pub mod edge_gate;
pub mod metrics;

pub use edge_gate::edge_gate_middleware;
pub use metrics::track_metrics;
