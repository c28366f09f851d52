pub mod graph_config;
pub mod graph_error;
pub mod hand_tracking_graph;
pub mod packet;
