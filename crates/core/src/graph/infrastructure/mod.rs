pub mod threaded_graph;
