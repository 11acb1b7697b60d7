//! The host dataflow graph the inference passes run over.
//! Inference only ever adds to it: borrow, lifetime-termination and drop nodes.

pub mod dfir_graph;
pub mod dfir_nodes;
pub mod signatures;
pub mod visit_order;

#[cfg(test)]
mod tests;
