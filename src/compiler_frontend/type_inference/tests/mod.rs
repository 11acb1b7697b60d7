
mod auto_borrow_tests;
mod facade_tests;
mod lifetime_graph_tests;
mod variable_store_tests;
