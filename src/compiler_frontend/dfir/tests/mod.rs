mod dfir_graph_tests;
