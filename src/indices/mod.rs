pub mod quad_tree;
