pub mod family_tree;
