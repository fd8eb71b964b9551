pub mod hal;
pub mod phylo;
pub mod similarity;
