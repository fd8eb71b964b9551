pub mod column;
pub mod guided_nj;
pub mod reconcile;
pub mod score;
