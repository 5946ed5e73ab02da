pub mod trending_cycle;
