//! Core business logic - storage-agnostic fare, transaction, feedback and account operations.
//!
//! Every public operation takes the [`Gateway`](crate::gateway::Gateway) by reference and runs
//! as one atomic unit through it, joining the caller's explicit transaction when one is open.

/// Users and their role profiles
pub mod account;
/// Vehicles and crew assignments
pub mod assignment;
/// Fare resolution by route and passenger category
pub mod fare;
/// Commuter feedback on drivers and conductors
pub mod feedback;
/// Route and fare catalogue
pub mod route;
/// Seeding the route network from configuration
pub mod seed;
/// Fare collection records
pub mod transaction;
