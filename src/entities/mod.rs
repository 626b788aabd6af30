//! Entity module - Contains all SeaORM entity definitions for the database.
//! Column and table names mirror the existing `transport_app.db` layout exactly.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admin;
pub mod commuter;
pub mod conductor;
pub mod driver;
pub mod fare;
pub mod feedback;
pub mod route;
pub mod route_view;
pub mod transaction;
pub mod user;
pub mod vehicle;
pub mod vehicle_assignment;

// Re-export specific types to avoid conflicts
pub use admin::{Column as AdminColumn, Entity as Admin, Model as AdminModel};
pub use commuter::{Column as CommuterColumn, Entity as Commuter, Model as CommuterModel};
pub use conductor::{Column as ConductorColumn, Entity as Conductor, Model as ConductorModel};
pub use driver::{Column as DriverColumn, Entity as Driver, Model as DriverModel};
pub use fare::{Column as FareColumn, Entity as Fare, Model as FareModel};
pub use feedback::{Column as FeedbackColumn, Entity as Feedback, Model as FeedbackModel};
pub use route::{Column as RouteColumn, Entity as Route, Model as RouteModel};
pub use route_view::{Entity as RouteView, Model as RouteViewModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserType};
pub use vehicle::{Column as VehicleColumn, Entity as Vehicle, Model as VehicleModel};
pub use vehicle_assignment::{
    Column as AssignmentColumn, Entity as VehicleAssignment, Model as AssignmentModel,
};
