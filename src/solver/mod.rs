//! IRWLS solvers and the linear-system boundary

pub mod budgeted;
pub mod irwls;
pub mod linear_system;

pub use budgeted::{BudgetedOutcome, BudgetedSolver};
pub use irwls::IrwlsSolver;
pub use linear_system::{CholeskySolver, LinearSystemSolver};
