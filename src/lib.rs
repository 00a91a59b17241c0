pub mod config;
pub mod enums;
pub mod error;
pub mod db;
pub mod uniswap;
pub mod notify;
pub mod evaluator;
pub mod services;
pub mod api;

pub use config::Config;
pub use enums::{ AlertKind, AlertOp, AlertStatus };
pub use error::{ AppError, Result };
