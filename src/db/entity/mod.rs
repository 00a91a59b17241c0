pub mod account;
pub mod alert;

pub use account::Entity as Account;
pub use alert::Entity as Alert;
