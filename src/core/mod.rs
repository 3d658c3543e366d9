pub mod grades;
pub mod http;
pub mod session;

pub use crate::domain::model::{Claims, Grade, NewGrade, NewUser, Role, User};
pub use crate::domain::ports::{GradingApi, SessionStore};
pub use crate::utils::error::Result;
