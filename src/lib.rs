pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::{CliConfig, Command};

pub use crate::app::{shell::Shell, App, Screen};
pub use crate::config::{ClientSettings, LogFormat};
pub use crate::core::{
    http::HttpGradingApi,
    session::{decode_token, FileSessionStore, MemorySessionStore, Session},
};
pub use crate::domain::model::{Claims, Grade, NewGrade, NewUser, Role, User};
pub use crate::domain::ports::{GradingApi, SessionStore};
pub use crate::utils::error::{GradebookError, Result};
