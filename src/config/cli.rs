use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "gradebook")]
#[command(about = "Terminal client for the school grading service")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Backend base URL [default: http://localhost:8080]")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Where the login token is kept")]
    pub session_file: Option<String>,

    #[arg(long, global = true, help = "HTTP timeout in seconds")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Defaults to the interactive shell
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Log in and store the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Show the claims of the stored token
    Whoami,
    /// Show your own account
    Profile,
    /// List all students (teacher)
    Students,
    /// Show one student (teacher)
    Student { id: i64 },
    /// List your children (parent)
    Children,
    /// List all parents (admin)
    Parents,
    /// List all users (admin)
    Users,
    /// Show grades grouped by subject
    Grades {
        /// Grades of this student instead of your own
        #[arg(long, conflicts_with_all = ["children", "all"])]
        student: Option<i64>,
        /// Grades of all your children (parent)
        #[arg(long, conflicts_with = "all")]
        children: bool,
        /// Every grade in the system (admin)
        #[arg(long)]
        all: bool,
    },
    /// Create a student, parent or teacher account (admin)
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// STUDENT, PARENT or TEACHER
        #[arg(long)]
        role: String,
        /// Required for students
        #[arg(long)]
        parent_id: Option<i64>,
        /// Required for teachers
        #[arg(long)]
        subject: Option<String>,
    },
    /// Grade a student (teacher)
    CreateGrade {
        #[arg(long)]
        student: i64,
        #[arg(long, allow_hyphen_values = true)]
        value: String,
        /// Defaults to the student's parent
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Interactive session
    Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = CliConfig::try_parse_from([
            "gradebook",
            "grades",
            "--student",
            "10",
            "--base-url",
            "http://localhost:9000",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(
            cli.command,
            Some(Command::Grades {
                student: Some(10),
                children: false,
                all: false
            })
        ));
    }

    #[test]
    fn no_subcommand_means_shell() {
        let cli = CliConfig::try_parse_from(["gradebook", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn grade_filters_conflict() {
        assert!(CliConfig::try_parse_from(["gradebook", "grades", "--children", "--all"]).is_err());
        assert!(
            CliConfig::try_parse_from(["gradebook", "grades", "--student", "1", "--all"]).is_err()
        );
    }
}
