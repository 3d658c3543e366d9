use crate::app::{App, Screen};
use crate::domain::model::{Role, SUBJECTS};
use crate::utils::error::Result;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

const HELP: &str = "\
Commands:
  open <n> | <n>   open entry n of the list
  back             go back / cancel
  retry            load the current screen again
  new              open the form of this screen
  logout           log out
  help             show this text
  quit             leave the shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open(usize),
    Back,
    Retry,
    New,
    Logout,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words.next().unwrap_or("").to_ascii_lowercase();
        let command = match head.as_str() {
            "open" | "o" => {
                let n = words.next().ok_or("usage: open <n>")?;
                Command::Open(n.parse().map_err(|_| format!("'{}' is not a number", n))?)
            }
            "back" | "b" | "cancel" => Command::Back,
            "retry" | "r" => Command::Retry,
            "new" | "n" | "create" => Command::New,
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            n if n.parse::<usize>().is_ok() => Command::Open(n.parse().unwrap_or(0)),
            "" => return Err("type 'help' for commands".to_string()),
            other => return Err(format!("unknown command '{}', type 'help'", other)),
        };
        if words.next().is_some() {
            return Err(format!("too many arguments for '{}'", head));
        }
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Login,
    GradeForm,
    UserForm,
    Browse,
}

impl Mode {
    fn of(screen: &Screen) -> Self {
        match screen {
            Screen::Login => Mode::Login,
            Screen::StudentDetails {
                grade_form: Some(_),
                ..
            } => Mode::GradeForm,
            Screen::CreateUser(_) => Mode::UserForm,
            _ => Mode::Browse,
        }
    }
}

/// Line-oriented front-end over stdin/stdout (or any async reader/writer).
pub struct Shell<R, W> {
    app: App,
    lines: Lines<R>,
    out: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(app: App, input: R, out: W) -> Self {
        Self {
            app,
            lines: input.lines(),
            out,
        }
    }

    /// Runs until `quit` or end of input and hands the app back.
    pub async fn run(mut self) -> Result<(App, W)> {
        self.app.start().await;
        loop {
            let keep_going = match Mode::of(self.app.screen()) {
                Mode::Login => self.login_prompt().await?,
                Mode::GradeForm => {
                    self.show_screen().await?;
                    self.grade_prompt().await?
                }
                Mode::UserForm => self.user_prompt().await?,
                Mode::Browse => {
                    self.show_screen().await?;
                    self.command_prompt().await?
                }
            };
            if !keep_going {
                break;
            }
        }
        tracing::debug!("Shell finished");
        Ok((self.app, self.out))
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            self.out.write_all(b"\n").await?;
        }
        self.out.flush().await?;
        Ok(())
    }

    /// `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }

    async fn show_screen(&mut self) -> Result<()> {
        if let Some(notice) = self.app.take_notice() {
            self.say(&format!("* {}", notice)).await?;
        }
        let rendered = self.app.render();
        self.say(&rendered).await
    }

    async fn login_prompt(&mut self) -> Result<bool> {
        self.say("== Login ==").await?;
        let Some(email) = self.ask("Email: ").await? else {
            return Ok(false);
        };
        if email.eq_ignore_ascii_case("quit") {
            return Ok(false);
        }
        let Some(password) = self.ask("Password: ").await? else {
            return Ok(false);
        };
        if let Err(e) = self.app.login(&email, &password).await {
            self.say(&format!("Error: {}", e.user_friendly_message())).await?;
        }
        Ok(true)
    }

    async fn command_prompt(&mut self) -> Result<bool> {
        let Some(line) = self.ask("> ").await? else {
            return Ok(false);
        };
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                self.say(&message).await?;
                return Ok(true);
            }
        };

        let outcome = match command {
            Command::Open(n) => self.app.open(n).await,
            Command::Back => {
                self.app.back().await;
                Ok(())
            }
            Command::Retry => {
                self.app.retry().await;
                Ok(())
            }
            Command::New => self.app.open_form(),
            Command::Logout => self.app.logout(),
            Command::Help => {
                self.say(HELP).await?;
                Ok(())
            }
            Command::Quit => return Ok(false),
        };
        if let Err(e) = outcome {
            self.say(&format!("Error: {}", e.user_friendly_message())).await?;
        }
        Ok(true)
    }

    /// 空白輸入視為取消
    async fn grade_prompt(&mut self) -> Result<bool> {
        let Some(value) = self.ask("Grade Value (0-100, empty to cancel): ").await? else {
            return Ok(false);
        };
        if value.is_empty() {
            self.app.back().await;
            return Ok(true);
        }
        if let Some(form) = self.app.grade_form_mut() {
            form.set_value(value);
        }
        // 失敗訊息會留在表單上，下一輪畫面會顯示
        let _ = self.app.submit_form().await;
        Ok(true)
    }

    async fn user_prompt(&mut self) -> Result<bool> {
        self.show_screen().await?;
        let Some(email) = self.ask("Email (empty to cancel): ").await? else {
            return Ok(false);
        };
        if email.is_empty() {
            self.app.back().await;
            return Ok(true);
        }
        let Some(password) = self.ask("Password: ").await? else {
            return Ok(false);
        };
        let Some(first_name) = self.ask("First Name: ").await? else {
            return Ok(false);
        };
        let Some(last_name) = self.ask("Last Name: ").await? else {
            return Ok(false);
        };
        let Some(role) = self.ask("Role (STUDENT, PARENT, TEACHER): ").await? else {
            return Ok(false);
        };
        let role = Role::from_str(&role).ok();

        let api = self.app.api();
        if let Some(form) = self.app.user_form_mut() {
            form.email = email;
            form.password = password;
            form.first_name = first_name;
            form.last_name = last_name;
            form.choose_role(role, api.as_ref()).await;
        }

        match role {
            Some(Role::Student) => {
                let parents = self
                    .app
                    .user_form_mut()
                    .map(|f| f.parents().to_vec())
                    .unwrap_or_default();
                if parents.is_empty() {
                    self.say("No parents available").await?;
                }
                let listing: String = parents
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{:>3}. {} ({})\n", i + 1, p.full_name(), p.email))
                    .collect();
                self.say(&listing).await?;
                let Some(choice) = self.ask("Parent number: ").await? else {
                    return Ok(false);
                };
                let parent_id = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| parents.get(i))
                    .map(|p| p.id);
                if let Some(form) = self.app.user_form_mut() {
                    form.set_parent(parent_id);
                }
            }
            Some(Role::Teacher) => {
                self.say(&format!("Subjects: {}", SUBJECTS.join(", "))).await?;
                let Some(subject) = self.ask("Subject: ").await? else {
                    return Ok(false);
                };
                let subject = SUBJECTS
                    .iter()
                    .find(|s| s.eq_ignore_ascii_case(&subject))
                    .map(|s| s.to_string())
                    .or(Some(subject));
                if let Some(form) = self.app.user_form_mut() {
                    form.set_subject(subject);
                }
            }
            _ => {}
        }

        let _ = self.app.submit_form().await;
        Ok(true)
    }
}
