//! POSIX shell command construction.
//!
//! Every remote command is a string interpreted by `sh` on the target host.
//! Arguments are quoted here and nowhere else.

/// Characters that never need quoting in a POSIX shell word.
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | ',' | '+' | '=' | '@' | '%')
}

/// Quote `s` as a single shell word.
///
/// Strings made only of safe characters are returned unchanged; everything
/// else is wrapped in single quotes with embedded quotes spliced as `'\''`.
#[must_use]
pub fn quote(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Wrap `command` so it runs with root privileges on the remote host.
///
/// `-n` makes sudo fail instead of prompting; there is no terminal to
/// answer a password prompt.
#[must_use]
pub fn escalate(command: &str) -> String {
    format!("sudo -n sh -c {}", quote(command))
}

/// Builder for one simple command: `[NAME=value ...] program [args ...]`.
#[derive(Debug, Clone, Default)]
pub struct ShellCommand {
    env: Vec<(String, String)>,
    program: String,
    args: Vec<String>,
}

impl ShellCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Add an environment assignment placed before the program.
    ///
    /// `name` is emitted verbatim and must already be a valid identifier.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render to a single shell string with every word quoted as needed.
    #[must_use]
    pub fn render(&self) -> String {
        let mut words: Vec<String> = self
            .env
            .iter()
            .map(|(name, value)| format!("{name}={}", quote(value)))
            .collect();
        words.push(quote(&self.program));
        words.extend(self.args.iter().map(|a| quote(a)));
        words.join(" ")
    }
}

/// Join rendered commands so each runs only if the previous one succeeded.
#[must_use]
pub fn and_then(commands: &[String]) -> String {
    commands.join(" && ")
}
