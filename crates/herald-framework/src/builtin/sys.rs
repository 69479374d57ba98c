//! Fixed command/answer table plus random quotes.
//!
//! ```toml
//! [plugins.sys]
//! say = ["Не спать!", "Всё будет хорошо"]
//! say_file = "data/say.data"
//!
//! [[plugins.sys.commands]]
//! triggers = ["/rules", "rules?"]
//! description = "правила общения в чате"
//! answer = "_будьте вежливы_"
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use herald_core::prelude::*;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Triggers of the quote command.
pub const SAY_TRIGGERS: &[&str] = &["/say", "say!"];

/// One entry of the command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysCommand {
    /// Texts that trigger the command.
    pub triggers: Vec<String>,
    /// Shown in help.
    pub description: String,
    /// Posted verbatim.
    pub answer: String,
}

impl SysCommand {
    /// Creates a command.
    pub fn new<S: AsRef<str>>(triggers: &[S], description: &str, answer: &str) -> Self {
        Self {
            triggers: triggers.iter().map(|t| t.as_ref().to_string()).collect(),
            description: description.into(),
            answer: answer.into(),
        }
    }
}

/// Configuration for [`Sys`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SysConfig {
    /// Command table, checked in order.
    pub commands: Vec<SysCommand>,
    /// Quotes for `say!`.
    pub say: Vec<String>,
    /// File with more quotes, one per line.
    pub say_file: Option<PathBuf>,
}

impl Default for SysConfig {
    fn default() -> Self {
        Self {
            commands: vec![
                SysCommand::new(&["/ping", "ping"], "ответит pong", "_pong_"),
                SysCommand::new(&["/пинг", "пинг"], "ответит понг", "_понг_"),
            ],
            say: Vec::new(),
            say_file: None,
        }
    }
}

/// Reads quotes from a file, one per non-empty line.
pub fn load_quotes(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Answers fixed commands and `say!`.
pub struct Sys {
    commands: Vec<SysCommand>,
    quotes: Vec<String>,
    rng: Mutex<StdRng>,
}

impl Sys {
    /// Creates the responder with an OS-seeded random source.
    pub fn new(config: SysConfig) -> std::io::Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates the responder with the given random source.
    pub fn with_rng(config: SysConfig, rng: StdRng) -> std::io::Result<Self> {
        let mut quotes = config.say;
        if let Some(path) = &config.say_file {
            quotes.extend(load_quotes(path)?);
        }
        info!(
            commands = config.commands.len(),
            quotes = quotes.len(),
            "Sys responder ready"
        );

        Ok(Self {
            commands: config.commands,
            quotes,
            rng: Mutex::new(rng),
        })
    }

    fn say(&self) -> Option<Answer> {
        if self.quotes.is_empty() {
            return None;
        }
        let i = self.rng.lock().random_range(0..self.quotes.len());
        Some(Answer::text(format!("_{}_", self.quotes[i])))
    }
}

#[async_trait]
impl Responder for Sys {
    fn name(&self) -> &str {
        "sys"
    }

    fn react_on(&self) -> Vec<String> {
        let mut triggers: Vec<String> = SAY_TRIGGERS.iter().map(|s| s.to_string()).collect();
        for cmd in &self.commands {
            triggers.extend(cmd.triggers.iter().cloned());
        }
        triggers
    }

    async fn on_message(&self, msg: &InboundMessage) -> ResponderResult<Option<Answer>> {
        let text = msg.trimmed_text();

        if contains_trigger(SAY_TRIGGERS, text) {
            return Ok(self.say());
        }

        Ok(self
            .commands
            .iter()
            .find(|cmd| contains_trigger(&cmd.triggers, text))
            .map(|cmd| Answer::text(cmd.answer.clone())))
    }

    fn help(&self) -> String {
        let mut help = String::new();
        if !self.quotes.is_empty() {
            help.push_str(&help_line(SAY_TRIGGERS, "набраться мудрости"));
        }
        for cmd in &self.commands {
            help.push_str(&help_line(&cmd.triggers, &cmd.description));
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use herald_core::{ChatTarget, Identity, MessageHandle};

    use super::*;

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::new(
            MessageHandle(1),
            ChatTarget(1),
            Default::default(),
            Identity::new("u", "U"),
            text,
        )
    }

    fn sys(quotes: &[&str]) -> Sys {
        let config = SysConfig {
            say: quotes.iter().map(|q| q.to_string()).collect(),
            ..SysConfig::default()
        };
        Sys::with_rng(config, StdRng::seed_from_u64(42)).unwrap()
    }

    #[test]
    fn answers_fixed_commands() {
        let bot = sys(&[]);
        let answer = |t| tokio_test::block_on(bot.on_message(&msg(t))).unwrap();

        assert_eq!(answer("ping"), Some(Answer::text("_pong_")));
        assert_eq!(answer("/ping"), Some(Answer::text("_pong_")));
        assert_eq!(answer("пинг"), Some(Answer::text("_понг_")));
        assert_eq!(answer("ping me"), None);
    }

    #[test]
    fn say_picks_a_configured_quote() {
        let bot = sys(&["one", "two", "three"]);
        for _ in 0..10 {
            let answer = tokio_test::block_on(bot.on_message(&msg("say!")))
                .unwrap()
                .unwrap();
            assert!(["_one_", "_two_", "_three_"].contains(&answer.text.as_str()));
            assert!(!answer.pin);
        }
    }

    #[test]
    fn say_is_deterministic_for_a_seed() {
        let picks = |bot: &Sys| -> Vec<String> {
            (0..5)
                .map(|_| bot.say().map(|a| a.text).unwrap_or_default())
                .collect()
        };
        let quotes = ["a", "b", "c", "d", "e", "f"];
        assert_eq!(picks(&sys(&quotes)), picks(&sys(&quotes)));
    }

    #[test]
    fn say_without_quotes_does_not_match() {
        let bot = sys(&[]);
        assert_eq!(tokio_test::block_on(bot.on_message(&msg("say!"))).unwrap(), None);
    }

    #[test]
    fn quotes_are_loaded_from_file() {
        let path = std::env::temp_dir().join(format!("herald-say-{}.data", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "first\n\n  second  ").unwrap();

        let config = SysConfig {
            say_file: Some(path.clone()),
            ..SysConfig::default()
        };
        let bot = Sys::with_rng(config, StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(bot.quotes, vec!["first", "second"]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_quote_file_is_an_error() {
        let config = SysConfig {
            say_file: Some(PathBuf::from("/nonexistent/herald/say.data")),
            ..SysConfig::default()
        };
        assert!(Sys::with_rng(config, StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn help_lists_every_command() {
        assert_eq!(
            sys(&["q"]).help(),
            "/say, say! _– набраться мудрости_\n\
             /ping, ping _– ответит pong_\n\
             /пинг, пинг _– ответит понг_\n"
        );
        assert!(!sys(&[]).help().contains("say!"));
    }
}
