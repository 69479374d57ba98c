//! Aggregated help.

use async_trait::async_trait;
use herald_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`Help`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Texts that trigger the help answer.
    pub triggers: Vec<String>,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            triggers: vec!["/help".into(), "help".into(), "помощь".into()],
        }
    }
}

/// Answers with the help text of every other responder.
///
/// Build it last, from the help of the already configured dispatcher:
///
/// ```rust,ignore
/// let help = Help::new(HelpConfig::default(), &dispatcher.help());
/// dispatcher.add(help);
/// ```
pub struct Help {
    triggers: Vec<String>,
    text: String,
}

impl Help {
    /// Creates the responder from the collected help of the others.
    pub fn new(config: HelpConfig, others: &str) -> Self {
        let own = help_line(&config.triggers, "эта подсказка");
        Self {
            text: format!("{others}{own}"),
            triggers: config.triggers,
        }
    }
}

#[async_trait]
impl Responder for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn react_on(&self) -> Vec<String> {
        self.triggers.clone()
    }

    async fn on_message(&self, msg: &InboundMessage) -> ResponderResult<Option<Answer>> {
        if !self.reacts_to(msg) {
            return Ok(None);
        }
        Ok(Some(Answer::text(self.text.clone())))
    }

    fn help(&self) -> String {
        help_line(&self.triggers, "эта подсказка")
    }
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn answers_with_collected_help() {
        let help = Help::new(HelpConfig::default(), "ping _– ответит pong_\n");
        let answer = tokio_test::block_on(help.on_message(&msg("/HELP")))
            .unwrap()
            .unwrap();
        assert_eq!(
            answer.text,
            "ping _– ответит pong_\n/help, help, помощь _– эта подсказка_\n"
        );
    }

    #[test]
    fn ignores_other_messages() {
        let help = Help::new(HelpConfig::default(), "");
        assert_eq!(tokio_test::block_on(help.on_message(&msg("helpful"))).unwrap(), None);
    }
}
