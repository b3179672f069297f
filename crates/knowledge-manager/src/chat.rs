//! Terminal chat assistant with a bounded conversation window.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::error;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::llm::prompts::chat_system;
use crate::llm::{GenerateRequest, LanguageModel, Message, Role};

/// Answer given when the model call fails.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I had an internal error generating a response.";

const EXIT_WORDS: &[&str] = &["/exit", "exit", "quit", ":q"];

/// A chat assistant keeping recent turns as context.
#[derive(Debug)]
pub struct ChatBot {
    model: Arc<dyn LanguageModel>,
    bot_name: String,
    history: Vec<Message>,
    history_max_size: usize,
    temperature: f32,
}

impl ChatBot {
    /// Create a chat bot from its configuration.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, config: &ChatConfig) -> Self {
        Self {
            model,
            bot_name: config.bot_name.clone(),
            history: Vec::new(),
            history_max_size: config.history_max_size.max(1),
            temperature: config.temperature,
        }
    }

    /// Conversation turns kept so far.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Ask a question and record both turns.
    ///
    /// Model failures are logged and answered with [`FALLBACK_ANSWER`].
    pub async fn ask(&mut self, text: &str) -> String {
        self.history.push(Message::user(text));

        let request = GenerateRequest {
            system: Some(chat_system(&self.bot_name)),
            messages: self.window().to_vec(),
            temperature: self.temperature,
            response_schema: None,
        };

        let answer = match self.model.generate(&request).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                error!(error = %e, "LLM call failed");
                FALLBACK_ANSWER.to_string()
            }
        };

        self.history.push(Message::model(answer.clone()));
        let keep = self.history_max_size * 2 + 4;
        if self.history.len() > keep {
            self.history.drain(..self.history.len() - keep);
        }
        answer
    }

    /// Last `2 * history_max_size` turns, starting with a user turn.
    fn window(&self) -> &[Message] {
        let start = self.history.len().saturating_sub(self.history_max_size * 2);
        let window = &self.history[start..];
        match window.first() {
            Some(first) if first.role == Role::Model => &window[1..],
            _ => window,
        }
    }

    /// Run a conversation: read questions from `input`, write answers to
    /// `output`, until an exit word or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the terminal fails.
    pub async fn run_conversation<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        writeln!(
            output,
            "Chatting with {}. Type /exit, exit, quit or :q to leave.",
            self.bot_name
        )?;

        loop {
            write!(output, "You: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if is_exit_word(text) {
                break;
            }

            let answer = self.ask(text).await;
            writeln!(output, "{}: {answer}", self.bot_name)?;
        }

        writeln!(output, "Goodbye.")?;
        Ok(())
    }
}

fn is_exit_word(text: &str) -> bool {
    EXIT_WORDS.iter().any(|w| text.eq_ignore_ascii_case(w))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::llm::testing::ScriptedModel;

    fn bot(model: Arc<ScriptedModel>, history_max_size: usize) -> ChatBot {
        let config = ChatConfig {
            history_max_size,
            ..ChatConfig::default()
        };
        ChatBot::new(model, &config)
    }

    #[tokio::test]
    async fn test_ask_records_history() {
        let model = Arc::new(ScriptedModel::new(["  Hi there!  "]));
        let mut bot = bot(model.clone(), 6);

        let answer = bot.ask("Hello").await;
        assert_eq!(answer, "Hi there!");
        assert_eq!(
            bot.history(),
            &[Message::user("Hello"), Message::model("Hi there!")]
        );

        let request = &model.requests()[0];
        assert!(request.system.as_deref().unwrap().contains("Sarah"));
        assert_eq!(request.messages, vec![Message::user("Hello")]);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_ask_fallback_on_error() {
        let model = Arc::new(ScriptedModel::default());
        model.push_error("down");
        let mut bot = bot(model, 6);

        assert_eq!(bot.ask("Hello").await, FALLBACK_ANSWER);
        assert_eq!(bot.history().len(), 2);
        assert_eq!(bot.history()[1], Message::model(FALLBACK_ANSWER));
    }

    #[tokio::test]
    async fn test_window_and_trimming() {
        let model = Arc::new(ScriptedModel::new(["a1", "a2", "a3", "a4", "a5"]));
        let mut bot = bot(model.clone(), 1);

        for q in ["q1", "q2", "q3", "q4", "q5"] {
            bot.ask(q).await;
        }

        // Window of 2 turns: previous answer dropped so the window starts with the user.
        let last = model.requests().pop().unwrap();
        assert_eq!(last.messages, vec![Message::user("q5")]);

        // History capped at 2 * 1 + 4 turns.
        assert_eq!(bot.history().len(), 6);
        assert_eq!(bot.history()[0], Message::user("q3"));
        assert_eq!(bot.history()[5], Message::model("a5"));
    }

    #[tokio::test]
    async fn test_window_keeps_pairs() {
        let model = Arc::new(ScriptedModel::new(["a1", "a2", "a3"]));
        let mut bot = bot(model.clone(), 2);
        for q in ["q1", "q2", "q3"] {
            bot.ask(q).await;
        }
        let last = model.requests().pop().unwrap();
        assert_eq!(
            last.messages,
            vec![
                Message::user("q2"),
                Message::model("a2"),
                Message::user("q3")
            ]
        );
    }

    #[tokio::test]
    async fn test_run_conversation() {
        let model = Arc::new(ScriptedModel::new(["Fine, thanks."]));
        let mut bot = bot(model.clone(), 6);

        let mut input = Cursor::new("\nHow are you?\nQUIT\nnever read\n");
        let mut output = Vec::new();
        bot.run_conversation(&mut input, &mut output).await.unwrap();

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Sarah: Fine, thanks."));
        assert!(transcript.ends_with("Goodbye.\n"));
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_run_conversation_eof() {
        let model = Arc::new(ScriptedModel::default());
        let mut bot = bot(model.clone(), 6);
        let mut output = Vec::new();
        bot.run_conversation(&mut Cursor::new(""), &mut output)
            .await
            .unwrap();
        assert!(String::from_utf8(output).unwrap().ends_with("Goodbye.\n"));
        assert!(model.requests().is_empty());
    }

    #[test]
    fn test_is_exit_word() {
        for word in ["/exit", "EXIT", "Quit", ":q"] {
            assert!(is_exit_word(word));
        }
        assert!(!is_exit_word("exit now"));
    }
}
