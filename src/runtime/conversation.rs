use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::io::{Emission, Heard, InputSource, OutputSink};
use crate::constants::{
    CLEARED_NOTICE, FAREWELL, HELP_TEXT, MISHEARD_NOTICE, RECOGNITION_FAILED_NOTICE,
    RESTART_NOTICE,
};
use crate::models::{LanguageModel, SamplingParams, TokenSequence};
use crate::session::{Command, ConversationState, Input};
use crate::utils::{GenerationError, RecognitionError};

/// Per-turn generation settings
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Upper bound on the generated sequence
    pub max_length: usize,
    /// Prior history kept when merging a new utterance
    pub max_history_tokens: usize,
    pub sampling: SamplingParams,
    /// Report how long each reply took
    pub show_timing: bool,
}

/// A successful turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub elapsed: Duration,
}

/// Drives the read / respond cycle against one language model
pub struct Conversation<'m> {
    model: &'m dyn LanguageModel,
    settings: TurnSettings,
    state: ConversationState,
}

impl<'m> Conversation<'m> {
    pub fn new(model: &'m dyn LanguageModel, settings: TurnSettings) -> Self {
        Self {
            model,
            settings,
            state: ConversationState::new(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Loop until the user quits or input runs out.
    ///
    /// Generation failures clear the conversation and carry on; only I/O
    /// errors from `input`/`output` end the loop early.
    pub async fn run(
        &mut self,
        input: &mut dyn InputSource,
        output: &mut dyn OutputSink,
    ) -> Result<()> {
        loop {
            output.emit(Emission::Prompt).await?;

            let utterance = match input.read().await? {
                Heard::Utterance(text) => text,
                Heard::Silence => continue,
                Heard::Misheard(err) => {
                    debug!("recognition failed: {}", err);
                    let notice = match err {
                        RecognitionError::Unintelligible => MISHEARD_NOTICE,
                        RecognitionError::Service(_) | RecognitionError::Audio(_) => {
                            RECOGNITION_FAILED_NOTICE
                        }
                    };
                    output.emit(Emission::Apology(notice)).await?;
                    continue;
                }
                Heard::Closed => {
                    output.emit(Emission::Notice(FAREWELL)).await?;
                    break;
                }
            };

            match Input::classify(&utterance) {
                Input::Empty => continue,
                Input::Command(Command::Quit) => {
                    output.emit(Emission::Notice(FAREWELL)).await?;
                    break;
                }
                Input::Command(Command::Clear) => {
                    self.state.reset();
                    output.emit(Emission::Notice(CLEARED_NOTICE)).await?;
                }
                Input::Command(Command::Help) => {
                    output.emit(Emission::Notice(HELP_TEXT)).await?;
                }
                Input::Message(message) => match self.run_turn(&message).await {
                    Ok(reply) => {
                        let elapsed = self.settings.show_timing.then_some(reply.elapsed);
                        output
                            .emit(Emission::Reply {
                                text: &reply.text,
                                elapsed,
                            })
                            .await?;
                    }
                    Err(err) => {
                        warn!("Generation failed, clearing conversation: {}", err);
                        self.state.reset();
                        output
                            .emit(Emission::Apology(&format!("An error occurred: {}", err)))
                            .await?;
                        output.emit(Emission::Notice(RESTART_NOTICE)).await?;
                    }
                },
            }
        }

        info!(turns = self.state.turns(), "conversation ended");
        Ok(())
    }

    /// Run one turn: encode, merge, generate, commit, decode.
    ///
    /// History is only replaced once the whole turn has succeeded; on error
    /// it is left untouched and the caller decides what to do with it.
    pub async fn run_turn(&mut self, utterance: &str) -> Result<TurnReply, GenerationError> {
        let new_input = self
            .model
            .encode(&format!("{}{}", utterance, self.model.eos_token()))?;
        let merged = self
            .state
            .merge_input(&new_input, self.settings.max_history_tokens);

        let started = Instant::now();
        let generated = self
            .model
            .generate(&merged, self.settings.max_length, &self.settings.sampling)
            .await?;
        let elapsed = started.elapsed();

        let text = self.model.decode(&reply_tokens(&generated, merged.len()))?;

        debug!(
            history = generated.len(),
            reply_chars = text.len(),
            "turn complete"
        );
        self.state.commit(generated);

        Ok(TurnReply {
            text: text.trim().to_string(),
            elapsed,
        })
    }
}

/// Tokens the model added after the prompt
pub fn reply_tokens(generated: &TokenSequence, prompt_len: usize) -> TokenSequence {
    generated.suffix_from(prompt_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MockLanguageModel;
    use crate::utils::END_OF_TEXT;
    use async_trait::async_trait;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    const EOS: u32 = 0;
    const REPLY: u32 = 900;

    /// Feeds canned input to the loop
    struct Scripted(VecDeque<Heard>);

    impl Scripted {
        fn lines(lines: &[&str]) -> Self {
            Self(
                lines
                    .iter()
                    .map(|l| Heard::Utterance(l.to_string()))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl InputSource for Scripted {
        async fn read(&mut self) -> Result<Heard> {
            Ok(self.0.pop_front().unwrap_or(Heard::Closed))
        }
    }

    /// Records everything the loop emits, minus prompts
    #[derive(Default)]
    struct Transcript(Vec<String>);

    #[async_trait]
    impl OutputSink for Transcript {
        async fn emit(&mut self, emission: Emission<'_>) -> Result<()> {
            let line = match emission {
                Emission::Prompt => return Ok(()),
                Emission::Reply { text, .. } => format!("reply: {}", text),
                Emission::Notice(text) => format!("notice: {}", text),
                Emission::Apology(text) => format!("apology: {}", text),
            };
            self.0.push(line);
            Ok(())
        }
    }

    /// One token per character, EOS as 0
    fn encode_chars(text: &str) -> TokenSequence {
        let body = text.strip_suffix(END_OF_TEXT).unwrap_or(text);
        let mut tokens: Vec<u32> = body.chars().map(|c| c as u32).collect();
        if body.len() != text.len() {
            tokens.push(EOS);
        }
        TokenSequence::new(tokens)
    }

    fn decode_chars(tokens: &TokenSequence) -> String {
        tokens
            .as_slice()
            .iter()
            .filter(|&&t| t != EOS && t != REPLY)
            .filter_map(|&t| char::from_u32(t))
            .collect()
    }

    /// A model that tokenizes per character and answers "ok"
    fn char_model() -> MockLanguageModel {
        let mut model = MockLanguageModel::new();
        model.expect_eos_token().return_const(END_OF_TEXT);
        model
            .expect_encode()
            .returning(|text| Ok(encode_chars(text)));
        model
            .expect_decode()
            .returning(|tokens| Ok(decode_chars(tokens)));
        model
    }

    /// `input ++ "ok" ++ EOS`
    fn answer(input: &TokenSequence) -> TokenSequence {
        let mut out = input.clone();
        out.extend_from_slice(&['o' as u32, 'k' as u32, EOS]);
        out
    }

    fn settings() -> TurnSettings {
        TurnSettings {
            max_length: 1000,
            max_history_tokens: 500,
            sampling: SamplingParams::default(),
            show_timing: false,
        }
    }

    #[tokio::test]
    async fn test_reply_is_decoded_from_new_tokens_only() {
        let mut model = char_model();
        model
            .expect_generate()
            .times(1)
            .returning(|input, _, _| Ok(answer(input)));

        let mut conversation = Conversation::new(&model, settings());
        let reply = conversation.run_turn("hi").await.unwrap();

        assert_eq!(reply.text, "ok");
        // "hi" EOS "ok" EOS
        assert_eq!(conversation.state().len(), 6);
        assert_eq!(conversation.state().turns(), 1);
    }

    #[tokio::test]
    async fn test_second_turn_includes_history() {
        let mut model = char_model();
        let mut seq = Sequence::new();
        model
            .expect_generate()
            .withf(|input, _, _| input.as_slice() == [104, 105, EOS])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));
        model
            .expect_generate()
            .withf(|input, _, _| {
                input.as_slice() == [104, 105, EOS, 111, 107, EOS, 121, 111, EOS]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));

        let mut conversation = Conversation::new(&model, settings());
        conversation.run_turn("hi").await.unwrap();
        conversation.run_turn("yo").await.unwrap();
    }

    #[tokio::test]
    async fn test_history_is_truncated_before_generation() {
        let mut model = char_model();
        model
            .expect_generate()
            .withf(|input, max_length, _| input.len() <= 4 + 3 && *max_length == 1000)
            .returning(|input, _, _| Ok(answer(input)));

        let mut conversation = Conversation::new(
            &model,
            TurnSettings {
                max_history_tokens: 4,
                ..settings()
            },
        );
        conversation.run_turn("abcdef").await.unwrap();
        let reply = conversation.run_turn("yo").await;
        assert!(reply.is_ok());
    }

    #[tokio::test]
    async fn test_sampling_params_are_forwarded() {
        let mut model = char_model();
        let sampling = SamplingParams {
            top_k: Some(7),
            ..SamplingParams::default()
        };
        model
            .expect_generate()
            .withf(|_, _, params| params.top_k == Some(7))
            .times(1)
            .returning(|input, _, _| Ok(answer(input)));

        let mut conversation = Conversation::new(
            &model,
            TurnSettings {
                sampling,
                ..settings()
            },
        );
        conversation.run_turn("hi").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_untouched() {
        let mut model = char_model();
        let mut seq = Sequence::new();
        model
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));
        model
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(GenerationError::Tokenizer("boom".to_string())));

        let mut conversation = Conversation::new(&model, settings());
        conversation.run_turn("hi").await.unwrap();
        let before = conversation.state().history().cloned();

        assert!(conversation.run_turn("yo").await.is_err());
        assert_eq!(conversation.state().history().cloned(), before);
    }

    #[tokio::test]
    async fn test_clear_then_fresh_turn_then_quit() {
        let mut model = char_model();
        let mut seq = Sequence::new();
        model
            .expect_generate()
            .withf(|input, _, _| input.as_slice() == encode_chars("hello<|endoftext|>").as_slice())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));
        // After "clear" the merge sees no history at all
        model
            .expect_generate()
            .withf(|input, _, _| {
                input.as_slice() == encode_chars("hi again<|endoftext|>").as_slice()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));

        let mut input = Scripted::lines(&["hello", "clear", "hi again", "quit", "never read"]);
        let mut output = Transcript::default();
        let mut conversation = Conversation::new(&model, settings());

        conversation.run(&mut input, &mut output).await.unwrap();

        assert_eq!(
            output.0,
            vec![
                "reply: ok".to_string(),
                format!("notice: {}", CLEARED_NOTICE),
                "reply: ok".to_string(),
                format!("notice: {}", FAREWELL),
            ]
        );
        assert_eq!(input.0.len(), 1, "loop must stop reading after quit");
    }

    #[tokio::test]
    async fn test_generation_error_resets_history() {
        let mut model = char_model();
        let mut seq = Sequence::new();
        model
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));
        model
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Err(GenerationError::Status {
                    status: 500,
                    body: "out of memory".to_string(),
                })
            });
        model
            .expect_generate()
            .withf(|input, _, _| input.as_slice() == encode_chars("again<|endoftext|>").as_slice())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input, _, _| Ok(answer(input)));

        let mut input = Scripted::lines(&["hello", "crash", "again", "bye"]);
        let mut output = Transcript::default();
        let mut conversation = Conversation::new(&model, settings());

        conversation.run(&mut input, &mut output).await.unwrap();

        assert!(output.0[1].starts_with("apology: An error occurred"));
        assert_eq!(output.0[2], format!("notice: {}", RESTART_NOTICE));
        assert_eq!(output.0[3], "reply: ok");
        assert_eq!(conversation.state().turns(), 1);
    }

    #[tokio::test]
    async fn test_commands_and_blank_lines_skip_the_model() {
        let mut model = char_model();
        model.expect_generate().never();

        let mut input = Scripted::lines(&["", "   ", "HELP", "clear", "clear", "Exit"]);
        let mut output = Transcript::default();
        let mut conversation = Conversation::new(&model, settings());

        conversation.run(&mut input, &mut output).await.unwrap();

        assert_eq!(
            output.0,
            vec![
                format!("notice: {}", HELP_TEXT),
                format!("notice: {}", CLEARED_NOTICE),
                format!("notice: {}", CLEARED_NOTICE),
                format!("notice: {}", FAREWELL),
            ]
        );
        assert!(conversation.state().is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input_says_goodbye() {
        let model = char_model();
        let mut input = Scripted(VecDeque::new());
        let mut output = Transcript::default();

        Conversation::new(&model, settings())
            .run(&mut input, &mut output)
            .await
            .unwrap();

        assert_eq!(output.0, vec![format!("notice: {}", FAREWELL)]);
    }

    #[tokio::test]
    async fn test_recognition_failures_keep_history() {
        let mut model = char_model();
        model
            .expect_generate()
            .times(2)
            .returning(|input, _, _| Ok(answer(input)));

        let mut input = Scripted(VecDeque::from(vec![
            Heard::Utterance("hi".to_string()),
            Heard::Silence,
            Heard::Misheard(RecognitionError::Unintelligible),
            Heard::Misheard(RecognitionError::Service("503".to_string())),
            Heard::Utterance("yo".to_string()),
        ]));
        let mut output = Transcript::default();
        let mut conversation = Conversation::new(&model, settings());

        conversation.run(&mut input, &mut output).await.unwrap();

        assert_eq!(
            output.0,
            vec![
                "reply: ok".to_string(),
                format!("apology: {}", MISHEARD_NOTICE),
                format!("apology: {}", RECOGNITION_FAILED_NOTICE),
                "reply: ok".to_string(),
                format!("notice: {}", FAREWELL),
            ]
        );
        assert_eq!(conversation.state().turns(), 2);
    }

    #[test]
    fn test_reply_tokens() {
        let generated = TokenSequence::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(reply_tokens(&generated, 3).as_slice(), &[4, 5]);
        assert!(reply_tokens(&generated, 9).is_empty());
    }
}
