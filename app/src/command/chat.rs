//! Interactive multi-turn session.

use askflow_config::Overrides;
use askflow_conversation::Feedback;
use std::io::Write;
use tracing::info;

use super::{build_session, spawn_interrupt_handler};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub overrides: Overrides,
}

/// Strategy for the interactive loop.
///
/// Lines starting with `/` are commands: `/like`, `/dislike`, `/clear`,
/// `/exit`. Everything else is a question.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Empty,
    Exit,
    Clear,
    Like,
    Dislike,
    Unknown(&'a str),
    Question(&'a str),
}

fn parse_line(input: &str) -> Line<'_> {
    let input = input.trim();
    match input {
        "" => Line::Empty,
        "/exit" | "/quit" | "exit" | "quit" => Line::Exit,
        "/clear" => Line::Clear,
        "/like" => Line::Like,
        "/dislike" => Line::Dislike,
        other if other.starts_with('/') => Line::Unknown(other),
        question => Line::Question(question),
    }
}

const fn feedback_label(feedback: Feedback) -> &'static str {
    match feedback {
        Feedback::None => "feedback cleared",
        Feedback::Liked => "👍 liked",
        Feedback::Disliked => "👎 disliked",
    }
}

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let mut session = build_session(input.overrides)?;
        spawn_interrupt_handler(session.controller.stop_handle());
        let controller = &mut session.controller;

        println!("=== askflow chat ===");
        println!("Commands: /like, /dislike, /clear, /exit. Ctrl+C stops an answer.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut buffer = String::new();
            if std::io::stdin().read_line(&mut buffer)? == 0 {
                break;
            }

            match parse_line(&buffer) {
                Line::Empty => {}
                Line::Exit => break,
                Line::Clear => {
                    controller.clear();
                    println!("Conversation cleared.\n");
                }
                rating @ (Line::Like | Line::Dislike) => {
                    let like = rating == Line::Like;
                    match controller.last_container_mut() {
                        Some(container) => {
                            let accepted = if like {
                                container.like()
                            } else {
                                container.dislike()
                            };
                            if accepted {
                                println!("{}\n", feedback_label(container.feedback()));
                            } else {
                                println!("The answer is not finished yet.\n");
                            }
                        }
                        None => println!("Nothing to rate yet.\n"),
                    }
                }
                Line::Unknown(command) => println!("Unknown command: {command}\n"),
                Line::Question(question) => match controller.ask(question).await {
                    Ok(answer) => {
                        if !answer.is_empty() {
                            println!("\n{answer}\n");
                        }
                    }
                    Err(e) => {
                        info!("ask failed: {e}");
                        println!();
                    }
                },
            }
        }

        println!(
            "\nSession ended. Total turns: {}",
            controller.state().turns().len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_questions() {
        assert_eq!(parse_line("  \n"), Line::Empty);
        assert_eq!(parse_line("/exit\n"), Line::Exit);
        assert_eq!(parse_line("quit"), Line::Exit);
        assert_eq!(parse_line("/clear"), Line::Clear);
        assert_eq!(parse_line("/like"), Line::Like);
        assert_eq!(parse_line("/dislike"), Line::Dislike);
        assert_eq!(parse_line("/nope"), Line::Unknown("/nope"));
        assert_eq!(parse_line(" what is MVCC? \n"), Line::Question("what is MVCC?"));
    }
}
