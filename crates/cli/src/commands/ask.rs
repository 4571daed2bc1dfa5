//! `finpilot ask` — Single-question or interactive chat with the assistant.
//!
//! In interactive mode the session history lives here, in the process, and
//! is replayed into every new turn. Ctrl+C during a turn abandons that turn
//! only; at the prompt it ends the session.

use std::io::Write;

use finpilot_config::AppConfig;
use finpilot_core::message::AssistantMessage;
use finpilot_core::records::UserId;
use finpilot_engine::{ChatReply, ChatRequest, FinanceAssistant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

pub async fn run(user: String, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    let assistant = FinanceAssistant::from_config(&config, store);

    if let Some(reason) = assistant.unavailable_reason() {
        eprintln!();
        eprintln!("  ERROR: Assistant unavailable: {reason}");
        eprintln!();
        if reason.starts_with("no API key") {
            eprintln!("  Set one of these environment variables:");
            eprintln!("    export GEMINI_API_KEY='...'     (default provider)");
            eprintln!("    export OPENAI_API_KEY='sk-...'  (with provider = \"openai\")");
            eprintln!("    export FINPILOT_API_KEY='...'   (generic)");
            eprintln!();
        }
        eprintln!("  Check your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(format!("Assistant unavailable: {reason}").into());
    }

    let user = UserId::from(user);

    if let Some(question) = message {
        eprint!("  Thinking...");
        let reply = ask_once(&assistant, ChatRequest::new(user, question)).await;
        eprint!("\r              \r");
        print_reply(&reply?);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        FinPilot — Interactive Assistant       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  User:      {user}");
    println!();
    println!("  Ask about your spending, budgets or savings.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut history: Vec<AssistantMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        let request = ChatRequest::new(user.clone(), question).with_history(history.clone());
        eprint!("  ...");
        let outcome = ask_once(&assistant, request).await;
        eprint!("\r     \r");

        match outcome {
            Ok(reply) => {
                println!();
                for line in reply.reply_text.lines() {
                    println!("  FinPilot > {line}");
                }
                println!();
                // A substituted apology is not worth replaying.
                if !reply.degraded {
                    history.push(AssistantMessage::user(question));
                    history.push(AssistantMessage::assistant(reply.reply_text));
                }
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!("\n  Goodbye!");
    Ok(())
}

/// Run one turn, cancelling the provider call on Ctrl+C.
async fn ask_once(
    assistant: &FinanceAssistant,
    request: ChatRequest,
) -> finpilot_core::Result<ChatReply> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let turn = assistant.chat_with_cancel(request, cancel_rx);
    tokio::pin!(turn);

    tokio::select! {
        reply = &mut turn => reply,
        _ = tokio::signal::ctrl_c() => {
            let _ = cancel_tx.send(true);
            turn.await
        }
    }
}

fn print_reply(reply: &ChatReply) {
    println!("{}", reply.reply_text);
    println!();
    println!(
        "  ({} transactions analyzed; categories: {})",
        reply.transactions_analyzed,
        reply.categories_available.join(", ")
    );
}
