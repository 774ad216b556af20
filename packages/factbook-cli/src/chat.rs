//! Interactive chat REPL.
//!
//! Streams the assistant's answer to stdout token by token via the session's
//! chunk callback. On a transport error the partial answer stays on screen
//! and the prompt returns, matching the panel behavior.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use factbook_core::api::FactbookClient;
use factbook_core::chat::ChatSession;

const GREETING: &str =
    "Ask anything about your factbooks and strategies. Type /quit to leave.";

pub async fn run(client: FactbookClient, strategy_id: Option<i64>) -> Result<()> {
    let mut session = ChatSession::new(client, strategy_id).with_greeting(GREETING);
    println!("{}", session.messages()[0].content);
    if let Some(id) = strategy_id {
        println!("(answers will reference strategy #{id})");
    }

    let stdin = io::stdin();
    loop {
        let mut stdout = io::stdout();
        write!(stdout, "\n> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }

        // The callback sees the full message each time; print only the tail
        // that arrived since the previous chunk.
        let mut printed = 0;
        let result = session
            .send(input, |message| {
                print!("{}", &message.content[printed..]);
                printed = message.content.len();
                let _ = io::stdout().flush();
            })
            .await;

        match result {
            Ok(()) => println!(),
            Err(err) => {
                println!();
                eprintln!("chat error: {err}");
            }
        }
    }

    Ok(())
}
