//! A line-oriented chat REPL: each line of stdin becomes a user message
//! routed through the `AgentRouter` to whichever `ManagedAgent` owns the
//! session, with its reply printed back.

use std::io::{self, BufRead, Write};

use automate_router::AgentRouter;

pub async fn run(router: &AgentRouter, channel: &str, user: &str, agent_name: Option<&str>) -> io::Result<()> {
    let session_id = automate_models::Session::make_id(channel, user);
    println!("automate chat — session '{session_id}'. Ctrl-D or /quit to exit.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        if let Some(name) = line.strip_prefix("/agents switch ") {
            match router.handle_switch_command(name.trim()).await {
                Ok(()) => println!("(switched default agent to '{}')", name.trim()),
                Err(e) => println!("(error: {e})"),
            }
            continue;
        }

        let reply = if let Some(name) = agent_name {
            match router.get_agent(name).await {
                Some(agent) => agent.process_message(&session_id, line).await.map_err(|e| e.to_string()),
                None => Err(format!("unknown agent '{name}'")),
            }
        } else {
            router.process_message(&session_id, line, Some(user)).await.map_err(|e| e.to_string())
        };

        match reply {
            Ok(text) => println!("{text}"),
            Err(e) => println!("(error: {e})"),
        }
    }

    Ok(())
}
