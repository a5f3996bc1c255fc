//! The minimal capability a heartbeat (or, via `automate-router`, a
//! scheduler job) needs from "the agent" — never a duck-typed `Any`
//! reference.

use async_trait::async_trait;

use crate::error::Result;

/// Anything that can turn a prompt into a reply for a given session. The
/// external LLM-driven reasoning loop implements this; the core never
/// inspects how.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    async fn process_message(&self, session_id: &str, prompt: &str) -> Result<String>;

    /// Streaming variant: `on_chunk` is invoked once per incremental piece
    /// of the reply as it's produced. The default implementation has no
    /// incremental output to offer, so it resolves the whole reply first and
    /// reports it as a single chunk.
    async fn process_message_streaming(
        &self,
        session_id: &str,
        prompt: &str,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String> {
        let reply = self.process_message(session_id, prompt).await?;
        on_chunk(&reply);
        Ok(reply)
    }
}
