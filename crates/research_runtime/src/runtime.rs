//! The agent runtime boundary.

use async_trait::async_trait;
use futures::Stream;
use research_core::RuntimeMessage;

use crate::error::{Result, RuntimeError};

/// An agent orchestration runtime driven one turn at a time.
///
/// After [`AgentRuntime::query`], messages are pulled with
/// [`AgentRuntime::next_message`] until it returns `Ok(None)`. Tool hooks
/// registered in the runtime options fire while the turn is being pulled.
#[async_trait]
pub trait AgentRuntime: Send {
    async fn connect(&mut self) -> Result<()>;

    /// Start a turn with the user's prompt.
    async fn query(&mut self, prompt: &str) -> Result<()>;

    /// Next message of the current turn, `None` once the turn is over.
    async fn next_message(&mut self) -> Result<Option<RuntimeMessage>>;

    async fn close(&mut self) -> Result<()>;
}

/// The current turn's messages as a stream.
pub fn responses<'a, R>(runtime: &'a mut R) -> impl Stream<Item = Result<RuntimeMessage>> + 'a
where
    R: AgentRuntime + ?Sized,
{
    futures::stream::try_unfold(runtime, |runtime| async move {
        let next = runtime.next_message().await?;
        Ok::<_, RuntimeError>(next.map(|message| (message, runtime)))
    })
}
