//! Streaming response assembly
//!
//! Turns the `data:` payloads of a chat-completions event stream into
//! complete responses. Deltas are accumulated per choice index and a choice
//! is yielded as soon as its `finish_reason` arrives, so a consumer that only
//! wants the first response stops reading the body there.

use std::collections::{BTreeMap, VecDeque};
use std::pin::Pin;

use futures::{Stream, StreamExt};

use relay_core::error::{ProviderError, ProviderResult};
use relay_core::provider::{Completion, FinishReason, ResponseStream, TokenUsage};

use super::wire::ChatChunk;

/// Terminal payload of an OpenAI-style event stream
pub const DONE_MARKER: &str = "[DONE]";

type DataStream = Pin<Box<dyn Stream<Item = ProviderResult<String>> + Send>>;

#[derive(Default)]
struct Partial {
    content: String,
}

struct Assembler {
    events: DataStream,
    model: String,
    usage: Option<TokenUsage>,
    partial: BTreeMap<u32, Partial>,
    ready: VecDeque<Completion>,
    finished: bool,
}

impl Assembler {
    fn absorb(&mut self, chunk: ChatChunk) {
        if let Some(model) = chunk.model.filter(|m| !m.is_empty()) {
            self.model = model;
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }

        // Content-filter preambles arrive with no choices
        for choice in chunk.choices {
            let entry = self.partial.entry(choice.index).or_default();
            if let Some(text) = choice.delta.and_then(|d| d.content) {
                entry.content.push_str(&text);
            }
            if let Some(reason) = choice.finish_reason {
                if let Some(done) = self.partial.remove(&choice.index) {
                    self.emit(done, Some(reason));
                }
            }
        }
    }

    fn emit(&mut self, partial: Partial, finish_reason: Option<FinishReason>) {
        self.ready.push_back(Completion {
            content: partial.content,
            model: self.model.clone(),
            usage: self.usage,
            finish_reason,
        });
    }

    /// Emit choices that never reported a finish reason
    fn flush(&mut self) {
        self.finished = true;
        let pending = std::mem::take(&mut self.partial);
        for (_, partial) in pending {
            self.emit(partial, None);
        }
    }
}

/// Assemble complete responses from a stream of event payloads.
pub fn assemble<S>(events: S, model: impl Into<String>) -> ResponseStream
where
    S: Stream<Item = ProviderResult<String>> + Send + 'static,
{
    let state = Assembler {
        events: Box::pin(events),
        model: model.into(),
        usage: None,
        partial: BTreeMap::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(completion) = state.ready.pop_front() {
                return Some((Ok(completion), state));
            }
            if state.finished {
                return None;
            }

            match state.events.next().await {
                None => state.flush(),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                Some(Ok(data)) => {
                    let data = data.trim();
                    if data == DONE_MARKER {
                        state.flush();
                        continue;
                    }
                    if data.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ChatChunk>(data) {
                        Ok(chunk) => state.absorb(chunk),
                        Err(e) => {
                            state.finished = true;
                            return Some((
                                Err(ProviderError::MalformedResponse(format!(
                                    "invalid stream chunk: {e}"
                                ))),
                                state,
                            ));
                        }
                    }
                }
            }
        }
    }))
}
