use chrono::{DateTime, Utc};
use kg_loader_schemas::{ConversationMessage, Episode, EpisodeType, RawRecord};
use std::collections::HashMap;
use std::path::Path;

use super::{read_records, to_content, SourceAdapter};
use crate::error::SourceError;
use crate::timestamps::parse_instant;

const SOURCE_DESCRIPTION: &str = "Full customer-bot conversation history";

/// One episode per conversation thread, messages in time order.
#[derive(Default)]
pub struct ConversationAdapter {
    history: Vec<ConversationMessage>,
}

/// Messages of one thread, each paired with its parsed timestamp.
struct Thread<'a> {
    id: &'a str,
    first_index: usize,
    messages: Vec<(DateTime<Utc>, &'a ConversationMessage)>,
}

impl ConversationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(history: Vec<ConversationMessage>) -> Self {
        Self { history }
    }

    /// Group messages by thread in order of first appearance, then sort each
    /// thread by timestamp. Ties keep their original relative order.
    fn threads(&self) -> Result<Vec<Thread<'_>>, SourceError> {
        let mut threads: Vec<Thread<'_>> = Vec::new();
        let mut by_id: HashMap<&str, usize> = HashMap::new();

        for (index, message) in self.history.iter().enumerate() {
            let at = parse_instant(message.timestamp()).map_err(|reason| {
                SourceError::normalization(
                    index,
                    format!("message in thread {}", message.thread_id()),
                    reason,
                )
            })?;

            let slot = *by_id.entry(message.thread_id()).or_insert_with(|| {
                threads.push(Thread {
                    id: message.thread_id(),
                    first_index: index,
                    messages: Vec::new(),
                });
                threads.len() - 1
            });
            threads[slot].messages.push((at, message));
        }

        for thread in &mut threads {
            thread.messages.sort_by_key(|(at, _)| *at);
        }

        Ok(threads)
    }
}

impl SourceAdapter for ConversationAdapter {
    fn load(&mut self, location: &Path) -> Result<(), SourceError> {
        self.history = read_records(location)?;
        Ok(())
    }

    fn raw_records(&self) -> Vec<RawRecord> {
        self.history.iter().cloned().map(RawRecord::Message).collect()
    }

    fn to_episodes(&self) -> Result<Vec<Episode>, SourceError> {
        self.threads()?
            .into_iter()
            .map(|thread| {
                let name = format!("ChatbotConversation-{}", thread.id);
                let ordered: Vec<&ConversationMessage> =
                    thread.messages.iter().map(|(_, m)| *m).collect();
                let reference_time = thread
                    .messages
                    .last()
                    .map(|(at, _)| *at)
                    .ok_or_else(|| {
                        SourceError::normalization(thread.first_index, &name, "thread has no messages")
                    })?;

                Ok(Episode {
                    content: to_content(thread.first_index, &name, &ordered)?,
                    source_description: SOURCE_DESCRIPTION.to_string(),
                    source: EpisodeType::Json,
                    reference_time,
                    group_id: Some(thread.id.to_string()),
                    name,
                })
            })
            .collect()
    }
}
