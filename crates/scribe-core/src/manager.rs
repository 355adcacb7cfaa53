//! Conversation manager: drives one exchange at a time.
//!
//! `idle → sending → idle`:
//! 1. Guard the input and the active preset's credential (no side effects on rejection)
//! 2. Append the user's message so it renders before the reply arrives
//! 3. Build the reference bundle and vendor request, call the transport
//! 4. Append the reply (or an error message) and go back to idle
//! 5. On success only, write the conversation into the settings store
//!
//! Failed exchanges stay visible in the session but are not persisted; the
//! next successful exchange saves them along with everything else.
//!
//! [`ConversationManager::send_message`] runs all of it. Embeddings that keep
//! the manager behind a `RefCell` use the phases instead ([`begin`],
//! [`PendingExchange::dispatch`], [`finish`]) so no borrow is held across
//! the network await.
//!
//! [`begin`]: ConversationManager::begin
//! [`finish`]: ConversationManager::finish

use scribe_types::{
    Result, ScribeError,
    conversation::Conversation,
    event::ChatEvent,
    message::Message,
    preset::Preset,
    prompts::QuickAction,
    reference::ReferenceSelection,
};
use crate::event_bus::EventBus;
use crate::extract::extract_reply;
use crate::ports::{DocumentReader, HttpTransport, Notifier};
use crate::reference::build_bundle;
use crate::request::build_request;
use crate::store::SettingsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
}

/// Snapshot of everything one exchange needs, detached from the manager
#[derive(Debug, Clone)]
pub struct PendingExchange {
    pub exchange_id: u64,
    pub preset: Preset,
    pub instruction: Option<String>,
    pub selection: ReferenceSelection,
    /// Session messages at send time, ending with `message`
    pub history: Vec<Message>,
    pub message: Message,
}

impl PendingExchange {
    /// Resolve references, send the vendor request, and extract the reply.
    pub async fn dispatch(
        &self,
        reader: &dyn DocumentReader,
        transport: &dyn HttpTransport,
    ) -> Result<String> {
        let bundle = build_bundle(&self.selection, reader).await;
        let request = build_request(
            &self.preset,
            self.instruction.as_deref(),
            &bundle,
            &self.history,
            &self.message,
        )?;
        log::debug!(
            "Exchange {}: {} request with {} reference(s)",
            self.exchange_id,
            self.preset.vendor.label(),
            bundle.len()
        );
        let body = transport.post(&request).await?.into_json()?;
        Ok(extract_reply(self.preset.vendor, &body))
    }
}

/// How a settled exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Reply appended and the conversation written to the store
    Replied { conversation_id: i64, created: bool },
    /// Error message appended; nothing persisted
    Failed { message: String },
}

pub struct ConversationManager {
    messages: Vec<Message>,
    state: ExchangeState,
    /// Pending input buffer; cleared when a send is accepted
    pub input: String,
    conversation_id: Option<i64>,
    selection: ReferenceSelection,
    event_bus: EventBus,
    exchange_counter: u64,
}

impl ConversationManager {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            messages: Vec::new(),
            state: ExchangeState::Idle,
            input: String::new(),
            conversation_id: None,
            selection: ReferenceSelection::new(),
            event_bus,
            exchange_counter: 0,
        }
    }

    /// Fresh session seeded with the last used reference selection
    pub fn open(store: &SettingsStore, event_bus: EventBus) -> Self {
        let mut manager = Self::new(event_bus);
        manager.selection = store.reference_selection().clone();
        manager
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == ExchangeState::Sending
    }

    /// Id of the stored conversation this session updates, if saved yet
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    pub fn selection(&self) -> &ReferenceSelection {
        &self.selection
    }

    /// Replace the reference selection and remember it as the last used one.
    pub fn set_selection(&mut self, selection: ReferenceSelection, store: &mut SettingsStore) {
        store.set_reference_selection(selection.clone());
        self.selection = selection;
    }

    /// Put a quick action's template into the input buffer.
    pub fn apply_quick_action(&mut self, action: QuickAction, store: &SettingsStore) {
        self.input = store.prompts().quick_text(action).to_string();
    }

    /// Start an empty, unsaved session. Refused while sending.
    pub fn new_conversation(&mut self) -> bool {
        if self.is_sending() {
            return false;
        }
        self.messages.clear();
        self.conversation_id = None;
        self.input.clear();
        true
    }

    /// Continue a stored conversation: its messages, id, and reference
    /// selection become the session's. Refused while sending.
    pub fn load_conversation(&mut self, id: i64, store: &SettingsStore) -> bool {
        if self.is_sending() {
            return false;
        }
        let Some(conv) = store.conversation(id) else {
            return false;
        };
        self.messages = conv.messages.clone();
        self.selection = conv.selected_files.clone();
        self.conversation_id = Some(conv.id);
        true
    }

    /// Accept a send: check preconditions, append the user's message, and
    /// enter `Sending`. Rejections are notified and change nothing.
    pub fn begin(
        &mut self,
        text: &str,
        store: &SettingsStore,
        notifier: &dyn Notifier,
    ) -> Result<PendingExchange> {
        let preset = store.active_preset();
        let text = text.trim();
        let rejection = if self.is_sending() {
            Some(ScribeError::Busy)
        } else if text.is_empty() {
            Some(ScribeError::EmptyInput)
        } else if !preset.has_credential() {
            Some(ScribeError::MissingApiKey {
                preset: preset.name.clone(),
            })
        } else {
            None
        };
        if let Some(e) = rejection {
            notifier.notify(&e.to_string());
            return Err(e);
        }

        self.exchange_counter += 1;
        let exchange_id = self.exchange_counter;
        let message = Message::user(text);
        self.messages.push(message.clone());
        self.input.clear();
        self.state = ExchangeState::Sending;

        self.event_bus.emit(ChatEvent::ExchangeStart { exchange_id });
        self.event_bus.emit(ChatEvent::UserMessage {
            text: message.content.clone(),
        });
        log::info!("Exchange {} started with preset {}", exchange_id, preset.name);

        Ok(PendingExchange {
            exchange_id,
            preset: preset.clone(),
            instruction: store.prompts().instruction().map(str::to_string),
            selection: self.selection.clone(),
            history: self.messages.clone(),
            message,
        })
    }

    /// Settle an exchange started by [`ConversationManager::begin`].
    ///
    /// On success the reply is appended and the conversation is written into
    /// `store` (created on the session's first success, replaced by id after
    /// that); the caller commits the store. On failure an error message is
    /// appended and the store is left alone.
    pub fn finish(
        &mut self,
        pending: PendingExchange,
        outcome: Result<String>,
        store: &mut SettingsStore,
    ) -> ExchangeOutcome {
        let result = match outcome {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply.clone()));
                self.event_bus.emit(ChatEvent::ReplyReceived { text: reply });

                let id = match self.conversation_id {
                    Some(id) => id,
                    None => store.next_conversation_id(chrono::Utc::now().timestamp_millis()),
                };
                let conversation =
                    Conversation::new(id, self.messages.clone(), self.selection.clone());
                let created = store.upsert_conversation(conversation);
                self.conversation_id = Some(id);
                self.event_bus
                    .emit(ChatEvent::ConversationSaved { conversation_id: id });
                ExchangeOutcome::Replied {
                    conversation_id: id,
                    created,
                }
            }
            Err(e) => {
                let message = format!("An error occurred: {}", e);
                log::warn!("Exchange {} failed: {}", pending.exchange_id, e);
                self.messages.push(Message::assistant(message.clone()));
                self.event_bus
                    .emit(ChatEvent::ExchangeFailed { message: message.clone() });
                ExchangeOutcome::Failed { message }
            }
        };

        self.state = ExchangeState::Idle;
        self.event_bus.emit(ChatEvent::ExchangeEnd {
            exchange_id: pending.exchange_id,
        });
        result
    }

    /// Run one full exchange and commit the store when it succeeded.
    ///
    /// Returns `Err` only for precondition rejections; transport and shape
    /// failures settle as [`ExchangeOutcome::Failed`].
    pub async fn send_message(
        &mut self,
        text: &str,
        store: &mut SettingsStore,
        reader: &dyn DocumentReader,
        transport: &dyn HttpTransport,
        notifier: &dyn Notifier,
    ) -> Result<ExchangeOutcome> {
        let pending = self.begin(text, store, notifier)?;
        let reply = pending.dispatch(reader, transport).await;
        let outcome = self.finish(pending, reply, store);

        if let ExchangeOutcome::Replied { .. } = outcome {
            if let Err(e) = store.commit().await {
                log::warn!("Failed to save conversation: {}", e);
                notifier.notify(&format!("Failed to save conversation: {}", e));
            }
        }
        Ok(outcome)
    }
}
