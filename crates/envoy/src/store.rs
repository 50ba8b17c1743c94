use chrono::{Local, TimeZone};

use crate::conversation::{Conversation, Message, Sender, UploadedFile, load_conversations};
use crate::error::{ClientError, Result};
use crate::storage::{CHATS_KEY, CURRENT_CHAT_KEY, Storage};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Sidebar bucket: a date label and the conversations under it, in store order.
#[derive(Debug)]
pub struct DateGroup<'a> {
    pub label: String,
    pub chats: Vec<&'a Conversation>,
}

/// Conversation list plus selection, mirrored to storage after every change.
///
/// Two backends are held at once: `durable` for normal chats and `session`
/// for temporary mode. Only one is active at a time.
pub struct ConversationStore {
    durable: Box<dyn Storage>,
    session: Box<dyn Storage>,
    temporary: bool,
    loading: bool,
    chats: Vec<Conversation>,
    current: Option<String>,
}

impl ConversationStore {
    pub fn new(durable: Box<dyn Storage>, session: Box<dyn Storage>) -> Result<Self> {
        let mut store = Self {
            durable,
            session,
            temporary: false,
            loading: false,
            chats: Vec::new(),
            current: None,
        };
        store.load()?;
        Ok(store)
    }

    fn active(&self) -> &dyn Storage {
        if self.temporary {
            self.session.as_ref()
        } else {
            self.durable.as_ref()
        }
    }

    fn load(&mut self) -> Result<()> {
        let storage = self.active();
        let chats = storage
            .get_item(CHATS_KEY)?
            .map(|raw| load_conversations(&raw))
            .unwrap_or_default();
        let current = storage.get_item(CURRENT_CHAT_KEY)?.filter(|id| !id.is_empty());

        self.chats = chats;
        self.current = current;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let storage = self.active();
        storage.set_item(CHATS_KEY, &serde_json::to_string(&self.chats)?)?;
        storage.set_item(CURRENT_CHAT_KEY, self.current.as_deref().unwrap_or(""))?;
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.chats
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ClientError::UnknownChat(id.to_string()))
    }

    pub fn chats(&self) -> &[Conversation] {
        &self.chats
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.chats.iter().find(|c| c.id == id)
    }

    /// The selected conversation, if the selection still points at one.
    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn create(&mut self) -> Result<String> {
        let chat = Conversation::new();
        let id = chat.id.clone();
        self.chats.push(chat);
        self.current = Some(id.clone());
        self.persist()?;
        Ok(id)
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        self.position(id)?;
        self.current = Some(id.to_string());
        self.persist()
    }

    pub fn clear_selection(&mut self) -> Result<()> {
        self.current = None;
        self.persist()
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ClientError::Validation("Title cannot be empty".to_string()));
        }

        let idx = self.position(id)?;
        self.chats[idx].title = title.to_string();
        self.persist()
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let idx = self.position(id)?;
        self.chats.remove(idx);
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        self.persist()
    }

    pub fn append_message(&mut self, id: &str, message: Message) -> Result<()> {
        let idx = self.position(id)?;
        self.chats[idx].push(message);
        self.persist()
    }

    /// Starts a send: records the user message and returns the target chat.
    ///
    /// Creates a conversation when nothing (or a deleted chat) is selected.
    /// Fails with `Busy` until the matching [`record_reply`](Self::record_reply).
    pub fn begin_send(&mut self, text: &str, files: Vec<UploadedFile>) -> Result<String> {
        if self.loading {
            return Err(ClientError::Busy);
        }
        if text.trim().is_empty() && files.is_empty() {
            return Err(ClientError::Validation("Nothing to send".to_string()));
        }

        let selected = self.current().map(|c| c.id.clone());
        let id = match selected {
            Some(id) => id,
            None => {
                let chat = Conversation::new();
                let id = chat.id.clone();
                self.chats.push(chat);
                self.current = Some(id.clone());
                id
            }
        };

        self.append_message(&id, Message::user(text, files))?;
        self.loading = true;
        Ok(id)
    }

    pub fn record_reply(&mut self, id: &str, text: &str) -> Result<()> {
        self.loading = false;
        self.append_message(id, Message::assistant(text))
    }

    /// In-place edit of a user message. The edit is not resent.
    pub fn edit_user_message(&mut self, chat_id: &str, msg_id: &str, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ClientError::Validation("Message cannot be empty".to_string()));
        }

        let idx = self.position(chat_id)?;
        let message = self.chats[idx]
            .messages
            .iter_mut()
            .find(|m| m.id == msg_id)
            .ok_or_else(|| ClientError::UnknownMessage(msg_id.to_string()))?;
        if message.sender != Sender::User {
            return Err(ClientError::NotEditable);
        }

        message.content = content.to_string();
        self.persist()
    }

    /// Switches between durable chats and throwaway session chats.
    pub fn set_temporary(&mut self, on: bool) -> Result<()> {
        if on == self.temporary {
            return Ok(());
        }
        self.temporary = on;
        self.load()?;

        if on {
            self.current = None;
        } else if self.current().is_none() {
            self.current = self.chats.first().map(|c| c.id.clone());
        }
        self.persist()
    }

    pub fn grouped_by_date(&self, now_ms: i64) -> Vec<DateGroup<'_>> {
        let mut groups: Vec<DateGroup<'_>> = Vec::new();
        for chat in &self.chats {
            let label = date_label(chat.updated_at, now_ms);
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.chats.push(chat),
                None => groups.push(DateGroup {
                    label,
                    chats: vec![chat],
                }),
            }
        }
        groups
    }
}

/// `Today`, `Yesterday`, `N days ago` inside a week, then the calendar date.
pub fn date_label(updated_at: i64, now_ms: i64) -> String {
    let days = (now_ms - updated_at).div_euclid(DAY_MS);
    match days {
        d if d <= 0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        _ => match Local.timestamp_millis_opt(updated_at).single() {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => format!("{} days ago", days),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::now_millis;
    use crate::storage::SessionStorage;

    // Both backends are in-memory maps; clones share state so tests can peek
    fn store_with(durable: &SessionStorage, session: &SessionStorage) -> ConversationStore {
        ConversationStore::new(Box::new(durable.clone()), Box::new(session.clone())).unwrap()
    }

    fn fresh() -> (ConversationStore, SessionStorage) {
        let durable = SessionStorage::new();
        (store_with(&durable, &SessionStorage::new()), durable)
    }

    #[test]
    fn first_send_creates_exactly_one_conversation() {
        let (mut store, _) = fresh();
        let id = store.begin_send("hello", vec![]).unwrap();

        assert_eq!(store.chats().len(), 1);
        assert_eq!(store.current_id(), Some(id.as_str()));
        let chat = store.current().unwrap();
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].content, "hello");
        assert_eq!(chat.messages[0].sender, Sender::User);
        assert!(store.is_loading());
    }

    #[test]
    fn second_send_waits_for_the_reply() {
        let (mut store, _) = fresh();
        let id = store.begin_send("one", vec![]).unwrap();
        assert!(matches!(store.begin_send("two", vec![]), Err(ClientError::Busy)));

        store.record_reply(&id, "done").unwrap();
        assert!(!store.is_loading());
        assert_eq!(store.begin_send("two", vec![]).unwrap(), id);
        assert_eq!(store.chats().len(), 1);
    }

    #[test]
    fn empty_send_is_rejected_unless_files_are_attached() {
        let (mut store, _) = fresh();
        assert!(matches!(
            store.begin_send("   ", vec![]),
            Err(ClientError::Validation(_))
        ));
        assert!(store.chats().is_empty());

        let file = UploadedFile {
            name: "notes.txt".into(),
            url: "file:///tmp/notes.txt".into(),
            mime_type: "text/plain".into(),
        };
        store.begin_send("", vec![file]).unwrap();
        assert_eq!(store.current().unwrap().messages[0].files.len(), 1);
    }

    #[test]
    fn stale_selection_starts_a_new_conversation() {
        let (mut store, _) = fresh();
        let old = store.create().unwrap();
        store.current = Some("chat_gone".to_string());

        let id = store.begin_send("hi", vec![]).unwrap();
        assert_ne!(id, old);
        assert_eq!(store.chats().len(), 2);
    }

    #[test]
    fn reply_sets_title_from_first_five_words() {
        let (mut store, _) = fresh();
        let id = store.begin_send("explain loops", vec![]).unwrap();
        store
            .record_reply(&id, "loops repeat a block of code until done")
            .unwrap();

        assert_eq!(store.get(&id).unwrap().title, "Loops repeat a block of...");
    }

    #[test]
    fn error_replies_also_retitle() {
        let (mut store, _) = fresh();
        let id = store.begin_send("hi", vec![]).unwrap();
        store
            .record_reply(&id, "Sorry, I encountered an error. Please try again.")
            .unwrap();
        assert_eq!(store.get(&id).unwrap().title, "Sorry, I encountered an error....");
    }

    #[test]
    fn deleting_the_selection_clears_it() {
        let (mut store, _) = fresh();
        let keep = store.create().unwrap();
        let doomed = store.create().unwrap();

        store.delete(&doomed).unwrap();
        assert_eq!(store.current_id(), None);

        store.select(&keep).unwrap();
        let other = store.create().unwrap();
        store.select(&keep).unwrap();
        store.delete(&other).unwrap();
        assert_eq!(store.current_id(), Some(keep.as_str()));
    }

    #[test]
    fn rename_trims_and_rejects_blank() {
        let (mut store, _) = fresh();
        let id = store.create().unwrap();

        store.rename(&id, "  Trip plans  ").unwrap();
        assert_eq!(store.get(&id).unwrap().title, "Trip plans");

        assert!(matches!(store.rename(&id, "   "), Err(ClientError::Validation(_))));
        assert!(matches!(
            store.rename("chat_missing", "x"),
            Err(ClientError::UnknownChat(_))
        ));
    }

    #[test]
    fn select_unknown_is_an_error() {
        let (mut store, _) = fresh();
        assert!(matches!(store.select("nope"), Err(ClientError::UnknownChat(_))));
    }

    #[test]
    fn only_user_messages_are_editable() {
        let (mut store, _) = fresh();
        let id = store.begin_send("typo hre", vec![]).unwrap();
        store.record_reply(&id, "answer").unwrap();

        let (user_id, reply_id) = {
            let chat = store.get(&id).unwrap();
            (chat.messages[0].id.clone(), chat.messages[1].id.clone())
        };

        store.edit_user_message(&id, &user_id, "typo here").unwrap();
        assert_eq!(store.get(&id).unwrap().messages[0].content, "typo here");
        assert_eq!(store.get(&id).unwrap().messages.len(), 2);

        assert!(matches!(
            store.edit_user_message(&id, &reply_id, "rewrite"),
            Err(ClientError::NotEditable)
        ));
    }

    #[test]
    fn mutations_are_persisted_and_reloaded() {
        let durable = SessionStorage::new();
        let session = SessionStorage::new();
        let id = {
            let mut store = store_with(&durable, &session);
            let id = store.begin_send("remember me", vec![]).unwrap();
            store.record_reply(&id, "ok").unwrap();
            id
        };

        let reloaded = store_with(&durable, &session);
        assert_eq!(reloaded.current_id(), Some(id.as_str()));
        assert_eq!(reloaded.current().unwrap().messages.len(), 2);
    }

    #[test]
    fn temporary_mode_isolates_and_restores() {
        let (mut store, durable) = fresh();
        let kept = store.begin_send("durable", vec![]).unwrap();
        store.record_reply(&kept, "ok").unwrap();

        store.set_temporary(true).unwrap();
        assert!(store.is_temporary());
        assert!(store.chats().is_empty());
        assert_eq!(store.current_id(), None);

        let temp = store.begin_send("throwaway", vec![]).unwrap();
        store.record_reply(&temp, "ok").unwrap();
        let saved = durable.get_item(CHATS_KEY).unwrap().unwrap();
        assert!(!saved.contains("throwaway"));

        store.set_temporary(false).unwrap();
        assert_eq!(store.chats().len(), 1);
        assert_eq!(store.current_id(), Some(kept.as_str()));
    }

    #[test]
    fn leaving_temporary_falls_back_to_first_chat() {
        let (mut store, _) = fresh();
        let first = store.create().unwrap();
        store.create().unwrap();
        store.clear_selection().unwrap();

        store.set_temporary(true).unwrap();
        store.set_temporary(false).unwrap();
        assert_eq!(store.current_id(), Some(first.as_str()));
    }

    #[test]
    fn date_labels() {
        let now = now_millis();
        assert_eq!(date_label(now, now), "Today");
        assert_eq!(date_label(now - DAY_MS + 1, now), "Today");
        assert_eq!(date_label(now - DAY_MS, now), "Yesterday");
        assert_eq!(date_label(now - 3 * DAY_MS, now), "3 days ago");

        let old = now - 30 * DAY_MS;
        let expected = Local
            .timestamp_millis_opt(old)
            .single()
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(date_label(old, now), expected);
    }

    #[test]
    fn groups_keep_store_order() {
        let (mut store, _) = fresh();
        let a = store.create().unwrap();
        let b = store.create().unwrap();
        let c = store.create().unwrap();

        let now = now_millis();
        store.chats[1].updated_at = now - 2 * DAY_MS;

        let groups = store.grouped_by_date(now);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Today");
        let today: Vec<&str> = groups[0].chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(today, vec![a.as_str(), c.as_str()]);
        assert_eq!(groups[1].label, "2 days ago");
        assert_eq!(groups[1].chats[0].id, b);
    }

    #[test]
    fn one_bad_message_does_not_cost_the_other_chats() {
        let durable = SessionStorage::new();
        durable
            .set_item(
                CHATS_KEY,
                r#"[
                    {"id": "chat_a", "title": "Keep me", "messages": [
                        {"id": "m1", "content": "hi", "sender": "user", "timestamp": 1}
                    ], "createdAt": 1, "updatedAt": 1},
                    {"id": "chat_b", "title": "Damaged", "messages": [
                        {"id": "m2", "content": "no stamp", "sender": "user"},
                        {"id": "m3", "content": "odd", "sender": "robot", "timestamp": 3}
                    ], "createdAt": 2, "updatedAt": 2}
                ]"#,
            )
            .unwrap();

        let mut store = store_with(&durable, &SessionStorage::new());
        assert_eq!(store.chats().len(), 2);
        assert_eq!(store.get("chat_b").unwrap().messages.len(), 1);

        store.create().unwrap();
        let saved = durable.get_item(CHATS_KEY).unwrap().unwrap();
        assert!(saved.contains("Keep me"));
        assert!(saved.contains("no stamp"));
        assert_eq!(load_conversations(&saved).len(), 3);
    }
}
