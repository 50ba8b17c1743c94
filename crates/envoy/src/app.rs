use stacx_shared::Credentials;
use std::path::Path;

use crate::attachments::PendingFiles;
use crate::client::{ApiClient, reply_text};
use crate::config::Config;
use crate::conversation::Sender;
use crate::dictation::Dictation;
use crate::error::{ClientError, Result};
use crate::session::{self, User};
use crate::storage::{DurableStorage, SessionStorage};
use crate::store::ConversationStore;

/// Everything one client session holds.
pub struct App {
    pub config: Config,
    pub store: ConversationStore,
    pub pending: PendingFiles,
    pub dictation: Dictation,
    pub user: Option<User>,
    pub model: String,
    client: ApiClient,
    durable: DurableStorage,
    session: SessionStorage,
}

impl App {
    pub fn new(config: Config, durable: DurableStorage, session: SessionStorage) -> Result<Self> {
        let store = ConversationStore::new(Box::new(durable.clone()), Box::new(session.clone()))?;
        let user = session::load_user(&durable, &session)?;
        let client = ApiClient::new(config.proxy_url.clone(), config.auth_url.clone());

        Ok(Self {
            model: config.model.clone(),
            config,
            store,
            pending: PendingFiles::default(),
            dictation: Dictation::unsupported(),
            user,
            client,
            durable,
            session,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Sends `text` plus queued attachments and records whatever reply comes back.
    /// Returns the conversation id and the reply text.
    pub async fn send(&mut self, text: &str) -> Result<(String, String)> {
        let files = self.pending.list().to_vec();
        let chat_id = self.store.begin_send(text, files)?;
        self.pending.take();

        let history = self
            .store
            .get(&chat_id)
            .map(|chat| chat.history())
            .unwrap_or_default();
        let reply = reply_text(self.client.chat(history, &self.model).await);

        self.store.record_reply(&chat_id, &reply)?;
        Ok((chat_id, reply))
    }

    pub fn attach(&mut self, path: &Path) -> Result<String> {
        let file = self.pending.attach(path)?;
        Ok(format!("{} ({})", file.name, file.mime_type))
    }

    pub async fn login(&mut self, email: &str, password: &str, remember: bool) -> Result<&User> {
        session::validate_login(email, password)?;
        let auth = self
            .client
            .login(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.remember(User::from_auth(auth, None), remember)
    }

    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<&User> {
        session::validate_signup(name, email, password, confirm)?;
        let auth = self
            .client
            .signup(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        // New accounts stay signed in
        self.remember(User::from_auth(auth, Some(name)), true)
    }

    fn remember(&mut self, user: User, durable: bool) -> Result<&User> {
        session::save_user(&user, durable, &self.durable, &self.session)?;
        tracing::info!("Signed in as {}", user.email);
        Ok(self.user.insert(user))
    }

    pub fn logout(&mut self) -> Result<()> {
        session::clear_user(&self.durable, &self.session)?;
        self.user = None;
        Ok(())
    }

    /// Resolves a 1-based list position or a literal id to a conversation id.
    pub fn chat_ref(&self, target: &str) -> Result<String> {
        let chats = self.store.chats();
        if let Ok(n) = target.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| chats.get(i))
                .map(|c| c.id.clone())
                .ok_or_else(|| ClientError::UnknownChat(target.to_string()));
        }
        self.store
            .get(target)
            .map(|c| c.id.clone())
            .ok_or_else(|| ClientError::UnknownChat(target.to_string()))
    }

    /// Edits the user's `position`-th (1-based) message in the open conversation.
    /// Assistant replies are not counted.
    pub fn edit_message(&mut self, position: usize, text: &str) -> Result<()> {
        let chat = self
            .store
            .current()
            .ok_or_else(|| ClientError::Validation("No conversation is open".to_string()))?;
        let chat_id = chat.id.clone();
        let msg_id = position
            .checked_sub(1)
            .and_then(|i| {
                chat.messages
                    .iter()
                    .filter(|m| m.sender == Sender::User)
                    .nth(i)
            })
            .map(|m| m.id.clone())
            .ok_or_else(|| ClientError::UnknownMessage(position.to_string()))?;

        self.store.edit_user_message(&chat_id, &msg_id, text)
    }
}
