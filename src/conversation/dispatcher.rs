//! Dispatcher: routes each inbound event through the conversation state
//! machine.
//!
//! Order per event: preference check (passthrough short-circuits), state
//! lookup, global overrides, then the handler for the current state.
//! [`Dispatcher::handle`] is the only recovery boundary: any
//! [`DispatchError`] becomes an apology plus a full reset.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use crate::channels::{Channel, IncomingEvent, Keyboard, OutgoingMessage, UserId};
use crate::config::DispatchConfig;
use crate::error::{DispatchError, ValidationError};
use crate::store::{Database, NewSubmission, PreferenceStore, SubmissionRepository};
use crate::validation::{validate_date, validate_name};

use super::intent::{Intent, ModeChoice, Role};
use super::keyboards;
use super::replies;
use super::state::{ConversationState, Group};
use super::store::ConversationStore;

pub struct Dispatcher {
    conversations: ConversationStore,
    submissions: SubmissionRepository,
    preferences: PreferenceStore,
    channel: Arc<dyn Channel>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(db: Arc<dyn Database>, channel: Arc<dyn Channel>, config: DispatchConfig) -> Self {
        Self {
            conversations: ConversationStore::new(),
            submissions: SubmissionRepository::new(Arc::clone(&db)),
            preferences: PreferenceStore::new(db),
            channel,
            config,
        }
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Process one inbound event. Never fails: errors are logged, the user
    /// gets an apology and their conversation is reset.
    pub async fn handle(&self, event: &IncomingEvent) {
        if let Err(e) = self.dispatch(event).await {
            error!(user_id = event.user_id, "Failed to handle message: {e}");
            self.conversations.reset(event.user_id).await;
            self.reply(
                event.user_id,
                replies::FALLBACK_ERROR,
                Some(keyboards::start()),
            )
            .await;
        }
    }

    async fn dispatch(&self, event: &IncomingEvent) -> Result<(), DispatchError> {
        let user_id = event.user_id;
        let use_bot = self.preferences.get(user_id).await;
        let state = self.conversations.get(user_id).await;
        let intent = Intent::classify(&event.text);

        if !use_bot && state.is_start() && intent != Intent::Start {
            info!(user_id, from = %event.display_name, text = %event.text, "Message in passthrough mode");
            return Ok(());
        }

        info!(
            user_id,
            from = %event.display_name,
            state = %state.kind(),
            text = %event.text,
            "Bot message"
        );

        if intent == Intent::Start || state.is_start() {
            return self.show_main_menu(user_id).await;
        }

        match intent {
            Intent::Settings => return self.show_settings(user_id).await,
            Intent::Restart | Intent::Back => return self.show_main_menu(user_id).await,
            _ => {}
        }

        match state {
            ConversationState::Start => self.show_main_menu(user_id).await,
            ConversationState::ChooseMode => self.on_choose_mode(user_id, intent).await,
            ConversationState::ChooseRole => self.on_choose_role(event, intent).await,
            ConversationState::ParentChooseGroup { display_name } => {
                self.on_parent_group(user_id, display_name, &event.text).await
            }
            ConversationState::ParentEnterDate {
                display_name,
                group,
            } => {
                self.on_parent_date(user_id, display_name, group, &event.text)
                    .await
            }
            ConversationState::ParentEnterName {
                display_name,
                group,
                date,
            } => {
                match validate_name(&event.text) {
                    Ok(child_name) => {
                        let reply = replies::name_saved(&child_name);
                        self.conversations
                            .set(
                                user_id,
                                ConversationState::ParentSendVideo {
                                    display_name,
                                    group,
                                    date,
                                    child_name,
                                },
                            )
                            .await;
                        self.reply(user_id, &reply, None).await;
                    }
                    Err(e) => {
                        debug!(user_id, "Rejected input: {}", ValidationError::from(e));
                        self.reply(user_id, replies::name_error(e), None).await;
                    }
                }
                Ok(())
            }
            ConversationState::ParentSendVideo {
                display_name,
                group,
                date,
                child_name,
            } => {
                let Some(video) = event.video_reference() else {
                    self.reply(user_id, replies::VIDEO_MISSING, None).await;
                    return Ok(());
                };

                let saved = match NewSubmission::new(
                    user_id,
                    &display_name,
                    group,
                    date,
                    &child_name,
                    &video,
                ) {
                    Some(new) => self.submissions.append(&new).await,
                    None => {
                        warn!(user_id, "Submission has a blank required field");
                        false
                    }
                };

                self.conversations.reset(user_id).await;
                if saved {
                    info!(user_id, group = %group, date = %date, child = %child_name, "Video submission saved");
                    self.reply(
                        user_id,
                        &replies::submission_saved(group, date, &child_name),
                        Some(keyboards::restart()),
                    )
                    .await;
                } else {
                    self.reply(user_id, replies::SAVE_FAILED, Some(keyboards::restart()))
                        .await;
                }
                Ok(())
            }
            ConversationState::TeacherEnterPassword => {
                if event.text.trim() == self.config.teacher_password.expose_secret() {
                    info!(user_id, "Teacher authenticated");
                    self.conversations
                        .set(user_id, ConversationState::TeacherEnterDate)
                        .await;
                    self.reply(user_id, replies::PASSWORD_ACCEPTED, None).await;
                } else {
                    warn!(user_id, "Wrong teacher password");
                    self.reply(user_id, replies::WRONG_PASSWORD, Some(keyboards::role()))
                        .await;
                }
                Ok(())
            }
            ConversationState::TeacherEnterDate => self.on_teacher_date(user_id, &event.text).await,
        }
    }

    // ── Overrides ───────────────────────────────────────────────────

    async fn show_main_menu(&self, user_id: UserId) -> Result<(), DispatchError> {
        self.conversations
            .set(user_id, ConversationState::ChooseMode)
            .await;
        self.reply(user_id, replies::MAIN_MENU, Some(keyboards::main_menu()))
            .await;
        Ok(())
    }

    async fn show_settings(&self, user_id: UserId) -> Result<(), DispatchError> {
        let use_bot = self.preferences.get(user_id).await;
        self.reply(
            user_id,
            &replies::settings(use_bot),
            Some(keyboards::settings()),
        )
        .await;
        Ok(())
    }

    // ── State handlers ──────────────────────────────────────────────

    async fn on_choose_mode(&self, user_id: UserId, intent: Intent) -> Result<(), DispatchError> {
        match intent {
            Intent::Mode(ModeChoice::Bot) => {
                if !self.preferences.set(user_id, true).await {
                    return Err(DispatchError::PreferenceNotSaved { user_id });
                }
                self.conversations
                    .set(user_id, ConversationState::ChooseRole)
                    .await;
                self.reply(user_id, replies::BOT_MODE_ENABLED, Some(keyboards::role()))
                    .await;
            }
            Intent::Mode(ModeChoice::Messages) => {
                if !self.preferences.set(user_id, false).await {
                    return Err(DispatchError::PreferenceNotSaved { user_id });
                }
                self.conversations.reset(user_id).await;
                self.reply(
                    user_id,
                    replies::PASSTHROUGH_ENABLED,
                    Some(keyboards::start()),
                )
                .await;
            }
            _ => {
                self.reply(
                    user_id,
                    replies::CHOOSE_MODE_AGAIN,
                    Some(keyboards::main_menu()),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn on_choose_role(
        &self,
        event: &IncomingEvent,
        intent: Intent,
    ) -> Result<(), DispatchError> {
        let user_id = event.user_id;
        match intent {
            Intent::Role(Role::Parent) => {
                self.conversations
                    .set(
                        user_id,
                        ConversationState::ParentChooseGroup {
                            display_name: event.display_name.clone(),
                        },
                    )
                    .await;
                self.reply(user_id, replies::CHOOSE_GROUP, Some(keyboards::groups()))
                    .await;
            }
            Intent::Role(Role::Teacher) => {
                self.conversations
                    .set(user_id, ConversationState::TeacherEnterPassword)
                    .await;
                self.reply(user_id, replies::ENTER_PASSWORD, None).await;
            }
            _ => {
                self.reply(user_id, replies::CHOOSE_ROLE_AGAIN, Some(keyboards::role()))
                    .await;
            }
        }
        Ok(())
    }

    async fn on_parent_group(
        &self,
        user_id: UserId,
        display_name: String,
        text: &str,
    ) -> Result<(), DispatchError> {
        match Group::parse(text) {
            Some(group) => {
                self.conversations
                    .set(
                        user_id,
                        ConversationState::ParentEnterDate {
                            display_name,
                            group,
                        },
                    )
                    .await;
                self.reply(user_id, &replies::group_chosen(group), None)
                    .await;
            }
            None => {
                self.reply(
                    user_id,
                    replies::CHOOSE_GROUP_AGAIN,
                    Some(keyboards::groups()),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn on_parent_date(
        &self,
        user_id: UserId,
        display_name: String,
        group: Group,
        text: &str,
    ) -> Result<(), DispatchError> {
        match validate_date(text) {
            Ok(date) => {
                self.conversations
                    .set(
                        user_id,
                        ConversationState::ParentEnterName {
                            display_name,
                            group,
                            date,
                        },
                    )
                    .await;
                self.reply(user_id, replies::DATE_SAVED, None).await;
            }
            Err(e) => {
                debug!(user_id, "Rejected input: {}", ValidationError::from(e));
                self.reply(user_id, replies::date_error(e), None).await;
            }
        }
        Ok(())
    }

    /// Re-deliver every submission for the requested date, paced by the
    /// configured delay. Individual send failures are skipped.
    async fn on_teacher_date(&self, user_id: UserId, text: &str) -> Result<(), DispatchError> {
        let date = match validate_date(text) {
            Ok(date) => date,
            Err(e) => {
                debug!(user_id, "Rejected input: {}", ValidationError::from(e));
                self.reply(user_id, replies::date_error(e), None).await;
                return Ok(());
            }
        };

        let found = self.submissions.find_by_date(&date).await?;
        if found.is_empty() {
            info!(user_id, date = %date, "No materials for date");
            self.conversations.reset(user_id).await;
            self.reply(
                user_id,
                &replies::materials_not_found(date),
                Some(keyboards::teacher_restart()),
            )
            .await;
            return Ok(());
        }

        self.reply(user_id, &replies::materials_found(found.len(), date), None)
            .await;

        let mut sent = 0;
        for (i, submission) in found.iter().enumerate() {
            if i > 0 && !self.config.send_delay.is_zero() {
                tokio::time::sleep(self.config.send_delay).await;
            }
            let message = OutgoingMessage::new(user_id, replies::material(submission))
                .with_attachment(submission.video_attachment.as_str());
            match self.channel.send(message).await {
                Ok(()) => sent += 1,
                Err(e) => warn!(
                    user_id,
                    submission_id = submission.id,
                    "Failed to send material: {e}"
                ),
            }
        }

        info!(user_id, date = %date, sent, found = found.len(), "Materials delivered");
        self.conversations.reset(user_id).await;
        self.reply(
            user_id,
            &replies::retrieval_done(sent, found.len()),
            Some(keyboards::teacher_restart()),
        )
        .await;
        Ok(())
    }

    /// Send a reply. Transport failures are logged and swallowed.
    async fn reply(&self, user_id: UserId, text: &str, keyboard: Option<Keyboard>) {
        let message = OutgoingMessage::new(user_id, text).with_keyboard(keyboard);
        if let Err(e) = self.channel.send(message).await {
            error!(user_id, channel = self.channel.name(), "Failed to send reply: {e}");
        }
    }
}
