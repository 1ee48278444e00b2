use chat_backend::{AuthGrant, Credentials, OnboardingProfile, TurnId};
use session_store::{ChatMessage, SessionState, SessionStore};

use crate::auth::{AuthForm, AuthMode};
use crate::commands::{parse_slash_command, SlashCommand};
use crate::guard::{self, Screen};
use crate::onboarding::OnboardingWizard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    AwaitingReply { turn_id: TurnId },
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// One user-visible acknowledgment or error. The next alert replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
}

/// Outcome of the dependent image sub-call within a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Generated(String),
    Failed,
}

pub trait HostOps {
    fn start_turn(
        &mut self,
        question: String,
        session_id: Option<String>,
        display_name: String,
    ) -> Result<TurnId, String>;
    fn start_auth(&mut self, mode: AuthMode, credentials: Credentials) -> Result<(), String>;
    fn start_onboarding(
        &mut self,
        profile: OnboardingProfile,
        session_id: Option<String>,
    ) -> Result<(), String>;
    fn cancel_turn(&mut self);
    fn request_render(&mut self);
    fn request_stop(&mut self);
}

const HELP_TEXT: &str = "Commands: /help, /clear, /cancel, /profile, /logout, /quit";
const ERROR_TURN_ALREADY_ACTIVE: &str = "Turn already active";

pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";
pub const MISSING_REPLY_TEXT: &str = "Sorry, I didn't understand that.";
pub const IMAGE_SUCCESS_NOTE: &str = "\n\n**🖼️ Image generated successfully!**";
pub const IMAGE_FAILURE_NOTE: &str = "\n\n🚫 Failed to generate image.";

pub const ALERT_LOGIN_SUCCESS: &str = "Login successful!";
pub const ALERT_SIGNUP_SUCCESS: &str = "Registration successful!";
pub const ALERT_ONBOARDING_COMPLETE: &str = "Onboarding complete! Redirecting...";
pub const ALERT_LOGGED_OUT: &str = "Logged out successfully";
pub const ALERT_CHAT_CLEARED: &str = "Chat cleared";

/// Decides whether a question additionally triggers image generation.
/// Deliberately naive: any case-insensitive occurrence of "image".
pub fn should_generate_image(question: &str) -> bool {
    question.to_lowercase().contains("image")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingAuth {
    mode: AuthMode,
    submitted_full_name: Option<String>,
}

/// Application state machine: the gated screen, the auth form, the
/// onboarding wizard, and the chat turn pipeline. All mutation happens on
/// the driving thread; workers report back through the runtime event queue.
pub struct App {
    store: SessionStore,
    pub screen: Screen,
    pub mode: Mode,
    pub input: String,
    pub alert: Option<Alert>,
    pub notices: Vec<String>,
    pub auth_form: AuthForm,
    pub wizard: OnboardingWizard,
    pending_auth: Option<PendingAuth>,
    onboarding_in_flight: bool,
    pub should_exit: bool,
}

impl App {
    pub fn new(store: SessionStore) -> Self {
        let screen = guard::decide(&store.session());
        Self {
            store,
            screen,
            mode: Mode::Idle,
            input: String::new(),
            alert: None,
            notices: Vec::new(),
            auth_form: AuthForm::default(),
            wizard: OnboardingWizard::new(),
            pending_auth: None,
            onboarding_in_flight: false,
            should_exit: false,
        }
    }

    pub fn session(&self) -> SessionState {
        self.store.session()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    /// The typing indicator is derived from the mode, never stored.
    pub fn typing(&self) -> bool {
        matches!(self.mode, Mode::AwaitingReply { .. })
    }

    /// True while any worker-backed request (turn, auth, onboarding) has
    /// not yet resolved to its terminal event.
    pub fn busy(&self) -> bool {
        self.typing() || self.pending_auth.is_some() || self.onboarding_in_flight
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn on_input_replace(&mut self, text: String) {
        self.input = text;
    }

    fn push_alert(&mut self, message: impl Into<String>, severity: Severity) {
        self.alert = Some(Alert {
            message: message.into(),
            severity,
        });
    }

    fn push_notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    fn on_store_error(&mut self, context: &str, error: &session_store::SessionStoreError) {
        self.push_alert(format!("{context}: {error}"), Severity::Error);
    }

    // --- auth flow ---

    /// Validates the auth form and dispatches one identity request.
    pub fn submit_auth(&mut self, host: &mut dyn HostOps) {
        if self.pending_auth.is_some() {
            self.push_notice("Request already in flight, please wait.");
            host.request_render();
            return;
        }

        let credentials = match self.auth_form.validate() {
            Ok(credentials) => credentials,
            Err(message) => {
                self.push_alert(message, Severity::Warning);
                host.request_render();
                return;
            }
        };

        let mode = self.auth_form.mode;
        let submitted_full_name = credentials.full_name.clone();
        match host.start_auth(mode, credentials) {
            Ok(()) => {
                self.pending_auth = Some(PendingAuth {
                    mode,
                    submitted_full_name,
                });
            }
            Err(error) => self.push_alert(error, Severity::Error),
        }

        host.request_render();
    }

    pub fn on_auth_completed(&mut self, mode: AuthMode, grant: AuthGrant) {
        let Some(pending) = self.pending_auth.take() else {
            return;
        };
        if pending.mode != mode {
            return;
        }

        // The service-reported name wins; signup falls back to the form.
        let display_name = grant
            .full_name
            .or(pending.submitted_full_name)
            .unwrap_or_else(|| SessionState::default().display_name);

        let already_onboarded = mode == AuthMode::Login;
        if let Err(error) = self.store.login(grant.token, display_name, already_onboarded) {
            self.on_store_error("Failed to persist session", &error);
            return;
        }

        self.auth_form = AuthForm::default();
        self.push_alert(
            match mode {
                AuthMode::Login => ALERT_LOGIN_SUCCESS,
                AuthMode::Signup => ALERT_SIGNUP_SUCCESS,
            },
            Severity::Success,
        );
        self.screen = guard::decide(&self.store.session());
    }

    pub fn on_auth_failed(&mut self, mode: AuthMode, error: &str) {
        let Some(pending) = self.pending_auth.take() else {
            return;
        };
        if pending.mode != mode {
            self.pending_auth = Some(pending);
            return;
        }

        self.push_alert(error, Severity::Error);
    }

    // --- onboarding flow ---

    /// Submits the accumulated profile once the wizard permits finishing.
    pub fn submit_onboarding(&mut self, host: &mut dyn HostOps) {
        if self.onboarding_in_flight {
            self.push_notice("Request already in flight, please wait.");
            host.request_render();
            return;
        }

        if !self.wizard.can_finish() {
            self.push_alert("Please add at least one theme", Severity::Warning);
            host.request_render();
            return;
        }

        let profile = self.wizard.profile().clone();
        let session_id = self.store.session_id().map(str::to_string);
        match host.start_onboarding(profile, session_id) {
            Ok(()) => self.onboarding_in_flight = true,
            Err(error) => self.push_alert(error, Severity::Error),
        }

        host.request_render();
    }

    pub fn on_onboarding_completed(&mut self) {
        if !self.onboarding_in_flight {
            return;
        }
        self.onboarding_in_flight = false;

        if let Err(error) = self.store.complete_onboarding() {
            self.on_store_error("Failed to persist onboarding", &error);
            return;
        }

        self.wizard.mark_submitted();
        self.push_alert(ALERT_ONBOARDING_COMPLETE, Severity::Success);
        self.screen = guard::decide(&self.store.session());
    }

    /// A failed submission keeps the wizard on its last step with all
    /// collected answers intact, so the user can retry.
    pub fn on_onboarding_failed(&mut self, error: &str) {
        if !self.onboarding_in_flight {
            return;
        }
        self.onboarding_in_flight = false;
        self.push_alert(error, Severity::Error);
    }

    // --- chat pipeline ---

    pub fn on_submit(&mut self, host: &mut dyn HostOps) {
        let submitted = std::mem::take(&mut self.input);
        let text = submitted.trim().to_string();

        if text.is_empty() {
            host.request_render();
            return;
        }

        if let Some(command) = parse_slash_command(&text) {
            self.apply_command(command, host);
            return;
        }

        if self.screen != Screen::Chat {
            self.push_notice("Sign in to chat.");
            host.request_render();
            return;
        }

        if matches!(self.mode, Mode::AwaitingReply { .. }) {
            self.push_notice("A reply is still pending, please wait.");
            host.request_render();
            return;
        }

        if let Err(error) = self.store.append_message(ChatMessage::user(text.clone())) {
            self.on_store_error("Failed to persist message", &error);
            host.request_render();
            return;
        }

        let session_id = self.store.session_id().map(str::to_string);
        let display_name = self.store.display_name().to_string();
        match host.start_turn(text.clone(), session_id, display_name) {
            Ok(turn_id) => {
                self.mode = Mode::AwaitingReply { turn_id };
            }
            Err(error) => {
                if error == ERROR_TURN_ALREADY_ACTIVE {
                    self.rollback_submitted_user_message(&text);
                    self.push_notice("A reply is still pending, please wait.");
                } else {
                    self.on_turn_failed_now(&error);
                }
            }
        }

        host.request_render();
    }

    fn rollback_submitted_user_message(&mut self, text: &str) {
        let matches_last = self
            .store
            .messages()
            .last()
            .is_some_and(|message| message.sender == session_store::Sender::User && message.text == text);
        if !matches_last {
            return;
        }

        let mut messages: Vec<ChatMessage> = self.store.messages().to_vec();
        messages.pop();
        if let Err(error) = self.store.clear_messages() {
            self.on_store_error("Failed to persist message", &error);
            return;
        }
        for message in messages {
            if let Err(error) = self.store.append_message(message) {
                self.on_store_error("Failed to persist message", &error);
                return;
            }
        }
    }

    fn apply_command(&mut self, command: SlashCommand, host: &mut dyn HostOps) {
        match command {
            SlashCommand::Help => {
                self.push_notice(HELP_TEXT);
                host.request_render();
            }
            SlashCommand::Clear => {
                self.clear_chat();
                host.request_render();
            }
            SlashCommand::Cancel => {
                if self.typing() {
                    host.cancel_turn();
                    self.push_notice("Cancelling the current reply.");
                } else {
                    self.push_notice("No reply in progress.");
                }
                host.request_render();
            }
            SlashCommand::Profile => {
                let session = self.store.session();
                let session_id = self.store.session_id().unwrap_or("-").to_string();
                self.push_notice(format!(
                    "Signed in as {} (session {session_id})",
                    session.display_name
                ));
                host.request_render();
            }
            SlashCommand::Logout => {
                self.logout();
                host.request_render();
            }
            SlashCommand::Quit => {
                self.on_quit(host);
            }
            SlashCommand::Unknown(command) => {
                self.push_notice(format!("Unknown command: {command}"));
                host.request_render();
            }
        }
    }

    pub fn on_quit(&mut self, host: &mut dyn HostOps) {
        self.mode = Mode::Exiting;
        self.should_exit = true;
        host.request_stop();
        host.request_render();
    }

    /// Applies a completed turn: composes the bot message from the reply
    /// text and the image outcome, persists it, and clears typing.
    pub fn on_turn_completed(
        &mut self,
        turn_id: TurnId,
        text: Option<String>,
        image: Option<ImageOutcome>,
    ) {
        if !self.is_active_turn(turn_id) {
            return;
        }

        let mut reply = text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| MISSING_REPLY_TEXT.to_string());

        let image_url = match image {
            Some(ImageOutcome::Generated(url)) => {
                reply.push_str(IMAGE_SUCCESS_NOTE);
                Some(url)
            }
            Some(ImageOutcome::Failed) => {
                reply.push_str(IMAGE_FAILURE_NOTE);
                None
            }
            None => None,
        };

        if let Err(error) = self.store.append_message(ChatMessage::bot(reply, image_url)) {
            self.on_store_error("Failed to persist reply", &error);
        }

        self.mode = Mode::Idle;
    }

    /// A failed turn resolves to exactly one fixed fallback bot message.
    pub fn on_turn_failed(&mut self, turn_id: TurnId, error: &str) {
        if !self.is_active_turn(turn_id) {
            return;
        }

        self.on_turn_failed_now(error);
    }

    fn on_turn_failed_now(&mut self, _error: &str) {
        if let Err(error) = self
            .store
            .append_message(ChatMessage::bot(FALLBACK_REPLY, None))
        {
            self.on_store_error("Failed to persist reply", &error);
        }

        self.mode = Mode::Idle;
    }

    pub fn clear_chat(&mut self) {
        match self.store.clear_messages() {
            Ok(()) => self.push_alert(ALERT_CHAT_CLEARED, Severity::Success),
            Err(error) => self.on_store_error("Failed to clear chat", &error),
        }
    }

    /// Logs out: the store resets session and history atomically, any turn
    /// still in flight becomes stale, and the guard sends us back to auth.
    pub fn logout(&mut self) {
        match self.store.logout() {
            Ok(()) => {
                self.mode = Mode::Idle;
                self.wizard = OnboardingWizard::new();
                self.push_alert(ALERT_LOGGED_OUT, Severity::Success);
                self.screen = guard::decide(&self.store.session());
            }
            Err(error) => self.on_store_error("Failed to log out", &error),
        }
    }

    /// Re-reads the persisted document after an external write and
    /// re-derives the permitted screen. Last write wins.
    pub fn refresh_from_store(&mut self) {
        if let Err(error) = self.store.reload() {
            self.on_store_error("Failed to reload session", &error);
            return;
        }

        self.screen = guard::redirect(self.screen, &self.store.session());
    }

    fn is_active_turn(&self, turn_id: TurnId) -> bool {
        matches!(self.mode, Mode::AwaitingReply { turn_id: active } if active == turn_id)
    }
}
