use chat_backend::{Credentials, OnboardingProfile, TurnId};
use persona_chat::app::{App, HostOps, ImageOutcome, Mode};
use persona_chat::auth::AuthMode;
use session_store::{state_file, Sender, SessionStore};
use tempfile::TempDir;

struct HostStub {
    next_turn_id: TurnId,
}

impl HostStub {
    fn new(next_turn_id: TurnId) -> Self {
        Self { next_turn_id }
    }
}

impl HostOps for HostStub {
    fn start_turn(
        &mut self,
        _question: String,
        _session_id: Option<String>,
        _display_name: String,
    ) -> Result<TurnId, String> {
        Ok(self.next_turn_id)
    }

    fn start_auth(&mut self, _mode: AuthMode, _credentials: Credentials) -> Result<(), String> {
        Ok(())
    }

    fn start_onboarding(
        &mut self,
        _profile: OnboardingProfile,
        _session_id: Option<String>,
    ) -> Result<(), String> {
        Ok(())
    }

    fn cancel_turn(&mut self) {}

    fn request_render(&mut self) {}

    fn request_stop(&mut self) {}
}

fn chat_app(dir: &TempDir) -> App {
    let mut store = SessionStore::open(&state_file(dir.path())).expect("store opens");
    store.login("tok-1", "Ada", true).expect("login persists");
    App::new(store)
}

#[test]
fn stale_turn_completions_are_ignored_while_a_different_turn_is_active() {
    let stale_turn = 10;
    let active_turn = 20;

    let dir = TempDir::new().expect("temp dir");
    let mut app = chat_app(&dir);
    let mut host = HostStub::new(active_turn);

    app.on_input_replace("active question".to_string());
    app.on_submit(&mut host);
    assert_eq!(app.mode, Mode::AwaitingReply { turn_id: active_turn });

    let messages_before = app.messages().len();

    app.on_turn_completed(stale_turn, Some("stale reply".to_string()), None);
    app.on_turn_completed(
        stale_turn,
        Some("stale image reply".to_string()),
        Some(ImageOutcome::Generated("https://img/stale.png".to_string())),
    );
    app.on_turn_failed(stale_turn, "stale error");

    assert_eq!(app.messages().len(), messages_before);
    assert_eq!(app.mode, Mode::AwaitingReply { turn_id: active_turn });

    app.on_turn_completed(active_turn, Some("live reply".to_string()), None);
    assert_eq!(app.mode, Mode::Idle);
    let last = app.messages().last().expect("bot reply appended");
    assert_eq!(last.sender, Sender::Bot);
    assert_eq!(last.text, "live reply");
}

#[test]
fn completions_after_the_turn_resolved_are_ignored() {
    let dir = TempDir::new().expect("temp dir");
    let mut app = chat_app(&dir);
    let mut host = HostStub::new(5);

    app.on_input_replace("question".to_string());
    app.on_submit(&mut host);
    app.on_turn_completed(5, Some("reply".to_string()), None);

    let messages_before = app.messages().len();
    app.on_turn_completed(5, Some("duplicate reply".to_string()), None);
    app.on_turn_failed(5, "late error");

    assert_eq!(app.messages().len(), messages_before);
    assert_eq!(app.mode, Mode::Idle);
}
