use session_store::SessionState;

/// Navigable screens, gated by session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Onboard,
    Chat,
}

/// Decides the one screen the current session state permits.
#[must_use]
pub fn decide(session: &SessionState) -> Screen {
    if !session.is_authenticated {
        Screen::Auth
    } else if !session.is_onboarded {
        Screen::Onboard
    } else {
        Screen::Chat
    }
}

/// Maps a navigation request onto the permitted screen. A request for the
/// decided screen passes through; anything else redirects.
#[must_use]
pub fn redirect(requested: Screen, session: &SessionState) -> Screen {
    let decided = decide(session);
    if requested == decided {
        requested
    } else {
        decided
    }
}
