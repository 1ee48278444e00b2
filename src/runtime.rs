use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chat_backend::{ChatBackend, Credentials, ImageRequest, OnboardingProfile, TurnId, TurnRequest};
use session_store::StoreChange;

use crate::app::{App, HostOps, ImageOutcome, Mode};
use crate::auth::AuthMode;

/// Minimum perceived latency before a reply is applied, so instant backends
/// still read as a conversation.
pub const MIN_REPLY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    TurnCompleted {
        turn_id: TurnId,
        text: Option<String>,
        image: Option<ImageOutcome>,
    },
    TurnFailed {
        turn_id: TurnId,
        error: String,
    },
    AuthCompleted {
        mode: AuthMode,
        grant: chat_backend::AuthGrant,
    },
    AuthFailed {
        mode: AuthMode,
        error: String,
    },
    OnboardingCompleted,
    OnboardingFailed {
        error: String,
    },
    StoreChanged,
}

impl AppEvent {
    fn terminal_turn_id(&self) -> Option<TurnId> {
        match self {
            Self::TurnCompleted { turn_id, .. } | Self::TurnFailed { turn_id, .. } => {
                Some(*turn_id)
            }
            _ => None,
        }
    }
}

struct ActiveTurn {
    turn_id: TurnId,
    cancel: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

/// Drives workers and funnels their results back onto the driving thread.
///
/// Workers never touch `App` directly: they enqueue [`AppEvent`]s, and the
/// caller drains the queue via [`RuntimeController::flush_pending_events`]
/// so all app mutation stays single-threaded.
pub struct RuntimeController {
    app: Arc<Mutex<App>>,
    backend: Arc<dyn ChatBackend>,
    pending_events: Arc<Mutex<VecDeque<AppEvent>>>,
    next_turn_id: AtomicU64,
    active_turn: Mutex<Option<ActiveTurn>>,
    auth_active: AtomicBool,
    onboarding_active: AtomicBool,
    render_pending: AtomicBool,
    stop_requested: AtomicBool,
    image_policy: fn(&str) -> bool,
    min_reply_delay: Duration,
}

impl RuntimeController {
    pub fn new(app: Arc<Mutex<App>>, backend: Arc<dyn ChatBackend>) -> Arc<Self> {
        Self::with_settings(app, backend, crate::app::should_generate_image, MIN_REPLY_DELAY)
    }

    /// Test seam: swap the image trigger policy or shrink the latency floor.
    pub fn with_settings(
        app: Arc<Mutex<App>>,
        backend: Arc<dyn ChatBackend>,
        image_policy: fn(&str) -> bool,
        min_reply_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            app,
            backend,
            pending_events: Arc::new(Mutex::new(VecDeque::new())),
            next_turn_id: AtomicU64::new(1),
            active_turn: Mutex::new(None),
            auth_active: AtomicBool::new(false),
            onboarding_active: AtomicBool::new(false),
            render_pending: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            image_policy,
            min_reply_delay,
        })
    }

    /// Spawns the watcher thread that turns store change notifications from
    /// other views into [`AppEvent::StoreChanged`].
    pub fn watch_store(self: &Arc<Self>, changes: Receiver<StoreChange>) {
        let controller = Arc::clone(self);
        let _ = thread::Builder::new()
            .name("persona-chat-store-watch".to_string())
            .spawn(move || {
                while changes.recv().is_ok() {
                    controller.enqueue_event(AppEvent::StoreChanged);
                }
            });
    }

    pub fn take_render_pending(&self) -> bool {
        self.render_pending.swap(false, Ordering::SeqCst)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Drains queued events and applies them to the app. Returns the number
    /// of events applied; callers re-render when it is non-zero.
    pub fn flush_pending_events(&self) -> usize {
        let mut drained = 0usize;

        loop {
            let event = {
                let mut pending_events = lock_unpoisoned(&self.pending_events);
                pending_events.pop_front()
            };

            match event {
                Some(event) => {
                    self.apply_event(event);
                    drained += 1;
                }
                None => break,
            }
        }

        if drained > 0 {
            self.render_pending.store(true, Ordering::SeqCst);
        }

        drained
    }

    fn apply_event(&self, event: AppEvent) {
        let terminal_turn = event.terminal_turn_id();

        {
            let mut app = lock_unpoisoned(&self.app);
            match event {
                AppEvent::TurnCompleted {
                    turn_id,
                    text,
                    image,
                } => app.on_turn_completed(turn_id, text, image),
                AppEvent::TurnFailed { turn_id, error } => app.on_turn_failed(turn_id, &error),
                AppEvent::AuthCompleted { mode, grant } => {
                    self.auth_active.store(false, Ordering::SeqCst);
                    app.on_auth_completed(mode, grant);
                }
                AppEvent::AuthFailed { mode, error } => {
                    self.auth_active.store(false, Ordering::SeqCst);
                    app.on_auth_failed(mode, &error);
                }
                AppEvent::OnboardingCompleted => {
                    self.onboarding_active.store(false, Ordering::SeqCst);
                    app.on_onboarding_completed();
                }
                AppEvent::OnboardingFailed { error } => {
                    self.onboarding_active.store(false, Ordering::SeqCst);
                    app.on_onboarding_failed(&error);
                }
                AppEvent::StoreChanged => app.refresh_from_store(),
            }
        }

        if let Some(turn_id) = terminal_turn {
            self.clear_active_turn_if_matching(turn_id);
        }
    }

    fn enqueue_event(self: &Arc<Self>, event: AppEvent) {
        let mut queue = lock_unpoisoned(&self.pending_events);
        queue.push_back(event);
    }

    // --- chat turn worker ---

    fn start_turn_internal(
        self: &Arc<Self>,
        question: String,
        session_id: Option<String>,
        display_name: String,
    ) -> Result<TurnId, String> {
        let mut active_turn = self.lock_active_turn();
        if active_turn.is_some() {
            return Err("Turn already active".to_string());
        }

        let turn_id = self.next_turn_id.fetch_add(1, Ordering::SeqCst);
        let cancel = Arc::new(AtomicBool::new(false));
        let request = TurnRequest {
            turn_id,
            question,
            session_id,
            display_name,
        };
        let join_handle = self.spawn_turn_worker(request, Arc::clone(&cancel))?;

        *active_turn = Some(ActiveTurn {
            turn_id,
            cancel,
            join_handle: Some(join_handle),
        });

        Ok(turn_id)
    }

    fn spawn_turn_worker(
        self: &Arc<Self>,
        request: TurnRequest,
        cancel: Arc<AtomicBool>,
    ) -> Result<JoinHandle<()>, String> {
        let turn_id = request.turn_id;
        let controller = Arc::clone(self);
        thread::Builder::new()
            .name(format!("persona-chat-turn-{turn_id}"))
            .spawn(move || controller.turn_worker(request, cancel))
            .map_err(|error| format!("Failed to spawn turn worker: {error}"))
    }

    fn turn_worker(self: Arc<Self>, request: TurnRequest, cancel: Arc<AtomicBool>) {
        let turn_id = request.turn_id;
        self.wait_for_app_turn_visibility(turn_id);

        let started = Instant::now();
        let question = request.question.clone();
        let session_id = request.session_id.clone();
        let wants_image = (self.image_policy)(&question);

        let backend = Arc::clone(&self.backend);
        let ask_outcome = catch_unwind(AssertUnwindSafe(|| {
            backend.ask(request, Arc::clone(&cancel))
        }));

        let event = match ask_outcome {
            Ok(Ok(reply)) => {
                // Image generation is strictly after the reply and strictly
                // before the reply is applied. Its failure degrades the turn
                // but never fails it.
                let image = if wants_image {
                    let image_request = ImageRequest {
                        session_id,
                        input: question,
                    };
                    Some(
                        match backend.generate_image(image_request, Arc::clone(&cancel)) {
                            Ok(url) => ImageOutcome::Generated(url),
                            Err(_) => ImageOutcome::Failed,
                        },
                    )
                } else {
                    None
                };

                AppEvent::TurnCompleted {
                    turn_id,
                    text: reply.text,
                    image,
                }
            }
            Ok(Err(error)) => AppEvent::TurnFailed { turn_id, error },
            Err(_) => AppEvent::TurnFailed {
                turn_id,
                error: "Backend panicked".to_string(),
            },
        };

        let elapsed = started.elapsed();
        if elapsed < self.min_reply_delay {
            thread::sleep(self.min_reply_delay - elapsed);
        }

        self.enqueue_event(event);
    }

    fn wait_for_app_turn_visibility(&self, turn_id: TurnId) {
        for _ in 0..256 {
            let turn_visible = {
                let app = lock_unpoisoned(&self.app);
                matches!(app.mode, Mode::AwaitingReply { turn_id: current } if current == turn_id)
            };

            if turn_visible {
                return;
            }

            thread::yield_now();
        }
    }

    fn clear_active_turn_if_matching(&self, turn_id: TurnId) {
        let mut active_turn = self.lock_active_turn();
        let matches = active_turn.as_ref().map(|active| active.turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        let mut completed = match active_turn.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    /// Signals the active turn's cancel flag. The turn still resolves
    /// through its terminal event.
    pub fn cancel_active_turn(&self) {
        let active_turn = self.lock_active_turn();
        if let Some(active_turn) = active_turn.as_ref() {
            active_turn.cancel.store(true, Ordering::SeqCst);
        }
    }

    fn lock_active_turn(&self) -> MutexGuard<'_, Option<ActiveTurn>> {
        lock_unpoisoned(&self.active_turn)
    }

    // --- auth + onboarding workers ---

    fn start_auth_internal(
        self: &Arc<Self>,
        mode: AuthMode,
        credentials: Credentials,
    ) -> Result<(), String> {
        if self.auth_active.swap(true, Ordering::SeqCst) {
            return Err("Auth request already active".to_string());
        }

        let controller = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("persona-chat-auth".to_string())
            .spawn(move || {
                let backend = Arc::clone(&controller.backend);
                let outcome = catch_unwind(AssertUnwindSafe(|| match mode {
                    AuthMode::Login => backend.login(&credentials),
                    AuthMode::Signup => backend.signup(&credentials),
                }));

                let event = match outcome {
                    Ok(Ok(grant)) => AppEvent::AuthCompleted { mode, grant },
                    Ok(Err(error)) => AppEvent::AuthFailed { mode, error },
                    Err(_) => AppEvent::AuthFailed {
                        mode,
                        error: "Backend panicked".to_string(),
                    },
                };
                controller.enqueue_event(event);
            });

        match spawned {
            Ok(_) => Ok(()),
            Err(error) => {
                self.auth_active.store(false, Ordering::SeqCst);
                Err(format!("Failed to spawn auth worker: {error}"))
            }
        }
    }

    fn start_onboarding_internal(
        self: &Arc<Self>,
        profile: OnboardingProfile,
        session_id: Option<String>,
    ) -> Result<(), String> {
        if self.onboarding_active.swap(true, Ordering::SeqCst) {
            return Err("Onboarding request already active".to_string());
        }

        let controller = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("persona-chat-onboard".to_string())
            .spawn(move || {
                let backend = Arc::clone(&controller.backend);
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    backend.submit_profile(&profile, session_id.as_deref())
                }));

                let event = match outcome {
                    Ok(Ok(())) => AppEvent::OnboardingCompleted,
                    Ok(Err(error)) => AppEvent::OnboardingFailed { error },
                    Err(_) => AppEvent::OnboardingFailed {
                        error: "Backend panicked".to_string(),
                    },
                };
                controller.enqueue_event(event);
            });

        match spawned {
            Ok(_) => Ok(()),
            Err(error) => {
                self.onboarding_active.store(false, Ordering::SeqCst);
                Err(format!("Failed to spawn onboarding worker: {error}"))
            }
        }
    }
}

impl HostOps for Arc<RuntimeController> {
    fn start_turn(
        &mut self,
        question: String,
        session_id: Option<String>,
        display_name: String,
    ) -> Result<TurnId, String> {
        self.start_turn_internal(question, session_id, display_name)
    }

    fn start_auth(&mut self, mode: AuthMode, credentials: Credentials) -> Result<(), String> {
        self.start_auth_internal(mode, credentials)
    }

    fn start_onboarding(
        &mut self,
        profile: OnboardingProfile,
        session_id: Option<String>,
    ) -> Result<(), String> {
        self.start_onboarding_internal(profile, session_id)
    }

    fn cancel_turn(&mut self) {
        self.cancel_active_turn();
    }

    fn request_render(&mut self) {
        self.render_pending.store(true, Ordering::SeqCst);
    }

    fn request_stop(&mut self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
