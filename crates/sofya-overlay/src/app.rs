use crate::{AppCommand, AppResult, DesktopNotifier, app_command::HELP, config::Config};

use std::{io::BufRead, sync::Arc, time::Duration};

use sofya_overlay_core::{
    ControlSurface, FileStorage, InjectionCoordinator, LocalPageHost, LogNotifier,
    ManualEngineFactory, ManualFeed, Notifier, OverlayEvent, PageHost, PageId, RuntimeInstaller,
    SessionBroadcaster, SessionStore, SystemClock, VirtualMediaSource,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

const CHANNEL_CAPACITY: usize = 32;

/// Main application state.
///
/// Owns the in-process page host and the control surface, and runs the
/// console loop on the async runtime.
pub struct App {
    pub(crate) host: Arc<LocalPageHost>,
    pub(crate) engines: Arc<ManualEngineFactory>,
    pub(crate) control: ControlSurface,
    pub(crate) events_rx: mpsc::Receiver<OverlayEvent>,
}

impl App {
    /// Wire the core components from configuration.
    #[instrument(skip(config))]
    pub(crate) fn new(config: &Config) -> AppResult<Self> {
        let session_dir = config.session_dir()?;
        let storage = FileStorage::open(&session_dir)?;
        info!(session_dir = ?session_dir, "Session store opened");

        let store = SessionStore::new(Arc::new(storage), Arc::new(SystemClock));
        let engines = Arc::new(ManualEngineFactory::new());
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let installer = RuntimeInstaller::new(
            store.clone(),
            Arc::new(VirtualMediaSource::new()),
            engines.clone(),
            events_tx,
        );
        let host = Arc::new(LocalPageHost::new(
            Arc::new(installer),
            config.injection.target_policy(),
            config.behaviour.auto_inject,
        ));

        let notifier: Arc<dyn Notifier> = if config.behaviour.desktop_notifications {
            Arc::new(DesktopNotifier)
        } else {
            Arc::new(LogNotifier)
        };

        let control = ControlSurface::new(
            InjectionCoordinator::new(
                host.clone(),
                config.injection.target_policy(),
                config.injection.retry_policy(),
            ),
            SessionBroadcaster::new(store, host.clone()),
            notifier,
        );

        Ok(Self {
            host,
            engines,
            control,
            events_rx,
        })
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Sofya Overlay starting");
        println!("Type `help` for commands.");

        // Console forwarding via single persistent blocking task.
        //
        // Shutdown: when line_rx is dropped (main loop breaks),
        // line_tx.blocking_send() fails on the next line, breaking the loop.
        let (line_tx, mut line_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let console_handle = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(line) = line_rx.recv() => {
                    match AppCommand::parse(&line) {
                        Ok(Some(AppCommand::Quit)) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Ok(Some(command)) => self.handle_command(command).await,
                        Ok(None) => {}
                        Err(e) => {
                            debug!(error = ?e, "Rejected console input");
                            println!("{}", e);
                        }
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(line_rx);

        for page in self.host.pages().await {
            self.host.close_page(page.id).await;
        }

        match tokio::time::timeout(Duration::from_secs(1), console_handle).await {
            Ok(Ok(())) => info!("Console forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Console forwarder task panicked"),
            Err(_) => info!(
                "Console forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        info!("Sofya Overlay shut down successfully");

        Ok(())
    }

    /// Execute one console command. Failures are reported, never fatal.
    #[instrument(skip(self))]
    async fn handle_command(&self, command: AppCommand) {
        match command {
            AppCommand::Open { url } => {
                let page = self.host.open_page(&url).await;
                println!("page {} opened: {}", page.id, page.url);
            }
            AppCommand::Close { page } => {
                if !self.host.close_page(page).await {
                    println!("no page {}", page);
                }
            }
            AppCommand::Focus { page } => {
                if !self.host.focus(page).await {
                    println!("no page {}", page);
                }
            }
            AppCommand::Pages => self.print_pages().await,
            AppCommand::Login { email } => {
                if let Ok((record, report)) = self.control.login(&email).await {
                    println!(
                        "logged in as {} ({} pages notified, {} unreachable)",
                        record.email, report.delivered, report.unreachable
                    );
                }
            }
            AppCommand::Logout => {
                if let Ok(report) = self.control.logout().await {
                    println!(
                        "logged out ({} pages notified, {} unreachable)",
                        report.delivered, report.unreachable
                    );
                }
            }
            AppCommand::WhoAmI => match self.control.current_user() {
                Some(user) => println!("{} (since {})", user.email, user.login_time),
                None => println!("not logged in"),
            },
            AppCommand::Show => {
                if let Ok(delivery) = self.control.show_overlay().await {
                    println!("overlay shown ({:?})", delivery);
                }
            }
            AppCommand::Gesture { page, gesture } => {
                if let Err(e) = self.host.gesture(page, gesture).await {
                    warn!(page_id = %page, error = %e, "Gesture not delivered");
                    println!("page {}: {}", page, e);
                }
            }
            AppCommand::Hear { page, text } => self.feed(page, |feed| feed.interim(&text)),
            AppCommand::Say { page, text } => self.feed(page, |feed| feed.final_text(&text)),
            AppCommand::Fail { page, reason } => self.feed(page, |feed| feed.error(&reason)),
            AppCommand::Help => println!("{}", HELP),
            AppCommand::Quit => {}
        }
    }

    fn feed(&self, page: PageId, push: impl FnOnce(&ManualFeed) -> bool) {
        match self.engines.feed(page) {
            Some(feed) => {
                if !push(&feed) {
                    println!("page {}: not listening", page);
                }
            }
            None => println!("page {}: no overlay", page),
        }
    }

    async fn print_pages(&self) {
        let active = self.host.active_page().await.map(|p| p.id);
        for page in self.host.pages().await {
            let marker = if Some(page.id) == active { "*" } else { " " };
            match self.host.overlay_state(page.id).await {
                Some(state) => println!("{} {} {} [{:?}]", marker, page.id, page.url, state),
                None => println!("{} {} {} [no overlay]", marker, page.id, page.url),
            }
        }
    }

    /// Relay an overlay event to the console; errors go to the user.
    fn handle_event(&self, event: OverlayEvent) {
        match event {
            OverlayEvent::StateChanged { page, state } => {
                debug!(page_id = %page, ?state, "Overlay state changed");
                println!("[page {}] {:?}", page, state);
            }
            OverlayEvent::Transcript { page, text } => {
                println!("[page {}] ... {}", page, text);
            }
            OverlayEvent::RecordingEnded { page, transcript } => {
                info!(page_id = %page, text_len = transcript.len(), "Recording ended");
                println!("[page {}] transcript: {}", page, transcript);
            }
            OverlayEvent::Error { page, message } => {
                error!(page_id = %page, user_message = %message, "Overlay reported an error");
                self.control.notify(&message);
            }
        }
    }
}
