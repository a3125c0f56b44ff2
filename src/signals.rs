//! # Cross-platform OS signal listener.
//!
//! Provides [`SignalListener`], which registers interest in termination and
//! diagnostic signals and delivers them as a buffered stream of
//! [`SignalEvent`]s.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGHUP` (terminal hangup)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for hard stop)
//! - `SIGUSR1` (diagnostic dump request; never initiates shutdown)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`], delivered as
//!   [`SignalEvent::Interrupt`]
//!
//! ## Rules
//! - Handlers are registered inside [`SignalListener::listen`], before it
//!   returns; a signal arriving between registration and the first `recv()`
//!   is buffered, never lost.
//! - Delivery is FIFO. The forwarding task awaits channel capacity instead of
//!   dropping, so back-to-back signals during the escalation window all
//!   arrive.

use tokio::sync::mpsc;

/// A termination or diagnostic request received from the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// `SIGINT` / Ctrl-C.
    Interrupt,
    /// `SIGHUP`.
    Hangup,
    /// `SIGTERM`.
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGUSR1`: write a diagnostic dump and keep running.
    DumpRequest,
}

impl SignalEvent {
    /// Returns `true` for signals that request shutdown.
    ///
    /// All kinds except [`SignalEvent::DumpRequest`] are treated identically
    /// as "begin shutdown" triggers.
    #[inline]
    pub fn is_termination(self) -> bool {
        !matches!(self, SignalEvent::DumpRequest)
    }
}

/// Registers OS signal handlers and forwards deliveries into a bounded
/// channel.
pub struct SignalListener;

impl SignalListener {
    /// Registers all signal handlers and returns the event stream.
    ///
    /// Registration happens before this function returns, so callers that
    /// `listen()` before entering their wait loop cannot miss a signal sent
    /// in between. Each call creates independent listeners.
    ///
    /// Returns `Err` only if signal registration fails.
    #[cfg(unix)]
    pub fn listen(capacity: usize) -> std::io::Result<mpsc::Receiver<SignalEvent>> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigquit = signal(SignalKind::quit())?;
        let mut sigusr1 = signal(SignalKind::user_defined1())?;

        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(async move {
            loop {
                let ev = tokio::select! {
                    _ = sigint.recv()  => SignalEvent::Interrupt,
                    _ = sighup.recv()  => SignalEvent::Hangup,
                    _ = sigterm.recv() => SignalEvent::Terminate,
                    _ = sigquit.recv() => SignalEvent::Quit,
                    _ = sigusr1.recv() => SignalEvent::DumpRequest,
                };
                // Receiver dropped means the process is exiting.
                if tx.send(ev).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    /// Registers a Ctrl-C handler and returns the event stream.
    ///
    /// Non-Unix platforms only observe [`SignalEvent::Interrupt`].
    #[cfg(not(unix))]
    pub fn listen(capacity: usize) -> std::io::Result<mpsc::Receiver<SignalEvent>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(SignalEvent::Interrupt).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}
