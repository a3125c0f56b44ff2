//! # Supervisor: process lifecycle orchestration for the hub service.
//!
//! The [`Supervisor`] owns the exit gate, the task tracker, and the
//! diagnostic dumper. It creates the instance (or runs a one-shot
//! command-line operation), spawns startup on a concurrent task, waits for
//! either a signal or spontaneous instance completion, and drives graceful
//! shutdown with escalation and watchdog protection.
//!
//! ## Control flow
//! ```text
//! run(create)
//!   │
//!   ├─ create() fails ─────────────────────────────► exit 2
//!   ├─ Created::CommandLine ── op missing/failed ──► exit 3
//!   │                        └─ op succeeded ──────► exit 0
//!   └─ Created::Service
//!        ├─ logging start, spawn instance.start()   (error → force 1)
//!        ├─ initial wait loop:
//!        │     signal(DumpRequest) → dump, keep waiting
//!        │     signal(termination) → notice, break to shutdown
//!        │     instance.stopped()  → exit instance.exit_code()
//!        └─ shutdown phase (entered exactly once):
//!              spawn escalation listener (owns receiver + counter)
//!              spawn watchdog
//!              instance.stop()  (error logged, non-fatal)
//!              exit instance.exit_code()
//! ```
//!
//! ## Rules
//! - Spawned tasks are fire-and-forget; nothing is joined. The exit gate is
//!   the only synchronization point, and any task may trip it.
//! - The first termination signal transitions to shutdown exactly once;
//!   later ones only drain the escalation budget.
//! - A dump request never initiates shutdown and never touches the budget,
//!   in either phase.
//! - Forced exits race the in-flight graceful stop; whichever resolves
//!   first decides the process exit code.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::{
    config::Config,
    dump::DiagDumper,
    error::CreateError,
    escalation::EscalationCounter,
    exit::ExitGate,
    instance::{Created, Instance},
    logging::Logging,
    signals::{SignalEvent, SignalListener},
    tracker::TaskTracker,
    watchdog::Watchdog,
};

/// One-shot command-line operation succeeded, or the instance reported 0.
const CODE_OK: i32 = 0;
/// Start failure or forced exit via escalation/watchdog.
const CODE_FORCED: i32 = 1;
/// Instance creation failed.
const CODE_CREATE_FAILED: i32 = 2;
/// One-shot command-line operation unavailable or failed.
const CODE_CMDLINE_FAILED: i32 = 3;

const DUMP_ON_REQUEST: &str = "PRINTING STACK ON REQUEST";
const DUMP_ON_FORCED_EXIT: &str = "PRINTING STACK ON FORCED EXIT";
const DUMP_ON_SLOW_SHUTDOWN: &str = "PRINTING STACK - TAKING TOO LONG FOR SHUTDOWN";

/// Orchestrates instance creation, startup, the signal wait, and shutdown.
pub struct Supervisor {
    cfg: Config,
    gate: ExitGate,
    tracker: TaskTracker,
    dumper: DiagDumper,
    logging: Logging,
}

impl Supervisor {
    /// Creates a supervisor with the given config, dumping diagnostics to
    /// stderr.
    pub fn new(cfg: Config) -> Self {
        let tracker = TaskTracker::new();
        Self {
            gate: ExitGate::new(),
            dumper: DiagDumper::stderr(tracker.clone()),
            tracker,
            logging: Logging,
            cfg,
        }
    }

    /// Runs the full process lifecycle and terminates the process.
    ///
    /// Never returns: the resolved exit code goes straight to
    /// [`std::process::exit`] ([`Infallible`](std::convert::Infallible) makes
    /// that explicit in the signature). Signal handlers are registered before
    /// the instance is created, so no signal sent afterwards can be lost.
    pub async fn run<I, F>(self, create: F) -> std::convert::Infallible
    where
        I: Instance,
        F: FnOnce() -> Result<Created<I>, CreateError>,
    {
        let code = match SignalListener::listen(self.cfg.signal_capacity_clamped()) {
            Ok(signals) => self.execute(create, signals).await,
            Err(err) => {
                eprintln!("error registering signal handlers: {err}");
                CODE_FORCED
            }
        };
        std::process::exit(code)
    }

    /// Lifecycle body; returns the process exit code instead of exiting.
    async fn execute<I, F>(&self, create: F, signals: mpsc::Receiver<SignalEvent>) -> i32
    where
        I: Instance,
        F: FnOnce() -> Result<Created<I>, CreateError>,
    {
        let instance = match create() {
            Ok(Created::Service(instance)) => Arc::new(instance),
            Ok(Created::CommandLine(instance)) => return self.run_command_line(&instance).await,
            Err(err) => {
                eprintln!("{err}");
                return CODE_CREATE_FAILED;
            }
        };
        self.serve(instance, signals).await
    }

    /// Runs the requested one-shot operation; the service is never started.
    async fn run_command_line<I: Instance>(&self, instance: &I) -> i32 {
        let Some(op) = instance.command_line_operation() else {
            eprintln!("command line operation execution requested, but not set");
            return CODE_CMDLINE_FAILED;
        };
        match op.await {
            Ok(()) => CODE_OK,
            Err(err) => {
                eprintln!("{err}");
                CODE_CMDLINE_FAILED
            }
        }
    }

    /// Normal service run: races the lifecycle against the exit gate.
    async fn serve<I: Instance>(
        &self,
        instance: Arc<I>,
        signals: mpsc::Receiver<SignalEvent>,
    ) -> i32 {
        self.logging.start();
        self.spawn_startup(&instance);

        tokio::select! {
            code = self.gate.forced() => code,
            code = self.drive(instance, signals) => code,
        }
    }

    /// Launches instance startup on a concurrent task.
    ///
    /// A startup failure races the main wait to trip the gate; the gate makes
    /// that race safe.
    fn spawn_startup<I: Instance>(&self, instance: &Arc<I>) {
        let gate = self.gate.clone();
        let guard = self.tracker.register("startup");
        let instance = Arc::clone(instance);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(err) = instance.start().await {
                eprintln!("{err}");
                gate.force(CODE_FORCED);
            }
        });
    }

    /// Initial wait: a signal arrives, or the instance stops on its own.
    async fn drive<I: Instance>(
        &self,
        instance: Arc<I>,
        mut signals: mpsc::Receiver<SignalEvent>,
    ) -> i32 {
        loop {
            tokio::select! {
                ev = signals.recv() => match ev {
                    Some(SignalEvent::DumpRequest) => {
                        self.dumper.dump_or_log(DUMP_ON_REQUEST);
                    }
                    Some(sig) => {
                        println!(" <INTERRUPT>"); // CLI output.
                        warn!(
                            signal = ?sig,
                            service = self.cfg.service_name,
                            "program was interrupted, stopping"
                        );
                        break;
                    }
                    None => {
                        // Listener gone; only the instance can end the run now.
                        instance.stopped().await;
                        self.logging.shutdown();
                        return instance.exit_code();
                    }
                },
                _ = instance.stopped() => {
                    // The instance halted itself; no stop() call is made.
                    self.logging.shutdown();
                    return instance.exit_code();
                }
            }
        }
        self.shutdown(instance, signals).await
    }

    /// Shutdown phase: escalation and watchdog race the graceful stop.
    async fn shutdown<I: Instance>(
        &self,
        instance: Arc<I>,
        signals: mpsc::Receiver<SignalEvent>,
    ) -> i32 {
        self.spawn_escalation(signals);
        self.spawn_watchdog();

        if let Err(err) = instance.stop().await {
            error!(err = %err, label = err.as_label(), "graceful stop failed");
        }
        self.logging.shutdown();
        instance.exit_code()
    }

    /// Keeps listening for signals during shutdown.
    ///
    /// Owns the receiver and the escalation counter; each termination-kind
    /// signal drains the budget, a dump request only dumps.
    fn spawn_escalation(&self, mut signals: mpsc::Receiver<SignalEvent>) {
        let gate = self.gate.clone();
        let dumper = self.dumper.clone();
        let mut counter = EscalationCounter::new(self.cfg.escalation_budget);
        let guard = self.tracker.register("escalation");
        tokio::spawn(async move {
            let _guard = guard;
            while let Some(ev) = signals.recv().await {
                if !ev.is_termination() {
                    dumper.dump_or_log(DUMP_ON_REQUEST);
                    continue;
                }
                let left = counter.on_termination();
                if left > 0 {
                    println!(" <INTERRUPT> again, but already shutting down - {left} more to force");
                } else {
                    dumper.dump_or_log(DUMP_ON_FORCED_EXIT);
                    gate.force(CODE_FORCED);
                    return;
                }
            }
        });
    }

    /// Arms the single-shot shutdown deadline.
    fn spawn_watchdog(&self) {
        let gate = self.gate.clone();
        let dumper = self.dumper.clone();
        let dog = Watchdog::new(self.cfg.watchdog);
        let guard = self.tracker.register("watchdog");
        tokio::spawn(async move {
            let _guard = guard;
            dog.expired().await;
            dumper.dump_or_log(DUMP_ON_SLOW_SHUTDOWN);
            gate.force(CODE_FORCED);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstanceError;

    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::future::BoxFuture;
    use tokio::sync::watch;
    use tokio::time::sleep;

    #[derive(Clone, Copy)]
    enum StopBehavior {
        Succeed,
        Fail,
        Hang,
    }

    #[derive(Clone, Copy)]
    enum CmdLineOp {
        Unset,
        Succeeds,
        Fails,
    }

    struct MockState {
        start_fails: bool,
        stop: StopBehavior,
        cmdline: CmdLineOp,
        exit_code: i32,
        stop_called: AtomicBool,
        halted_tx: watch::Sender<bool>,
    }

    #[derive(Clone)]
    struct MockInstance(Arc<MockState>);

    impl MockInstance {
        fn new(stop: StopBehavior, exit_code: i32) -> Self {
            let (halted_tx, _) = watch::channel(false);
            Self(Arc::new(MockState {
                start_fails: false,
                stop,
                cmdline: CmdLineOp::Unset,
                exit_code,
                stop_called: AtomicBool::new(false),
                halted_tx,
            }))
        }

        fn failing_start() -> Self {
            let (halted_tx, _) = watch::channel(false);
            Self(Arc::new(MockState {
                start_fails: true,
                stop: StopBehavior::Hang,
                cmdline: CmdLineOp::Unset,
                exit_code: 0,
                stop_called: AtomicBool::new(false),
                halted_tx,
            }))
        }

        fn with_cmdline(cmdline: CmdLineOp) -> Self {
            let (halted_tx, _) = watch::channel(false);
            Self(Arc::new(MockState {
                start_fails: false,
                stop: StopBehavior::Hang,
                cmdline,
                exit_code: 0,
                stop_called: AtomicBool::new(false),
                halted_tx,
            }))
        }

        /// Simulates the instance halting on its own.
        fn halt(&self) {
            // send_replace stores the value even with no live receivers.
            self.0.halted_tx.send_replace(true);
        }

        fn stop_called(&self) -> bool {
            self.0.stop_called.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Instance for MockInstance {
        async fn start(&self) -> Result<(), InstanceError> {
            if self.0.start_fails {
                Err(InstanceError::Start {
                    reason: "bind failed".into(),
                })
            } else {
                Ok(())
            }
        }

        async fn stop(&self) -> Result<(), InstanceError> {
            self.0.stop_called.store(true, Ordering::SeqCst);
            match self.0.stop {
                StopBehavior::Succeed => {
                    self.halt();
                    Ok(())
                }
                StopBehavior::Fail => {
                    self.halt();
                    Err(InstanceError::Stop {
                        reason: "workers busy".into(),
                    })
                }
                StopBehavior::Hang => std::future::pending().await,
            }
        }

        async fn stopped(&self) {
            let mut rx = self.0.halted_tx.subscribe();
            let _ = rx.wait_for(|halted| *halted).await;
        }

        fn exit_code(&self) -> i32 {
            self.0.exit_code
        }

        fn command_line_operation(&self) -> Option<BoxFuture<'_, Result<(), InstanceError>>> {
            match self.0.cmdline {
                CmdLineOp::Unset => None,
                CmdLineOp::Succeeds => Some(Box::pin(async { Ok(()) })),
                CmdLineOp::Fails => Some(Box::pin(async {
                    Err(InstanceError::CmdLine {
                        reason: "bad args".into(),
                    })
                })),
            }
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn count_dumps(&self, label: &str) -> usize {
            let header = format!("===== {label} =====");
            self.contents().lines().filter(|l| *l == header).count()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn test_supervisor(cfg: Config) -> (Supervisor, SharedBuf) {
        let tracker = TaskTracker::new();
        let buf = SharedBuf::default();
        let sup = Supervisor {
            gate: ExitGate::new(),
            dumper: DiagDumper::new(tracker.clone(), buf.clone()),
            tracker,
            logging: Logging,
            cfg,
        };
        (sup, buf)
    }

    fn sig_channel() -> (mpsc::Sender<SignalEvent>, mpsc::Receiver<SignalEvent>) {
        mpsc::channel(8)
    }

    /// Long enough that the watchdog never interferes with real-time tests.
    fn patient() -> Config {
        Config {
            watchdog: Duration::from_secs(3600),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn create_failure_exits_2() {
        let (sup, _) = test_supervisor(patient());
        let (_tx, rx) = sig_channel();
        let code = sup
            .execute(
                || -> Result<Created<MockInstance>, CreateError> {
                    Err(CreateError::new("no data dir"))
                },
                rx,
            )
            .await;
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn cmdline_unavailable_exits_3() {
        let (sup, _) = test_supervisor(patient());
        let (_tx, rx) = sig_channel();
        let mock = MockInstance::with_cmdline(CmdLineOp::Unset);
        let code = sup
            .execute(|| Ok(Created::CommandLine(mock.clone())), rx)
            .await;
        assert_eq!(code, 3);
        assert!(!mock.stop_called());
    }

    #[tokio::test]
    async fn cmdline_success_exits_0() {
        let (sup, _) = test_supervisor(patient());
        let (_tx, rx) = sig_channel();
        let mock = MockInstance::with_cmdline(CmdLineOp::Succeeds);
        let code = sup
            .execute(|| Ok(Created::CommandLine(mock.clone())), rx)
            .await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn cmdline_failure_exits_3() {
        let (sup, _) = test_supervisor(patient());
        let (_tx, rx) = sig_channel();
        let mock = MockInstance::with_cmdline(CmdLineOp::Fails);
        let code = sup
            .execute(|| Ok(Created::CommandLine(mock.clone())), rx)
            .await;
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn spontaneous_stop_skips_stop_call() {
        let (sup, _) = test_supervisor(patient());
        let (_tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Hang, 7);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };
        sleep(Duration::from_millis(50)).await;
        mock.halt();

        assert_eq!(handle.await.unwrap(), 7);
        assert!(!mock.stop_called());
    }

    #[tokio::test]
    async fn dump_requests_do_not_begin_shutdown() {
        let (sup, buf) = test_supervisor(patient());
        let (tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Hang, 0);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };

        tx.send(SignalEvent::DumpRequest).await.unwrap();
        tx.send(SignalEvent::DumpRequest).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        assert_eq!(buf.count_dumps(DUMP_ON_REQUEST), 2);

        mock.halt();
        assert_eq!(handle.await.unwrap(), 0);
        assert!(!mock.stop_called());
    }

    #[tokio::test]
    async fn termination_runs_graceful_stop_roundtrip() {
        let (sup, _) = test_supervisor(patient());
        let (tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Succeed, 0);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };
        tx.send(SignalEvent::Terminate).await.unwrap();

        assert_eq!(handle.await.unwrap(), 0);
        assert!(mock.stop_called());
    }

    #[tokio::test]
    async fn stop_error_is_nonfatal() {
        let (sup, _) = test_supervisor(patient());
        let (tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Fail, 0);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };
        tx.send(SignalEvent::Interrupt).await.unwrap();

        // The stop error is logged; the instance's own code still wins.
        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn instance_exit_code_passes_through() {
        let (sup, _) = test_supervisor(patient());
        let (tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Succeed, 42);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };
        tx.send(SignalEvent::Hangup).await.unwrap();

        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn start_failure_forces_exit_1() {
        let (sup, _) = test_supervisor(patient());
        let (_tx, rx) = sig_channel();
        let mock = MockInstance::failing_start();

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };

        assert_eq!(handle.await.unwrap(), 1);
        assert!(!mock.stop_called());
    }

    #[tokio::test]
    async fn escalation_forces_after_budget_is_drained() {
        let (sup, buf) = test_supervisor(patient());
        let (tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Hang, 0);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };

        // First termination signal begins shutdown; stop() hangs forever.
        tx.send(SignalEvent::Interrupt).await.unwrap();

        // Four more drain the budget from 5 to 1 without forcing.
        for _ in 0..4 {
            tx.send(SignalEvent::Interrupt).await.unwrap();
        }
        sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());

        // A dump request in the middle must not drain the budget.
        tx.send(SignalEvent::DumpRequest).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        assert_eq!(buf.count_dumps(DUMP_ON_REQUEST), 1);

        // The fifth strike forces exit 1 after a dump.
        tx.send(SignalEvent::Quit).await.unwrap();
        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(buf.count_dumps(DUMP_ON_FORCED_EXIT), 1);
    }

    #[tokio::test]
    async fn watchdog_forces_exit_1_when_stop_hangs() {
        let cfg = Config {
            watchdog: Duration::from_millis(100),
            ..Config::default()
        };
        let (sup, buf) = test_supervisor(cfg);
        let (tx, rx) = sig_channel();
        let mock = MockInstance::new(StopBehavior::Hang, 0);

        let handle = {
            let mock = mock.clone();
            tokio::spawn(async move { sup.execute(|| Ok(Created::Service(mock)), rx).await })
        };
        tx.send(SignalEvent::Terminate).await.unwrap();

        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(buf.count_dumps(DUMP_ON_SLOW_SHUTDOWN), 1);
    }
}
