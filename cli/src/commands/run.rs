use std::sync::Arc;

use interlace_common::config::{Config, Verbosity};
use interlace_common::{info, success, warn};
use interlace_core::{PoolSettings, PoolState, PoolSummary, TaskGenerator, WorkerPool};
use tokio::sync::watch;

use crate::terminal::print;
use crate::terminal::progress::TerminalSink;

pub async fn run(cfg: &Config) -> anyhow::Result<PoolSummary> {
    let generator = TaskGenerator::from_config(cfg)?;
    print::banner(cfg);
    if generator.is_empty() {
        warn!("No tasks to run");
    } else {
        info!(
            "Running {} tasks on {} threads",
            generator.len(),
            cfg.threads
        );
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, stopping");
            stop_tx.send_replace(true);
        }
    });

    let show_bar = !cfg.no_bar && cfg.verbosity != Verbosity::Silent;
    let sink = Arc::new(TerminalSink::new(cfg.verbosity, show_bar));
    let pool = WorkerPool::new(PoolSettings::from(cfg));

    let result = pool.run(generator, sink, stop_rx).await;
    interrupt.abort();

    let summary = result?;
    match summary.state {
        PoolState::Cancelled => info!(
            "Stopped after {} of {} tasks",
            summary.finished(),
            summary.total
        ),
        _ => success!("Finished {} tasks in {:.2?}", summary.total, summary.elapsed),
    }
    Ok(summary)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use interlace_common::config::InputSource;
    use interlace_common::error::ValidationError;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }

    fn config(targets: &str) -> Config {
        Config {
            targets: InputSource::Inline(targets.to_string()),
            commands: InputSource::Inline("true".to_string()),
            no_bar: true,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn invalid_input_prints_nothing_before_the_error() {
        let (captured, _guard) = capture();

        let err = run(&config("10.0.0.0/40")).await.unwrap_err();

        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert!(!captured.text().contains("INTERLACE"), "{}", captured.text());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn valid_input_prints_the_banner() {
        let (captured, _guard) = capture();

        let summary = run(&config("a")).await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert!(captured.text().contains("INTERLACE"));
    }
}
