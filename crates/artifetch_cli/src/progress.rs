use std::{
    io::{self, Write},
    sync::LazyLock,
};

use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing_subscriber::fmt::MakeWriter;

/// Returns the [`MultiProgress`] shared by every progress bar and the log
/// output, so that log lines do not tear through active bars.
pub fn global_multi_progress() -> MultiProgress {
    static GLOBAL_MP: LazyLock<MultiProgress> = LazyLock::new(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(20));
        mp
    });
    GLOBAL_MP.clone()
}

/// Prints a line above the progress bars, or to stderr if they are hidden.
pub fn println(line: impl AsRef<str>) {
    let mp = global_multi_progress();
    if mp.is_hidden() {
        eprintln!("{}", line.as_ref());
    } else {
        // Nothing sensible to do if the terminal is gone.
        let _ = mp.println(line.as_ref());
    }
}

/// Hands log output to a sink, clearing the progress bars while a line is
/// written. Hidden bars are left alone.
#[derive(Clone)]
pub struct ProgressLogWriter<M = fn() -> io::Stderr> {
    progress: MultiProgress,
    sink: M,
}

impl ProgressLogWriter {
    pub fn stderr(progress: MultiProgress) -> Self {
        Self::with_sink(progress, io::stderr)
    }
}

impl<M> ProgressLogWriter<M> {
    pub fn with_sink(progress: MultiProgress, sink: M) -> Self {
        Self { progress, sink }
    }
}

impl<'a, M> MakeWriter<'a> for ProgressLogWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = EventWriter<'a, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            progress: &self.progress,
            inner: self.sink.make_writer(),
        }
    }
}

/// Writer for a single formatted log event.
pub struct EventWriter<'a, W> {
    progress: &'a MultiProgress,
    inner: W,
}

impl<W: Write> Write for EventWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The whole event arrives at once and has to land in one piece.
        let inner = &mut self.inner;
        if self.progress.is_hidden() {
            inner.write_all(buf)?;
        } else {
            self.progress.suspend(|| inner.write_all(buf))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::{Arc, Mutex},
    };

    use indicatif::{MultiProgress, ProgressDrawTarget};
    use tracing_subscriber::{fmt, layer::SubscriberExt};

    use super::ProgressLogWriter;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_lines_reach_the_sink() {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let writer = ProgressLogWriter::with_sink(progress, move || sink.clone());
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .without_time(),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Extracting file: app.zip");
            tracing::warn!("nothing left to do");
        });

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO Extracting file: app.zip"), "{written}");
        assert!(lines[1].ends_with("WARN nothing left to do"), "{written}");
    }
}
