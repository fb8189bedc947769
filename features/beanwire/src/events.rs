use crate::errors::InjectionError;

/// Notification sink for non-fatal resolution failures.
///
/// Any `FnMut(&InjectionError)` closure is a sink.
pub trait ErrorSink {
    fn report(&mut self, error: &InjectionError);
}

impl<F: FnMut(&InjectionError)> ErrorSink for F {
    fn report(&mut self, error: &InjectionError) {
        self(error)
    }
}

/// Default sink: log and continue.
struct LogSink;

impl ErrorSink for LogSink {
    fn report(&mut self, error: &InjectionError) {
        tracing::error!("dependency resolution error: {error}");
    }
}

struct ChannelEntry {
    sink: Box<dyn ErrorSink>,
    once: bool,
    is_default: bool,
}

/// The single notification stream for resolution failures. A [`LogSink`] is
/// installed at construction; callers may add sinks or remove the default.
pub(crate) struct ErrorChannel {
    entries: Vec<ChannelEntry>,
}

impl ErrorChannel {
    pub(crate) fn new() -> Self {
        ErrorChannel {
            entries: vec![ChannelEntry {
                sink: Box::new(LogSink),
                once: false,
                is_default: true,
            }],
        }
    }

    pub(crate) fn on(&mut self, sink: impl ErrorSink + 'static) {
        self.entries.push(ChannelEntry {
            sink: Box::new(sink),
            once: false,
            is_default: false,
        });
    }

    pub(crate) fn once(&mut self, sink: impl ErrorSink + 'static) {
        self.entries.push(ChannelEntry {
            sink: Box::new(sink),
            once: true,
            is_default: false,
        });
    }

    pub(crate) fn remove_default_handler(&mut self) {
        self.entries.retain(|entry| !entry.is_default);
    }

    pub(crate) fn report(&mut self, error: &InjectionError) {
        for entry in &mut self.entries {
            entry.sink.report(error);
        }
        self.entries.retain(|entry| !entry.once);
    }
}
