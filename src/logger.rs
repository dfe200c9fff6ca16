//! A [`tracing_subscriber::Layer`] appending every event to a [`File`], one line per event.
//!
//! ```no_run
//! # use entity_fs::logger::FileLogger;
//! # use entity_fs::path::Path;
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let logger = FileLogger::at(&Path::parse("/tmp/app/app.log")?)?;
//! tracing::subscriber::set_global_default(tracing_subscriber::registry().with(logger))?;
//! tracing::info!("started");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt::{self, Debug, Write as _};
use std::io::{Seek, SeekFrom, Write};

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::error::Error;
use crate::file::{File, Flags};
use crate::path::Path;
use crate::permissions::Permissions;
use crate::stream::{BufferedStream, DEFAULT_BUFFER_SIZE};

/// Writes lines formatted as `[LEVEL] message` to the end of a file, flushing after each one.
///
/// Failing to write never affects the code being traced, the error is reported on stderr instead.
pub struct FileLogger {
    stream: Mutex<BufferedStream<File>>,
}

impl FileLogger {
    /// Takes over `file`, creating it along with any missing parent directories. Existing content
    /// is kept and new lines are appended after it.
    pub fn new(mut file: File) -> Result<FileLogger, Error> {
        if !file.exists() {
            file.create(true, Permissions::FILE)?;
        }
        let mut stream = file.into_stream(Flags::WRITE, Permissions::FILE, DEFAULT_BUFFER_SIZE)?;
        stream.seek(SeekFrom::End(0))?;
        Ok(FileLogger {
            stream: Mutex::new(stream),
        })
    }

    pub fn at(path: &Path) -> Result<FileLogger, Error> {
        FileLogger::new(File::at(path)?)
    }

    pub fn log(&self, level: &Level, message: &str) {
        let mut stream = self.stream.lock();
        let result = writeln!(stream, "[{level}] {message}").and_then(|()| stream.flush());
        if let Err(error) = result {
            eprintln!("failed to write to {}: {error}", stream.get_ref());
        }
    }
}

impl<S: Subscriber> Layer<S> for FileLogger {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.log(event.metadata().level(), &visitor.into_line());
    }
}

impl Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("file", &self.stream.lock().get_ref().path())
            .finish()
    }
}

/// Collects the message of an event, followed by its other fields as `name=value` pairs.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn into_line(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        // Writing to a String can't fail.
        let _ = if field.name() == "message" {
            write!(self.message, "{value:?}")
        } else {
            write!(self.fields, " {}={value:?}", field.name())
        };
    }
}
