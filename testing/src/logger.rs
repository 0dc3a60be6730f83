//! A logger that accumulates messages in a vector buffer, so that tests can assert on what
//! was logged.
//!
//! # Examples
//!
//! Calling [`LoggerBuilder::init`] more than once is a no-op rather than an error.
//! ```
//! # use testing::logger;
//! # fn main() -> eyre::Result<()> {
//! logger::LoggerBuilder::default()
//!     .level(log::LevelFilter::Debug)
//!     .init()?;
//! log::info!("Info message");
//! log::trace!("Trace message");
//! log::warn!("Warn message");
//! assert_eq!(
//!     logger::clear()?,
//!     vec![
//!         String::from("[INFO]  Info message"),
//!         String::from("[WARN]  Warn message"),
//!     ]
//! );
//! log::error!("Following message");
//! assert_eq!(
//!     logger::clear()?,
//!     vec![String::from("[ERROR] Following message")]
//! );
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, RwLock};

use eyre::eyre;
use log::LevelFilter;

lazy_static::lazy_static! {
    static ref LOG_BUFFER: Arc<RwLock<Vec<String>>> = Arc::new(RwLock::new(Vec::new()));
    static ref BUFFER_INITIALIZED: Arc<RwLock<bool>> = Arc::new(RwLock::new(false));
}

/// Builds a vector logger.
pub struct LoggerBuilder {
    level: LevelFilter,
    target: Option<String>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            level: LevelFilter::Warn,
            target: None,
        }
    }
}

impl LoggerBuilder {
    /// Sets level filter.
    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Sets logging target prefix.
    #[must_use]
    pub fn target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Initializes vector logger.
    ///
    /// # Errors
    ///
    /// Fails if another logger was already installed or a lock is poisoned.
    pub fn init(self) -> eyre::Result<()> {
        let mut initialized = BUFFER_INITIALIZED
            .write()
            .map_err(|err| eyre!("{:?}", err))?;
        if !*initialized {
            let buffer = Arc::clone(&LOG_BUFFER);
            let mut dispatch = fern::Dispatch::new()
                .level(self.level)
                .chain(fern::Output::call(move |record| {
                    if let Ok(mut buffer) = buffer.write() {
                        buffer.push(format!(
                            "{:7} {}",
                            format!("[{}]", record.level()),
                            record.args()
                        ));
                    }
                }));
            if let Some(target) = self.target {
                dispatch = dispatch.filter(move |metadata| metadata.target().starts_with(&target));
            }
            dispatch.apply()?;
            *initialized = true;
        }
        Ok(())
    }
}

/// Clears the current log buffer and returns its contents.
///
/// # Errors
///
/// Fails if the buffer lock is poisoned.
pub fn clear() -> eyre::Result<Vec<String>> {
    let mut handle = LOG_BUFFER.write().map_err(|err| eyre!("{:?}", err))?;
    Ok(handle.drain(..).collect())
}
