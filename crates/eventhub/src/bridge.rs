//! Applying an [`eventhub_config::Config`] to a hub builder.

use eventhub_config::Config;
use tracing::debug;

use crate::error::HubResult;
use crate::hub::EventHubBuilder;
use crate::mode::PublicationMode;

impl EventHubBuilder {
    /// Take the default mode and background thread name from `config`.
    ///
    /// Schedulers still have to be installed in code: a config selecting
    /// `main_thread` needs [`main_thread`](Self::main_thread) before
    /// [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`](crate::HubError::InvalidArgument)
    /// if `hub.default_mode` is not a publication mode.
    pub fn with_config(self, config: &Config) -> HubResult<Self> {
        let mode: PublicationMode = config.hub.default_mode.parse()?;
        debug!(default_mode = %mode, thread_name = %config.background.thread_name, "Applying hub config");
        Ok(self
            .default_mode(mode)
            .background_thread_name(config.background.thread_name.clone()))
    }
}
