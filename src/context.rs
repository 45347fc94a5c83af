//! Shared state for the kcp-facing sub-commands

use crate::config::{ClientOptions, ROOT_CONTEXT};
use crate::wait::WaitOptions;
use crate::workspace::Connect;

/// Everything a kcp-facing sub-command needs to run
pub struct Context {
    pub connector: Box<dyn Connect>,
    pub wait: WaitOptions,
    /// Connection flags, forwarded to child `kubectl` processes. The
    /// context is always set so children talk to the same workspace.
    pub options: ClientOptions,
}

impl Context {
    pub fn new(connector: impl Connect + 'static, options: ClientOptions) -> Self {
        Self {
            connector: Box::new(connector),
            wait: WaitOptions::default(),
            options: options.with_default_context(ROOT_CONTEXT),
        }
    }

    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }
}
