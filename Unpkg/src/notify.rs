//! User-facing notifications
//!
//! Every processed package ends with one message. On the console it is a
//! line on standard output; with the `dialog` feature it can instead be a
//! modal message box that blocks until acknowledged. Notifiers only present
//! the message; logging it is left to the caller.

use crate::config::{NotificationConfig, NotificationMode};

/// Shows a finished message to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Prints messages to standard output.
#[derive(Debug, Clone)]
pub struct ConsoleNotifier {
    app_name: String,
}

impl ConsoleNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("{}: {message}", self.app_name);
    }
}

/// Modal message box with a single OK button.
#[cfg(feature = "dialog")]
#[derive(Debug, Clone)]
pub struct DialogNotifier {
    app_name: String,
}

#[cfg(feature = "dialog")]
impl DialogNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[cfg(feature = "dialog")]
impl Notifier for DialogNotifier {
    fn notify(&self, message: &str) {
        rfd::MessageDialog::new()
            .set_title(&self.app_name)
            .set_description(message)
            .set_level(rfd::MessageLevel::Info)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Build the notifier selected in `[notifications]`.
///
/// Dialog mode needs the `dialog` feature; without it the console is used.
pub fn from_config(config: &NotificationConfig) -> Box<dyn Notifier> {
    match config.mode {
        NotificationMode::Console => Box::new(ConsoleNotifier::new(&config.app_name)),
        #[cfg(feature = "dialog")]
        NotificationMode::Dialog => Box::new(DialogNotifier::new(&config.app_name)),
        #[cfg(not(feature = "dialog"))]
        NotificationMode::Dialog => {
            tracing::warn!("dialog notifications need the `dialog` feature, using the console");
            Box::new(ConsoleNotifier::new(&config.app_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_is_default() {
        let notifier = from_config(&NotificationConfig::default());
        notifier.notify("Extracted \"Tool.pkg\" to \"/tmp/Tool\".");
    }

    #[cfg(not(feature = "dialog"))]
    #[test]
    fn test_dialog_without_feature_falls_back() {
        let config = NotificationConfig {
            mode: NotificationMode::Dialog,
            ..NotificationConfig::default()
        };
        from_config(&config).notify("fallback");
    }
}
