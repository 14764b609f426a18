use std::io::{self, BufRead, Write};

use async_trait::async_trait;

/// A titled message with one or more choices. The first action is the affirmative one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub actions: Vec<String>,
}

impl Alert {
    pub fn ok(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into(), actions: vec!["OK".into()] }
    }

    pub fn yes_no(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into(), actions: vec!["Yes".into(), "No".into()] }
    }
}

#[async_trait]
pub trait AlertSurface: Send + Sync {
    /// Returns the index of the chosen action.
    async fn show_alert(&self, alert: Alert) -> usize;
}

pub fn accepted(choice: usize) -> bool {
    choice == 0
}

/// Prints alerts on stderr. Prompts with more than one action read a y/n answer
/// from stdin unless `assume_yes` is set; anything else declines.
pub struct ConsoleAlerts {
    pub assume_yes: bool,
}

#[async_trait]
impl AlertSurface for ConsoleAlerts {
    async fn show_alert(&self, alert: Alert) -> usize {
        tracing::debug!(title = %alert.title, "alert");
        let mut err = io::stderr();
        let _ = writeln!(err, "[{}] {}", alert.title, alert.message);

        if alert.actions.len() < 2 {
            return 0;
        }
        if self.assume_yes {
            return 0;
        }
        let _ = write!(err, "{} [y/N] ", alert.actions.join("/"));
        let _ = err.flush();

        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;
        match answer {
            Ok(Ok(line)) if matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes") => 0,
            _ => alert.actions.len() - 1,
        }
    }
}

#[cfg(test)]
pub(crate) use mock::MockAlerts;

#[cfg(test)]
mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Records every alert and answers with a fixed choice.
    #[derive(Default)]
    pub struct MockAlerts {
        shown: Mutex<Vec<Alert>>,
        pub answer: usize,
    }

    impl MockAlerts {
        pub fn answering(answer: usize) -> Self {
            Self { answer, ..Self::default() }
        }

        pub fn shown(&self) -> Vec<Alert> {
            self.shown.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AlertSurface for MockAlerts {
        async fn show_alert(&self, alert: Alert) -> usize {
            self.shown.lock().unwrap().push(alert);
            self.answer
        }
    }
}
