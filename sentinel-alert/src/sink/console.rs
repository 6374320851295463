//! Terminal alert output

use crate::dispatch::NotificationJob;
use crate::sink::NotificationSink;
use sentinel_core::Result;
use std::io::Write;

/// Prints one alert line per event and optionally rings the terminal bell.
/// This is the audible/visible alert path in terminal mode.
pub struct ConsoleSink {
    bell: bool,
}

impl ConsoleSink {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }

    fn format_line(event: &sentinel_core::AlertEvent) -> String {
        format!(
            "[{}] WEAPON DETECTED: {} {:.2}%",
            event.raised_at.format("%H:%M:%S"),
            event.class.label().to_uppercase(),
            event.confidence * 100.0
        )
    }
}

impl NotificationSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn notify(&self, job: &NotificationJob) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", Self::format_line(&job.event))?;
        if self.bell {
            write!(stdout, "\x07")?;
        }
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{AlertEvent, WeaponClass};

    #[test]
    fn test_alert_line_format() {
        let event = AlertEvent::new(WeaponClass::Pistol, 0.934);
        let line = ConsoleSink::format_line(&event);
        assert!(line.contains("WEAPON DETECTED"));
        assert!(line.contains("PISTOL"));
        assert!(line.contains("93.40%"));
    }

    #[test]
    fn test_notify_succeeds() {
        let sink = ConsoleSink::new(false);
        sink.notify(&NotificationJob {
            event: AlertEvent::new(WeaponClass::Knife, 0.8),
            image: None,
        })
        .unwrap();
    }
}
