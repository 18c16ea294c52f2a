//! Clipboard exposure with auto-clear
//!
//! A copied secret is cleared after a delay, but only if the clipboard still
//! holds exactly that secret. Anything the user copied in the meantime is
//! left alone, so no cancellation is needed.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// Access to a text clipboard
pub trait ClipboardBackend: Send {
    /// Current text contents; empty when the clipboard holds no text
    fn read_text(&mut self) -> Result<String>;

    /// Replace the clipboard contents
    fn write_text(&mut self, text: &str) -> Result<()>;

    /// Empty the clipboard
    fn clear(&mut self) -> Result<()>;
}

/// The OS clipboard
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| VaultError::ClipboardError(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardBackend for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        match self.inner.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(VaultError::ClipboardError(e.to_string())),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text)
            .map_err(|e| VaultError::ClipboardError(e.to_string()))
    }

    fn clear(&mut self) -> Result<()> {
        self.inner
            .clear()
            .map_err(|e| VaultError::ClipboardError(e.to_string()))
    }
}

/// Process-local clipboard for headless runs and tests
#[derive(Default)]
pub struct MemoryClipboard {
    text: Zeroizing<String>,
}

impl ClipboardBackend for MemoryClipboard {
    fn read_text(&mut self) -> Result<String> {
        Ok(self.text.to_string())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.text = Zeroizing::new(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.text = Zeroizing::new(String::new());
        Ok(())
    }
}

type SharedBackend = Arc<Mutex<Box<dyn ClipboardBackend>>>;

/// Writes secrets to the clipboard and schedules their removal
#[derive(Clone)]
pub struct ClipboardExposure {
    backend: SharedBackend,
}

impl ClipboardExposure {
    pub fn new(backend: impl ClipboardBackend + 'static) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Box::new(backend))),
        }
    }

    /// Exposure over the OS clipboard
    pub fn system() -> Result<Self> {
        Ok(Self::new(SystemClipboard::new()?))
    }

    /// Exposure over a process-local clipboard
    pub fn in_memory() -> Self {
        Self::new(MemoryClipboard::default())
    }

    /// Write `text` now and, if `clear_after` is set, clear it later when unchanged.
    ///
    /// Scheduling needs a Tokio runtime; the deferred clear is not awaited.
    pub fn expose_secret(&self, text: &str, clear_after: Option<Duration>) -> Result<()> {
        let clear_after = clear_after.filter(|d| !d.is_zero());
        let runtime = match clear_after {
            Some(_) => Some(tokio::runtime::Handle::try_current().map_err(|_| {
                VaultError::ClipboardError("auto-clear requires a running Tokio runtime".into())
            })?),
            None => None,
        };

        with_backend(&self.backend, |clipboard| clipboard.write_text(text))?;

        if let (Some(delay), Some(runtime)) = (clear_after, runtime) {
            let backend = self.backend.clone();
            let expected = Zeroizing::new(text.to_string());

            debug!("Clipboard auto-clear scheduled in {:?}", delay);
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                match clear_if_unchanged(&backend, &expected) {
                    Ok(true) => debug!("Clipboard auto-cleared"),
                    Ok(false) => debug!("Clipboard changed since copy, leaving it alone"),
                    Err(e) => warn!("Clipboard auto-clear failed: {}", e),
                }
            });
        }

        Ok(())
    }

    /// Current clipboard text
    pub fn read_text(&self) -> Result<String> {
        with_backend(&self.backend, |clipboard| clipboard.read_text())
    }

    /// Clear the clipboard unconditionally
    pub fn clear(&self) -> Result<()> {
        with_backend(&self.backend, |clipboard| clipboard.clear())
    }
}

fn with_backend<T>(
    backend: &SharedBackend,
    op: impl FnOnce(&mut dyn ClipboardBackend) -> Result<T>,
) -> Result<T> {
    let mut guard = backend
        .lock()
        .map_err(|_| VaultError::ClipboardError("clipboard lock poisoned".to_string()))?;
    op(&mut **guard)
}

/// Compare and clear under one lock, with no suspension point in between
fn clear_if_unchanged(backend: &SharedBackend, expected: &str) -> Result<bool> {
    with_backend(backend, |clipboard| {
        let current = Zeroizing::new(clipboard.read_text()?);
        if current.as_str() == expected {
            clipboard.clear()?;
            Ok(true)
        } else {
            Ok(false)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expose_is_readable_immediately() {
        let exposure = ClipboardExposure::in_memory();
        exposure
            .expose_secret("SECRET", Some(Duration::from_secs(30)))
            .unwrap();
        assert_eq!(exposure.read_text().unwrap(), "SECRET");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_clear_after_delay() {
        let exposure = ClipboardExposure::in_memory();
        exposure
            .expose_secret("SECRET", Some(Duration::from_secs(30)))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(exposure.read_text().unwrap(), "SECRET");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(exposure.read_text().unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_clear_spares_newer_contents() {
        let exposure = ClipboardExposure::in_memory();
        exposure
            .expose_secret("SECRET", Some(Duration::from_secs(30)))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        exposure.expose_secret("OTHER", None).unwrap();

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(exposure.read_text().unwrap(), "OTHER");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_means_no_clear() {
        let exposure = ClipboardExposure::in_memory();
        exposure.expose_secret("SECRET", None).unwrap();
        exposure.expose_secret("SECRET2", Some(Duration::ZERO)).unwrap();

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(exposure.read_text().unwrap(), "SECRET2");
    }

    #[tokio::test]
    async fn test_clear() {
        let exposure = ClipboardExposure::in_memory();
        exposure.expose_secret("SECRET", None).unwrap();
        exposure.clear().unwrap();
        assert_eq!(exposure.read_text().unwrap(), "");
    }

    #[test]
    fn test_auto_clear_outside_runtime_fails_without_writing() {
        let exposure = ClipboardExposure::in_memory();
        let err = exposure
            .expose_secret("SECRET", Some(Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(err, VaultError::ClipboardError(_)));
        assert_eq!(exposure.read_text().unwrap(), "");
    }
}
