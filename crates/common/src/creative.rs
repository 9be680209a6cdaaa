//! In-memory creative registry.
//!
//! Winning creatives are registered while the response is parsed and
//! rendered later by token. A creative renders at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use error_stack::Report;

use crate::auction::{Clock, CreativeRegistry, IdGenerator, RenderEntry};
use crate::error::AdapterError;
use crate::pixel::WinNoticeFirer;

pub struct InMemoryCreativeRegistry {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    firer: WinNoticeFirer,
    entries: Mutex<HashMap<String, RenderEntry>>,
}

impl InMemoryCreativeRegistry {
    #[must_use]
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>, firer: WinNoticeFirer) -> Self {
        Self {
            ids,
            clock,
            firer,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RenderEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Take the creative registered under `token` and fire its win notice.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Render`] when the token is unknown, was already
    /// rendered, or the entry expired.
    pub fn render(&self, token: &str) -> Result<String, Report<AdapterError>> {
        let entry = self.entries().remove(token).ok_or_else(|| {
            Report::new(AdapterError::Render {
                message: format!("No creative registered for token '{token}'"),
            })
        })?;

        if let Some(expiry) = entry.expiry {
            let now = self.clock.now_millis();
            if now > expiry {
                log::info!(
                    "{}: creative for request {} expired at {expiry} (now {now})",
                    entry.partner_id,
                    entry.request_id
                );
                return Err(Report::new(AdapterError::Render {
                    message: format!("Creative for token '{token}' expired"),
                }));
            }
        }

        log::debug!(
            "{}: rendering {} creative for request {}",
            entry.partner_id,
            entry.size,
            entry.request_id
        );
        self.firer.fire(&entry.pixel_url);

        Ok(entry.adm)
    }

    /// Entries registered and not yet rendered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl CreativeRegistry for InMemoryCreativeRegistry {
    fn register(&self, entry: RenderEntry) -> String {
        let token = self.ids.generate_id();
        self.entries().insert(token.clone(), entry);
        token
    }
}
