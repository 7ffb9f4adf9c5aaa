use std::collections::HashMap;

/// Bidirectional mapping between public url-params and durable thread ids.
///
/// A thread may be addressed by a short shareable slug while internally keyed
/// by a stable id; the mapping arrives on the `navigation` event, so lookups
/// before that event resolve to nothing rather than failing.
#[derive(Debug, Default)]
pub struct IdentityMap {
    by_url_param: HashMap<String, String>,
    by_thread: HashMap<String, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a mapping. Last write wins.
    pub fn bind(&mut self, url_param: impl Into<String>, thread_id: impl Into<String>) {
        let url_param = url_param.into();
        let thread_id = thread_id.into();

        // Drop stale reverse entries so neither side points at two values
        if let Some(old_thread) = self.by_url_param.insert(url_param.clone(), thread_id.clone()) {
            if old_thread != thread_id {
                self.by_thread.remove(&old_thread);
            }
        }
        if let Some(old_param) = self.by_thread.insert(thread_id, url_param.clone()) {
            if old_param != url_param {
                self.by_url_param.remove(&old_param);
            }
        }
    }

    pub fn resolve(&self, url_param: &str) -> Option<&str> {
        self.by_url_param.get(url_param).map(String::as_str)
    }

    pub fn url_param_for(&self, thread_id: &str) -> Option<&str> {
        self.by_thread.get(thread_id).map(String::as_str)
    }

    /// Remove any mapping for a destroyed thread
    pub fn forget_thread(&mut self, thread_id: &str) {
        if let Some(param) = self.by_thread.remove(thread_id) {
            self.by_url_param.remove(&param);
        }
    }

    pub fn clear(&mut self) {
        self.by_url_param.clear();
        self.by_thread.clear();
    }
}
