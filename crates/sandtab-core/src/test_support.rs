//! Host fakes shared by the unit tests

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use sandtab_session::ContextId;

use crate::environment::{ContextQuery, CredentialRevoker, RevocationRequest};
use crate::error::RevocationError;

#[derive(Default)]
pub struct FakeContexts {
    foreground: Mutex<Option<ContextId>>,
    urls: Mutex<HashMap<ContextId, String>>,
}

impl FakeContexts {
    pub fn focus(&self, context: Option<u32>) {
        *self.foreground.lock() = context.map(ContextId);
    }

    pub fn navigate(&self, context: u32, url: &str) {
        self.urls.lock().insert(ContextId(context), url.to_string());
    }
}

impl ContextQuery for FakeContexts {
    fn foreground_context(&self) -> Option<ContextId> {
        *self.foreground.lock()
    }

    fn context_url(&self, context: ContextId) -> Option<String> {
        self.urls.lock().get(&context).cloned()
    }
}

#[derive(Default)]
pub struct RecordingRevoker {
    calls: Mutex<Vec<RevocationRequest>>,
    failing_names: Mutex<HashSet<String>>,
}

impl RecordingRevoker {
    pub fn fail_on(&self, name: &str) {
        self.failing_names.lock().insert(name.to_string());
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .iter()
            .map(|r| (r.domain.clone(), r.name.clone()))
            .collect()
    }
}

impl CredentialRevoker for RecordingRevoker {
    fn revoke(&self, request: &RevocationRequest) -> Result<(), RevocationError> {
        self.calls.lock().push(request.clone());
        if self.failing_names.lock().contains(&request.name) {
            return Err(RevocationError("cookie jar unavailable".to_string()));
        }
        Ok(())
    }
}
