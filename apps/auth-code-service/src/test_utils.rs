//! ユニットテスト用の依存セット

use std::sync::Arc;

use authcode_domain::clock::FixedClock;
use authcode_infra::mock::{
    FixedCodeGenerator,
    InMemoryAuthCodeStore,
    InMemoryTokenStore,
    RecordingNotifier,
    StaticReadinessProbe,
};
use chrono::{DateTime, Utc};

use crate::{config::AuthCodeSettings, deps::AuthDeps};

pub const FIXED_CODE: &str = "123456";

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-15T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// インメモリ実装で組んだ依存と、検証用のハンドル
pub struct TestDeps {
    pub code_store:  InMemoryAuthCodeStore,
    pub token_store: InMemoryTokenStore,
    pub notifier:    RecordingNotifier,
    pub clock:       Arc<FixedClock>,
    pub deps:        Arc<AuthDeps>,
}

impl Default for TestDeps {
    fn default() -> Self {
        Self::with(AuthCodeSettings::default(), RecordingNotifier::new())
    }
}

impl TestDeps {
    pub fn with(settings: AuthCodeSettings, notifier: RecordingNotifier) -> Self {
        let code_store = InMemoryAuthCodeStore::new();
        let token_store = InMemoryTokenStore::new();
        let clock = Arc::new(FixedClock::new(fixed_now()));

        let deps = Arc::new(AuthDeps {
            settings,
            code_store: Arc::new(code_store.clone()),
            token_store: Arc::new(token_store.clone()),
            code_generator: Arc::new(FixedCodeGenerator::new(FIXED_CODE)),
            notifier: Arc::new(notifier.clone()),
            readiness: Arc::new(StaticReadinessProbe::healthy()),
            clock: clock.clone(),
        });

        Self {
            code_store,
            token_store,
            notifier,
            clock,
            deps,
        }
    }
}
