#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use saml_to::auth::{AuthError, Clock, Token, TokenStore};
use saml_to::status::StatusReporter;
use serde_json::Value;
use wiremock::{Request, Respond, ResponseTemplate};

#[derive(Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<Token>>,
    saves: Mutex<u32>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(token: Token) -> Self {
        let store = Self::default();
        *store.token.lock().expect("store lock poisoned") = Some(token);
        store
    }

    pub fn get(&self) -> Option<Token> {
        self.token.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> u32 {
        *self.saves.lock().expect("store lock poisoned")
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<Token>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, token: &Token) -> Result<std::path::PathBuf, AuthError> {
        *self.token.lock().expect("store lock poisoned") = Some(token.clone());
        *self.saves.lock().expect("store lock poisoned") += 1;
        Ok(std::path::PathBuf::from("memory://github-token"))
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Clock whose `sleep` advances virtual time instantly.
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(start_time()),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock lock poisoned").clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("clock lock poisoned").push(duration);
        let step = chrono::Duration::from_std(duration).expect("duration in range");
        *self.now.lock().expect("clock lock poisoned") += step;
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

#[derive(Default)]
pub struct RecordingStatus {
    messages: Mutex<Vec<String>>,
    codes: Mutex<Vec<(String, String)>>,
}

impl RecordingStatus {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("status lock poisoned").clone()
    }

    pub fn codes(&self) -> Vec<(String, String)> {
        self.codes.lock().expect("status lock poisoned").clone()
    }
}

impl StatusReporter for RecordingStatus {
    fn progress(&self, message: &str) {
        self.messages
            .lock()
            .expect("status lock poisoned")
            .push(message.to_string());
    }

    fn device_code(&self, verification_uri: &str, user_code: &str) {
        self.codes
            .lock()
            .expect("status lock poisoned")
            .push((verification_uri.to_string(), user_code.to_string()));
    }
}

/// Replies with `bodies` in order (repeating the last one) and records the
/// virtual time of every request.
pub struct SequenceResponder {
    clock: Arc<FakeClock>,
    bodies: Vec<Value>,
    seen: Arc<Mutex<Vec<DateTime<Utc>>>>,
}

impl SequenceResponder {
    pub fn new(clock: Arc<FakeClock>, bodies: Vec<Value>) -> (Self, Arc<Mutex<Vec<DateTime<Utc>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                clock,
                bodies,
                seen: seen.clone(),
            },
            seen,
        )
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut seen = self.seen.lock().expect("responder lock poisoned");
        seen.push(self.clock.now());
        let index = (seen.len() - 1).min(self.bodies.len() - 1);
        ResponseTemplate::new(200).set_body_json(self.bodies[index].clone())
    }
}

pub fn token(access_token: &str) -> Token {
    Token::new(access_token)
}
