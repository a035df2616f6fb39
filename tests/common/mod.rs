//! Scripted transport with controllable completion timing.

#![allow(dead_code)]

use hostwire::{BoxFuture, Exchange, Request, Transport, TransportError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Routes crate logs to the test harness; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How every exchange started by a [`MockTransport`] behaves.
#[derive(Debug, Clone)]
pub struct Script {
    /// Time until the exchange finishes on its own.
    pub delay: Duration,
    pub error: TransportError,
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
    /// Status and body already received when a graceful close arrives.
    pub partial: Option<(u16, Vec<u8>)>,
}

impl Script {
    pub fn respond(status: u16, body: &str) -> Self {
        Self {
            delay: Duration::from_millis(10),
            error: TransportError::from_status(status),
            status,
            body: body.as_bytes().to_vec(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            partial: None,
        }
    }

    pub fn fail(error: TransportError) -> Self {
        Self {
            delay: Duration::from_millis(10),
            error,
            status: 0,
            body: Vec::new(),
            headers: Vec::new(),
            partial: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_partial(mut self, status: u16, body: &str) -> Self {
        self.partial = Some((status, body.as_bytes().to_vec()));
        self
    }
}

/// A transport primitive invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub primitive: &'static str,
    pub verb: Option<String>,
    pub request: Request,
}

#[derive(Default)]
struct Record {
    calls: Vec<Call>,
    aborts: usize,
    closes: usize,
}

#[derive(Clone)]
pub struct MockTransport {
    script: Script,
    record: Arc<Mutex<Record>>,
}

impl MockTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            record: Arc::new(Mutex::new(Record::default())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.record.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls().pop().expect("no transport call recorded")
    }

    pub fn aborts(&self) -> usize {
        self.record.lock().unwrap().aborts
    }

    pub fn closes(&self) -> usize {
        self.record.lock().unwrap().closes
    }

    fn start(
        &self,
        primitive: &'static str,
        verb: Option<&str>,
        request: &Request,
    ) -> Box<dyn Exchange> {
        self.record.lock().unwrap().calls.push(Call {
            primitive,
            verb: verb.map(str::to_string),
            request: request.clone(),
        });

        let (tx, rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            finished: tx,
        });
        let script = self.script.clone();

        let task_shared = shared.clone();
        let task_script = script.clone();
        tokio::spawn(async move {
            tokio::time::sleep(task_script.delay).await;
            task_shared.finish(|state| {
                state.error = task_script.error;
                state.status = task_script.status;
                state.body = task_script.body.clone();
                state.headers = task_script.headers.clone();
            });
        });

        Box::new(MockExchange {
            shared,
            script,
            finished: rx,
            record: self.record.clone(),
        })
    }
}

impl Transport for MockTransport {
    fn get(&self, request: &Request) -> Box<dyn Exchange> {
        self.start("get", None, request)
    }

    fn post(&self, request: &Request) -> Box<dyn Exchange> {
        self.start("post", None, request)
    }

    fn put(&self, request: &Request) -> Box<dyn Exchange> {
        self.start("put", None, request)
    }

    fn delete(&self, request: &Request) -> Box<dyn Exchange> {
        self.start("delete", None, request)
    }

    fn send_custom(&self, request: &Request, verb: &str) -> Box<dyn Exchange> {
        self.start("send_custom", Some(verb), request)
    }
}

#[derive(Default)]
struct State {
    done: bool,
    error: TransportError,
    status: u16,
    body: Vec<u8>,
    headers: Vec<(String, String)>,
}

struct Shared {
    state: Mutex<State>,
    finished: watch::Sender<bool>,
}

impl Shared {
    fn finish(&self, f: impl FnOnce(&mut State)) {
        let mut state = self.state.lock().unwrap();
        if state.done {
            return;
        }
        f(&mut state);
        state.done = true;
        drop(state);
        self.finished.send_replace(true);
    }
}

struct MockExchange {
    shared: Arc<Shared>,
    script: Script,
    finished: watch::Receiver<bool>,
    record: Arc<Mutex<Record>>,
}

impl Exchange for MockExchange {
    fn is_running(&self) -> bool {
        !self.shared.state.lock().unwrap().done
    }

    fn finished(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let _ = self.finished.wait_for(|done| *done).await.map(|_| ());
        })
    }

    fn error(&self) -> TransportError {
        self.shared.state.lock().unwrap().error
    }

    fn status(&self) -> u16 {
        self.shared.state.lock().unwrap().status
    }

    fn abort(&mut self) {
        self.record.lock().unwrap().aborts += 1;
        self.shared
            .finish(|state| state.error = TransportError::OperationCanceled);
    }

    fn close(&mut self) {
        self.record.lock().unwrap().closes += 1;
        let partial = self.script.partial.clone();
        self.shared.finish(|state| match partial {
            Some((status, body)) => {
                state.status = status;
                state.error = TransportError::from_status(status);
                state.body = body;
            }
            None => state.error = TransportError::OperationCanceled,
        });
    }

    fn read_all(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.shared.state.lock().unwrap().body)
    }

    fn raw_header_pairs(&self) -> Vec<(String, String)> {
        self.shared.state.lock().unwrap().headers.clone()
    }
}
