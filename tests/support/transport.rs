//! An in-memory transport that answers every request the same way.

use std::io;
use std::sync::{Arc, Mutex};

use request_promise::{Agent, Error, Request, Response, ResponseBuilderExt, ResponseFuture, Transport};

pub const BASE: &str = "http://scripted.local/";

#[derive(Clone, Copy, Debug)]
pub enum Reply {
    Status(u16),
    ConnectionRefused,
    Hang,
}

#[derive(Clone)]
pub struct Scripted {
    reply: Reply,
    body: &'static str,
    seen: Arc<Mutex<Vec<Request>>>,
}

impl Scripted {
    pub fn new(reply: Reply) -> Scripted {
        Scripted {
            reply,
            body: "",
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn body(mut self, body: &'static str) -> Scripted {
        self.body = body;
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }

    pub fn agent(&self) -> Agent {
        Agent::builder()
            .base_url(BASE.parse().unwrap())
            .transport(self.clone())
            .build()
            .expect("agent")
    }
}

impl Transport for Scripted {
    fn execute(&self, request: Request) -> ResponseFuture {
        let url = request.url().clone();
        self.seen.lock().unwrap().push(request);

        let reply = self.reply;
        let body = self.body;
        Box::pin(async move {
            match reply {
                Reply::Status(code) => {
                    let res = http::Response::builder()
                        .status(code)
                        .url(url)
                        .body(body)
                        .expect("valid response");
                    Ok(Response::from(res))
                }
                Reply::ConnectionRefused => Err(Error::transport(io::Error::from(
                    io::ErrorKind::ConnectionRefused,
                ))),
                Reply::Hang => futures_util::future::pending::<request_promise::Result<Response>>().await,
            }
        })
    }
}
