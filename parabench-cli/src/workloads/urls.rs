// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! I/O-bound reference workload: fetch a page and report its size.

use std::time::Duration;

use parabench_core::{CallContext, WorkError, WorkFuture, WorkUnit};
use serde::{Deserialize, Serialize};

/// Pages fetched by `parabench io`.
pub const URLS: [&str; 40] = [
    "http://www.eltiempo.com/",
    "http://www.elpais.com.co/",
    "http://www.bbc.co.uk/",
    "https://www.elmundo.es/",
    "https://es.euronews.com/noticias/internacional",
    "https://www.elespectador.com/",
    "https://www.semana.com/",
    "https://cnnespanol.cnn.com/",
    "https://www.larepublica.co/",
    "https://www.harvard.edu/",
    "https://www.yale.edu/",
    "https://www.utp.edu.co/",
    "http://www.mit.edu/",
    "https://www.stanford.edu/",
    "https://home.www.upenn.edu/",
    "https://duke.edu/",
    "https://www.cornell.edu/",
    "https://www.northwestern.edu/",
    "https://www.jhu.edu/",
    "https://wustl.edu/",
    "http://www.emory.edu/",
    "https://www.nd.edu/",
    "https://www.virginia.edu/",
    "https://www.vanderbilt.edu/",
    "https://www.cmu.edu/",
    "https://www.georgetown.edu/",
    "https://docs.python.org/3/library/asyncio.html",
    "https://docs.python.org/3/library/concurrent.futures.html",
    "https://docs.python.org/3/library/multiprocessing.html",
    "https://docs.python.org/3/library/threading.html",
    "https://docs.python.org/3/library/queue.html",
    "https://docs.python.org/3/library/subprocess.html",
    "https://docs.python.org/3/library/socket.html",
    "https://docs.python.org/3/library/select.html",
    "https://docs.python.org/3/library/ssl.html",
    "https://docs.python.org/3/library/urllib.html",
    "https://docs.python.org/3/library/http.html",
    "https://docs.python.org/3/library/ftplib.html",
    "https://docs.python.org/3/library/poplib.html",
    "https://docs.python.org/3/library/imaplib.html",
];

/// Per-request timeout when the trial sets none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub fn batch() -> Vec<String> {
    URLS.iter().map(|url| url.to_string()).collect()
}

/// What a successful fetch produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub status: u16,
    pub bytes: usize,
}

/// Fetches one URL per call.
///
/// Holds a blocking client for threads and worker processes and an async
/// client for the cooperative strategy. The async client keeps no idle
/// connections, since every cooperative trial runs on its own runtime and
/// a pooled connection would outlive the runtime that opened it.
pub struct UrlFetchUnit {
    blocking: reqwest::blocking::Client,
    client: reqwest::Client,
}

impl UrlFetchUnit {
    pub fn new() -> Result<Self, reqwest::Error> {
        let blocking = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { blocking, client })
    }
}

fn fetch_error(err: reqwest::Error, limit: Duration) -> WorkError {
    if err.is_timeout() {
        WorkError::timeout(limit)
    } else {
        WorkError::failed(err)
    }
}

impl WorkUnit for UrlFetchUnit {
    type Input = String;
    type Output = FetchSummary;

    fn name(&self) -> &str {
        "urls"
    }

    fn call(&self, url: &String, ctx: &CallContext) -> Result<FetchSummary, WorkError> {
        let limit = ctx.timeout().unwrap_or(DEFAULT_TIMEOUT);
        let response = self
            .blocking
            .get(url.as_str())
            .timeout(limit)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(e, limit))?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| fetch_error(e, limit))?;
        Ok(FetchSummary {
            status,
            bytes: body.len(),
        })
    }

    fn call_async<'a>(
        &'a self,
        url: &'a String,
        ctx: &'a CallContext,
    ) -> WorkFuture<'a, FetchSummary> {
        Box::pin(async move {
            let limit = ctx.timeout().unwrap_or(DEFAULT_TIMEOUT);
            let response = self
                .client
                .get(url.as_str())
                .timeout(limit)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| fetch_error(e, limit))?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| fetch_error(e, limit))?;
            Ok(FetchSummary {
                status,
                bytes: body.len(),
            })
        })
    }
}
