//! Asynchronous segment fetcher with platform-specific implementations

use std::collections::VecDeque;

use super::structs::SegmentTileCollection;
use super::{SegmentFetcher, SegmentLoadResult, SegmentRequest};
#[cfg(not(target_arch = "wasm32"))]
use crate::error::BoardError;

// Platform-specific channel types
#[cfg(not(target_arch = "wasm32"))]
type ResultReceiver = std::sync::mpsc::Receiver<SegmentLoadResult>;
#[cfg(not(target_arch = "wasm32"))]
type RequestSender = std::sync::mpsc::Sender<SegmentRequest>;

#[cfg(target_arch = "wasm32")]
use std::sync::{Arc, Mutex};

#[cfg(target_arch = "wasm32")]
type ResultReceiver = Arc<Mutex<VecDeque<SegmentLoadResult>>>;

/// Segment fetcher talking to the game server over HTTP
pub struct HttpSegmentFetcher {
    result_rx: ResultReceiver,
    #[cfg(not(target_arch = "wasm32"))]
    request_tx: RequestSender,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    base_url: String,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    user_agent: String,
    /// Requests that could not be handed to the worker
    undelivered: VecDeque<SegmentLoadResult>,
    #[cfg(not(target_arch = "wasm32"))]
    _worker_handle: Option<std::thread::JoinHandle<()>>,
}

impl HttpSegmentFetcher {
    /// Create a new fetcher for the server at `base_url`
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let (request_tx, request_rx) = std::sync::mpsc::channel::<SegmentRequest>();
            let (result_tx, result_rx) = std::sync::mpsc::channel::<SegmentLoadResult>();

            let _worker_handle = {
                let base_url = base_url.to_string();
                let user_agent = user_agent.to_string();
                Some(std::thread::spawn(move || {
                    Self::worker_thread(request_rx, result_tx, base_url, user_agent);
                }))
            };

            Self {
                result_rx,
                request_tx,
                base_url: base_url.to_string(),
                user_agent: user_agent.to_string(),
                undelivered: VecDeque::new(),
                _worker_handle,
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            Self {
                result_rx: Arc::new(Mutex::new(VecDeque::new())),
                base_url: base_url.to_string(),
                user_agent: user_agent.to_string(),
                undelivered: VecDeque::new(),
            }
        }
    }

    // Native implementation
    #[cfg(not(target_arch = "wasm32"))]
    fn worker_thread(
        request_rx: std::sync::mpsc::Receiver<SegmentRequest>,
        result_tx: std::sync::mpsc::Sender<SegmentLoadResult>,
        base_url: String,
        user_agent: String,
    ) {
        let client = match reqwest::blocking::Client::builder()
            .user_agent(&user_agent)
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                log::error!("Failed to create HTTP client: {}", e);
                None
            }
        };

        while let Ok(request) = request_rx.recv() {
            let segment = request.segment_id;
            let result = match &client {
                Some(client) => Self::fetch_blocking(client, &base_url, &request),
                None => SegmentLoadResult::Failed(
                    segment,
                    BoardError::Transport {
                        segment,
                        reason: "no HTTP client".to_string(),
                    },
                ),
            };

            if result_tx.send(result).is_err() {
                break; // Receiver dropped, exit thread
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn fetch_blocking(
        client: &reqwest::blocking::Client,
        base_url: &str,
        request: &SegmentRequest,
    ) -> SegmentLoadResult {
        let segment = request.segment_id;
        let transport = |e: reqwest::Error| {
            SegmentLoadResult::Failed(
                segment,
                BoardError::Transport {
                    segment,
                    reason: e.to_string(),
                },
            )
        };

        let response = match client.get(request.url(base_url)).send() {
            Ok(response) => response,
            Err(e) => return transport(e),
        };
        if !response.status().is_success() {
            return SegmentLoadResult::Failed(
                segment,
                BoardError::HttpStatus {
                    segment,
                    status: response.status().as_u16(),
                },
            );
        }
        match response.bytes() {
            Ok(bytes) => match SegmentTileCollection::parse(segment, &bytes) {
                Ok(collection) => SegmentLoadResult::Success(segment, collection),
                Err(e) => SegmentLoadResult::Failed(segment, e),
            },
            Err(e) => transport(e),
        }
    }

    // WASM implementation using web-sys fetch API
    #[cfg(target_arch = "wasm32")]
    fn spawn_wasm_fetch(&self, request: SegmentRequest) {
        use crate::error::BoardError;
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;
        use web_sys::{Request, RequestInit, RequestMode, Response};

        let result_buffer = self.result_rx.clone();
        let user_agent = self.user_agent.clone();
        let url = request.url(&self.base_url);
        let segment = request.segment_id;

        wasm_bindgen_futures::spawn_local(async move {
            let result = async {
                let opts = RequestInit::new();
                opts.set_method("GET");
                opts.set_mode(RequestMode::Cors);

                let web_request = Request::new_with_str_and_init(&url, &opts)
                    .map_err(|e| format!("Failed to create request: {:?}", e))?;

                // May be ignored by the browser
                web_request
                    .headers()
                    .set("User-Agent", &user_agent)
                    .map_err(|e| format!("Failed to set User-Agent: {:?}", e))?;

                let window = web_sys::window().ok_or("No window object")?;
                let resp_value = JsFuture::from(window.fetch_with_request(&web_request))
                    .await
                    .map_err(|e| format!("Fetch failed: {:?}", e))?;

                let resp: Response = resp_value
                    .dyn_into()
                    .map_err(|_| "Response is not a Response object")?;

                if !resp.ok() {
                    return Ok(Err(resp.status()));
                }

                let array_buffer = JsFuture::from(
                    resp.array_buffer()
                        .map_err(|e| format!("Failed to get array buffer: {:?}", e))?,
                )
                .await
                .map_err(|e| format!("Failed to read array buffer: {:?}", e))?;

                Ok::<_, String>(Ok(js_sys::Uint8Array::new(&array_buffer).to_vec()))
            }
            .await;

            let load_result = match result {
                Ok(Ok(bytes)) => match SegmentTileCollection::parse(segment, &bytes) {
                    Ok(collection) => SegmentLoadResult::Success(segment, collection),
                    Err(e) => SegmentLoadResult::Failed(segment, e),
                },
                Ok(Err(status)) => {
                    SegmentLoadResult::Failed(segment, BoardError::HttpStatus { segment, status })
                }
                Err(reason) => {
                    SegmentLoadResult::Failed(segment, BoardError::Transport { segment, reason })
                }
            };

            if let Ok(mut results) = result_buffer.lock() {
                results.push_back(load_result);
            }
        });
    }
}

impl SegmentFetcher for HttpSegmentFetcher {
    fn fetch(&mut self, request: SegmentRequest) {
        log::debug!("Requesting segment {}", request.segment_id);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let segment = request.segment_id;
            if self.request_tx.send(request).is_err() {
                self.undelivered.push_back(SegmentLoadResult::Failed(
                    segment,
                    BoardError::Transport {
                        segment,
                        reason: "fetch worker stopped".to_string(),
                    },
                ));
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            self.spawn_wasm_fetch(request);
        }
    }

    fn poll(&mut self) -> Option<SegmentLoadResult> {
        if let Some(result) = self.undelivered.pop_front() {
            return Some(result);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.result_rx.try_recv().ok()
        }

        #[cfg(target_arch = "wasm32")]
        {
            self.result_rx.lock().ok()?.pop_front()
        }
    }
}
