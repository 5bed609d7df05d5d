mod twse;
mod yahoo;

pub use twse::TwseQuoteFeed;
pub use yahoo::YahooHistoryFeed;

#[cfg(test)]
pub(crate) mod recording {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::http_client::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse};

    /// Replays scripted responses in order and records every request.
    /// The last scripted response repeats once the script runs out.
    #[derive(Debug)]
    pub(crate) struct RecordingHttpClient {
        script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        pub(crate) fn scripted(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                script: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn always(response: Result<HttpResponse, HttpError>) -> Self {
            Self::scripted(vec![response])
        }

        pub(crate) fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = {
                let mut script = self.script.lock().expect("script should not be poisoned");
                if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().cloned()
                }
            }
            .unwrap_or_else(|| Err(HttpError::Transport(String::from("no scripted response"))));
            Box::pin(async move { response })
        }
    }
}
