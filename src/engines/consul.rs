use std::time::Duration;

use log::{debug, trace};
use url::Url;

use super::{EngineError, KvsEngine};
use crate::options::ConsulOptions;

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Engine backed by the key/value store of a Consul cluster.
///
/// Talks to a Consul agent over its HTTP API. The agent pools connections
/// and may be used from any number of threads; ordering between writers is
/// up to the Consul servers.
pub struct ConsulEngine {
    agent: ureq::Agent,
    base: Url,
    folder: Vec<String>,
    token: Option<String>,
}

impl ConsulEngine {
    /// Connects to the agent at `options.address`.
    ///
    /// Fails unless the cluster currently has a leader.
    pub fn open(options: &ConsulOptions) -> Result<Self, EngineError> {
        let base = Url::parse(&format!("{}://{}/", options.scheme, options.address))?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(options.timeout_ms)))
            .http_status_as_error(false)
            .build();
        let engine = ConsulEngine {
            agent: config.into(),
            base,
            folder: options
                .folder
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            token: options.token.clone(),
        };

        let leader = engine.leader()?;
        if leader.is_empty() {
            return Err(EngineError::NoLeader);
        }
        debug!("connected to consul at {} (leader {})", engine.base, leader);
        Ok(engine)
    }

    fn leader(&self) -> Result<String, EngineError> {
        let url = self.url(&["v1", "status", "leader"]);
        let mut response = self.authorize(self.agent.get(url.as_str())).call()?;
        check_status(&url, response.status().as_u16())?;
        let body = response.body_mut().read_to_vec()?;
        Ok(serde_json::from_slice::<String>(&body)?)
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn kv_url(&self, key: &str) -> Url {
        let mut url = self.url(&["v1", "kv"]);
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(&self.folder).push(key);
        }
        url
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token.as_str()),
            None => request,
        }
    }
}

fn check_status(url: &Url, status: u16) -> Result<(), EngineError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(EngineError::Status {
            status,
            url: url.to_string(),
        })
    }
}

impl KvsEngine for ConsulEngine {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EngineError> {
        let url = self.kv_url(key);
        trace!("consul put {} ({} bytes)", url, value.len());
        let response = self
            .authorize(self.agent.put(url.as_str()))
            .send(&value[..])?;
        check_status(&url, response.status().as_u16())
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        let mut url = self.kv_url(key);
        url.set_query(Some("raw"));
        trace!("consul fetch {}", url);
        let mut response = self.authorize(self.agent.get(url.as_str())).call()?;
        match response.status().as_u16() {
            404 => Ok(None),
            status => {
                check_status(&url, status)?;
                Ok(Some(response.body_mut().read_to_vec()?))
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), EngineError> {
        let url = self.kv_url(key);
        trace!("consul delete {}", url);
        let response = self
            .authorize(self.agent.delete(url.as_str()))
            .call()?;
        check_status(&url, response.status().as_u16())
    }

    fn close(self) -> Result<(), EngineError> {
        debug!("closed consul engine for {}", self.base);
        Ok(())
    }
}
