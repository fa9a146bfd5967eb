//! HTTP k-line source.
//!
//! Talks JSON to a history gateway:
//! - `POST {base}/login` with credentials, returns a session token
//! - `GET {base}/history` with code, fields, date range, frequency, adjust flag
//! - `POST {base}/logout` with the session token
//!
//! Every body carries `error_code` / `error_msg`; `"0"` is success. No retry
//! here: a failed query fails that symbol and the run moves on.

use super::provider::{
    DataError, DataSource, QueryRequest, Row, RowCursor, SessionHandle, Status, VecCursor,
};
use crate::config::SourceConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    user_id: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(flatten)]
    status: Status,
    #[serde(default)]
    session: Option<String>,
}

#[derive(Debug, Serialize)]
struct LogoutRequest<'a> {
    session: &'a str,
}

#[derive(Debug, Deserialize)]
struct LogoutResponse {
    #[serde(flatten)]
    status: Status,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    status: Status,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

/// HTTP implementation of [`DataSource`].
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    user_id: String,
    password: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn decode<T: DeserializeOwned>(
        what: &str,
        result: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<T, DataError> {
        let resp = result.map_err(|e| DataError::NetworkUnreachable(format!("{what}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::ResponseFormatChanged(format!("{what}: HTTP {status}")));
        }
        resp.json::<T>()
            .map_err(|e| DataError::ResponseFormatChanged(format!("{what}: {e}")))
    }
}

fn value_to_field(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl DataSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn login(&self) -> Result<SessionHandle, DataError> {
        let body = LoginRequest {
            user_id: &self.user_id,
            password: &self.password,
        };
        let resp: LoginResponse =
            Self::decode("login", self.client.post(self.url("login")).json(&body).send())?;

        if !resp.status.is_success() {
            return Err(DataError::LoginFailed {
                code: resp.status.code,
                message: resp.status.message,
            });
        }
        let token = resp
            .session
            .ok_or_else(|| DataError::ResponseFormatChanged("login: no session token".into()))?;
        Ok(SessionHandle { token })
    }

    fn query<'a>(
        &'a self,
        session: &SessionHandle,
        request: &QueryRequest,
    ) -> Result<Box<dyn RowCursor + 'a>, DataError> {
        let symbol = request.symbol.to_string();
        let start = request.start.format("%Y-%m-%d").to_string();
        let end = request.end.format("%Y-%m-%d").to_string();
        let fields = request.fields.join(",");
        debug!(%symbol, %start, %end, "history query");

        let params = [
            ("session", session.token.as_str()),
            ("code", symbol.as_str()),
            ("fields", fields.as_str()),
            ("start_date", start.as_str()),
            ("end_date", end.as_str()),
            ("frequency", request.frequency.as_str()),
            ("adjustflag", request.adjust_flag.as_str()),
        ];
        let resp: HistoryResponse = Self::decode(
            "history",
            self.client.get(self.url("history")).query(&params).send(),
        )?;

        if !resp.status.is_success() {
            return Err(DataError::QueryFailed {
                symbol,
                code: resp.status.code,
                message: resp.status.message,
            });
        }

        let rows: Vec<Row> = resp
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(value_to_field).collect())
            .collect();
        Ok(Box::new(VecCursor::new(resp.fields, rows)))
    }

    fn logout(&self, session: SessionHandle) -> Result<(), DataError> {
        let body = LogoutRequest {
            session: &session.token,
        };
        let resp: LogoutResponse =
            Self::decode("logout", self.client.post(self.url("logout")).json(&body).send())?;
        if !resp.status.is_success() {
            return Err(DataError::ResponseFormatChanged(format!(
                "logout ({}): {}",
                resp.status.code, resp.status.message
            )));
        }
        Ok(())
    }
}
