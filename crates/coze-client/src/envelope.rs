//! Response envelope decoding.
//!
//! Most endpoints answer with `{code, msg, data}`; the OAuth family answers with
//! `{error_code, error_message}` on failure. Both shapes are folded into one
//! [`Envelope`] right after parsing so nothing downstream branches on the shape.

use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::transport::HttpResponse;

/// A successful platform response.
///
/// Dereferences to the decoded payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response<T> {
    /// Decoded payload.
    pub data: T,
    /// Envelope code (zero on success).
    pub code: i64,
    /// Envelope message, usually empty on success.
    pub msg: String,
    /// Value of the `x-tt-logid` response header.
    pub logid: Option<String>,
}

impl<T> Response<T> {
    /// Discard the envelope and keep the payload.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Transform the payload, keeping the envelope fields.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: f(self.data),
            code: self.code,
            msg: self.msg,
            logid: self.logid,
        }
    }
}

impl<T> Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for Response<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// Where an endpoint keeps its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadAt {
    /// The `data` member of the envelope.
    Data,
    /// A named top-level member.
    Field(&'static str),
    /// The whole body.
    Body,
}

/// Normalized `{code, msg}` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Envelope {
    pub code: i64,
    pub msg: String,
    /// Set when either envelope shape reports a failure.
    pub failed: bool,
}

impl Envelope {
    /// Read the envelope out of a parsed body.
    ///
    /// `code != 0` is a failure. A present `error_code` is always a failure; its value is
    /// used as the code when numeric and `-1` otherwise.
    pub(crate) fn read(body: &Value) -> Self {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

        let mut msg = text("msg").unwrap_or_default();
        if let Some(error_message) = text("error_message") {
            msg = error_message;
        }

        if let Some(code) = body.get("code").filter(|v| !v.is_null()) {
            let code = code.as_i64().unwrap_or(-1);
            return Self {
                code,
                msg,
                failed: code != 0,
            };
        }

        match body.get("error_code").filter(|v| !v.is_null()) {
            Some(error_code) => {
                let code = error_code.as_i64().unwrap_or(-1);
                if msg.is_empty() {
                    if let Some(tag) = error_code.as_str() {
                        msg = tag.to_string();
                    }
                }
                Self {
                    code,
                    msg,
                    failed: true,
                }
            }
            None => Self {
                code: 0,
                msg,
                failed: false,
            },
        }
    }
}

/// Parse a response body and classify it.
///
/// Returns the parsed body together with its envelope when the call succeeded.
pub(crate) fn classify(response: &HttpResponse) -> Result<(Value, Envelope)> {
    let success = (200..300).contains(&response.status);

    let body: Value = match serde_json::from_slice(&response.body) {
        Ok(body) => body,
        Err(_) if !success => {
            return Err(Error::Api {
                code: i64::from(response.status),
                msg: format!("HTTP {}", response.status),
                logid: response.logid.clone(),
            });
        }
        Err(source) => {
            tracing::warn!(
                logid = response.logid.as_deref().unwrap_or_default(),
                error = %source,
                "response body is not JSON"
            );
            return Err(Error::MalformedResponse {
                logid: response.logid.clone(),
                source,
            });
        }
    };

    let envelope = Envelope::read(&body);
    if envelope.failed {
        tracing::debug!(
            code = envelope.code,
            msg = %envelope.msg,
            logid = response.logid.as_deref().unwrap_or_default(),
            "platform reported an error"
        );
        return Err(Error::Api {
            code: envelope.code,
            msg: envelope.msg,
            logid: response.logid.clone(),
        });
    }

    if !success {
        let msg = if envelope.msg.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            envelope.msg
        };
        return Err(Error::Api {
            code: i64::from(response.status),
            msg,
            logid: response.logid.clone(),
        });
    }

    Ok((body, envelope))
}

/// Decode a response into a typed payload.
///
/// Absent and `null` members resolve to their defaults; an absent payload resolves to
/// `T::default()`.
pub(crate) fn decode<T>(response: HttpResponse, at: PayloadAt) -> Result<Response<T>>
where
    T: DeserializeOwned + Default,
{
    let (mut body, envelope) = classify(&response)?;
    strip_nulls(&mut body);

    let payload = match at {
        PayloadAt::Data => body.get_mut("data").map(Value::take),
        PayloadAt::Field(name) => body.get_mut(name).map(Value::take),
        PayloadAt::Body => Some(body),
    };

    let data = match payload {
        None | Some(Value::Null) => T::default(),
        Some(payload) => decode_value(payload, response.logid.as_deref())?,
    };

    Ok(Response {
        data,
        code: envelope.code,
        msg: envelope.msg,
        logid: response.logid,
    })
}

/// Decode a JSON value after removing its `null` members.
fn decode_value<T>(mut value: Value, logid: Option<&str>) -> Result<T>
where
    T: DeserializeOwned,
{
    strip_nulls(&mut value);
    serde_json::from_value(value).map_err(|source| {
        tracing::warn!(logid = logid.unwrap_or_default(), error = %source, "payload decode failed");
        Error::MalformedResponse {
            logid: logid.map(str::to_string),
            source,
        }
    })
}

/// Remove `null` object members, recursively.
pub(crate) fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
