use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A scalar query parameter value. Coerced to its string form on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::UInt(u) => write!(f, "{}", u),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

macro_rules! impl_int_param {
    ($variant:ident => $($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::$variant(value.into())
            }
        })*
    };
}

impl_int_param!(Int => i8, i16, i32, i64);
impl_int_param!(UInt => u8, u16, u32, u64);

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        // usize is at most 64 bits on every supported target.
        ParamValue::UInt(value as u64)
    }
}

/// How the response body relates to the payload the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeMode {
    /// Unwrap `data` when the body is an object carrying it, otherwise keep the body.
    #[default]
    Auto,
    /// The body must be `{ data, meta? }`.
    Envelope,
    /// Never unwrap.
    Bare,
}

/// What `fetch` hands back when the call degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDefault {
    #[default]
    Null,
    EmptySequence,
}

impl EmptyDefault {
    pub fn value(self) -> Value {
        match self {
            EmptyDefault::Null => Value::Null,
            EmptyDefault::EmptySequence => Value::Array(Vec::new()),
        }
    }
}

/// One GET against the dashboard's own `/api` tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub params: Vec<(String, ParamValue)>,
    pub requires_internal_auth: bool,
    pub envelope: EnvelopeMode,
    pub empty: EmptyDefault,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            requires_internal_auth: false,
            envelope: EnvelopeMode::Auto,
            empty: EmptyDefault::Null,
        }
    }

    /// Sets `key`. A key that is already present keeps its position and takes the new value.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set_param(key.into(), value.into());
        self
    }

    pub fn params<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in params {
            self.set_param(key.into(), value.into());
        }
        self
    }

    fn set_param(&mut self, key: String, value: ParamValue) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn internal_auth(mut self, required: bool) -> Self {
        self.requires_internal_auth = required;
        self
    }

    pub fn envelope(mut self, mode: EnvelopeMode) -> Self {
        self.envelope = mode;
        self
    }

    pub fn empty_default(mut self, empty: EmptyDefault) -> Self {
        self.empty = empty;
        self
    }
}

/// The useful payload plus the envelope's `meta`, if it had one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fetched {
    pub data: Value,
    pub meta: Option<Value>,
}

impl Fetched {
    pub fn empty(default: EmptyDefault) -> Self {
        Self {
            data: default.value(),
            meta: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BaseUrlUnresolved,
    InvalidRequest,
    Transport,
    Status,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::BaseUrlUnresolved => "base_url_unresolved",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::Transport => "transport",
            FailureKind::Status => "status",
            FailureKind::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Tagged result for callers that need to tell "no data" from "fetch failed".
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Fetched),
    Failure { kind: FailureKind, detail: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// Collapses a failure into the empty default.
    pub fn into_fetched(self, default: EmptyDefault) -> Fetched {
        match self {
            FetchOutcome::Success(fetched) => fetched,
            FetchOutcome::Failure { .. } => Fetched::empty(default),
        }
    }
}
