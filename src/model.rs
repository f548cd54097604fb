// Core structs: Candidate, Species, Channel and the error taxonomy
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Cat,
    Dog,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Cat, Species::Dog];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Cat => "Cat",
            Species::Dog => "Dog",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "Cat" => Some(Species::Cat),
            "Dog" => Some(Species::Dog),
            _ => None,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One adoptable animal scraped from a detail page.
///
/// `url` is the dedup key. Only the two notification flags change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub species: Species,
    pub url: String,
    pub photo_url: String,
    pub name: String,
    pub breed: String,
    pub gender: String,
    pub birthday: String,
    pub location: String,
    pub microchip_no: String,
    #[serde(default)]
    pub is_notified_all: bool,
    #[serde(default)]
    pub is_notified_cat: bool,
}

/// Which notification flag a chat channel owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    All,
    Cat,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub kind: ChannelKind,
    pub chat_id: String,
}

impl Channel {
    pub fn new(kind: ChannelKind, chat_id: impl Into<String>) -> Self {
        Self {
            kind,
            chat_id: chat_id.into(),
        }
    }

    /// Species gate: the cat channel never accepts dogs.
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        match self.kind {
            ChannelKind::All => true,
            ChannelKind::Cat => candidate.species == Species::Cat,
        }
    }

    pub fn is_notified(&self, candidate: &Candidate) -> bool {
        match self.kind {
            ChannelKind::All => candidate.is_notified_all,
            ChannelKind::Cat => candidate.is_notified_cat,
        }
    }

    pub fn mark_notified(&self, candidate: &mut Candidate) {
        match self.kind {
            ChannelKind::All => candidate.is_notified_all = true,
            ChannelKind::Cat => candidate.is_notified_cat = true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} timed out")]
    Timeout { url: String },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("field `{field}` not found on {url}")]
    MissingField { field: &'static str, url: String },
    #[error("invalid selector: {0}")]
    Selector(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] ScraperError),
    #[error(transparent)]
    Extraction(#[from] ParserError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Api(String),
    #[error("telegram responded with HTTP {0}: {1}")]
    Status(u16, String),
    #[error("telegram unreachable")]
    Unreachable,
}
