//! Content sources and the loader boundary.
//!
//! Fetching is asynchronous with respect to the stack: a request hands the
//! loader a [`ContentReply`] and the response travels back over a channel
//! that the coordinator drains on its next tick. The coordinator never
//! blocks on content and never cancels an in-flight request.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use crate::error::ContentError;

/// Renderable body content.
pub type Content = String;

/// Query parameters handed to a content source.
pub type QueryParams = BTreeMap<String, String>;

/// Transforms the initially empty parameter set before a fetch.
pub type QueryTransform = Rc<dyn Fn(QueryParams) -> QueryParams>;

/// A function content source. It receives the query and must eventually
/// settle the reply, either before returning or later.
pub type ContentFn = Rc<dyn Fn(&QueryParams, ContentReply)>;

#[derive(Clone)]
pub enum ContentSource {
    /// Fetched through the coordinator's [`ContentLoader`].
    Url(String),
    Function(ContentFn),
}

impl ContentSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Wrap a synchronous producer. The result is still delivered on the
    /// coordinator's next tick, never inline.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&QueryParams) -> Result<Content, ContentError> + 'static,
    {
        Self::Function(Rc::new(move |query, reply| reply.settle(f(query))))
    }

    /// Wrap a producer that keeps the reply and settles it later.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&QueryParams, ContentReply) + 'static,
    {
        Self::Function(Rc::new(f))
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Identifies one content request; a newer request for the same layer
/// supersedes older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentTicket(pub(crate) u64);

#[derive(Debug)]
pub struct ContentResponse {
    pub ticket: ContentTicket,
    pub result: Result<Content, ContentError>,
}

/// One-shot handle used to deliver a content response.
#[derive(Debug, Clone)]
pub struct ContentReply {
    ticket: ContentTicket,
    sender: Sender<ContentResponse>,
}

impl ContentReply {
    pub(crate) fn new(ticket: ContentTicket, sender: Sender<ContentResponse>) -> Self {
        Self { ticket, sender }
    }

    pub fn resolve(self, content: impl Into<Content>) {
        self.settle(Ok(content.into()));
    }

    pub fn reject(self, error: ContentError) {
        self.settle(Err(error));
    }

    pub fn settle(self, result: Result<Content, ContentError>) {
        // The receiver only goes away with the coordinator itself.
        let _ = self.sender.send(ContentResponse {
            ticket: self.ticket,
            result,
        });
    }
}

/// Everything a loader needs to fetch a URL source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub content_type: String,
    pub query: QueryParams,
}

/// Transport for URL content sources.
pub trait ContentLoader {
    fn fetch(&mut self, request: FetchRequest, reply: ContentReply);
}

impl<T: ContentLoader + ?Sized> ContentLoader for Box<T> {
    fn fetch(&mut self, request: FetchRequest, reply: ContentReply) {
        (**self).fetch(request, reply)
    }
}

/// Loader that answers from an in-memory table, used by the demo and tests.
///
/// Unknown URLs are rejected with a transport error.
#[derive(Debug, Default, Clone)]
pub struct StaticLoader {
    pages: HashMap<String, Result<Content, ContentError>>,
    requests: Vec<FetchRequest>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, content: impl Into<Content>) -> Self {
        self.pages.insert(url.into(), Ok(content.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, error: ContentError) -> Self {
        self.pages.insert(url.into(), Err(error));
        self
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> &[FetchRequest] {
        &self.requests
    }
}

impl ContentLoader for StaticLoader {
    fn fetch(&mut self, request: FetchRequest, reply: ContentReply) {
        let result = self
            .pages
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Err(ContentError::Transport(format!("404 {}", request.url))));
        self.requests.push(request);
        reply.settle(result);
    }
}
