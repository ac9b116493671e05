//! Handler identity and introspection data.

use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

/// Process-unique identity of a handler value.
///
/// Assigned when the handler is constructed. Marking a plain function exempt
/// keeps its identity; wrapping a bound method creates a new one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    /// Create a new random ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hdl_{}", self.0)
    }
}

impl fmt::Debug for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerId({})", self)
    }
}

/// How a handler produces its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// Returns immediately, never yields.
    Synchronous,
    /// Returns a future that may yield one or more times.
    Suspending,
}

/// Structural kind of a handler, used when marking type-erased handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerShape {
    /// A callable without a receiver.
    Function,
    /// A callable bound to an owning instance.
    BoundMethod,
    /// A wrapper that forwards to another handler.
    Forwarder,
    /// Anything else.
    Opaque,
}

/// Introspectable identity of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMeta {
    id: HandlerId,
    name: Cow<'static, str>,
    doc: Option<Cow<'static, str>>,
    convention: Convention,
}

impl HandlerMeta {
    /// Create metadata with a fresh identity.
    pub fn new(name: impl Into<Cow<'static, str>>, convention: Convention) -> Self {
        Self {
            id: HandlerId::new(),
            name: name.into(),
            doc: None,
            convention,
        }
    }

    /// Attach documentation.
    pub fn with_doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Copy of this metadata under a new identity.
    pub(crate) fn rebind(&self) -> Self {
        Self {
            id: HandlerId::new(),
            ..self.clone()
        }
    }

    /// Identity of the handler value.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation, if any was attached.
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// How the handler produces its result.
    pub fn convention(&self) -> Convention {
        self.convention
    }
}
