//! Dispatch capability handed to renderers and effects.

use std::sync::Arc;

/// Destination of dispatched messages.
///
/// Implemented by the runtime core (through a weak reference) and by the
/// free-standing closures built with [`Dispatch::from_fn`].
pub(crate) trait Sink<Msg>: Send + Sync {
    fn send(&self, msg: Msg);

    fn is_live(&self) -> bool;
}

/// Capability to enqueue a message into a runtime's transition lane.
///
/// A `Dispatch` is handed as the second argument of every
/// [`Renderer::render`](crate::Renderer::render) call and as the argument of
/// every [`Effect`](crate::Effect). Clone it freely: clones share the same
/// target and are cheap to move across threads.
///
/// `Dispatch` never keeps its runtime alive. Once the owning
/// [`Runtime`](crate::Runtime) is dropped, [`dispatch`](Self::dispatch) becomes
/// a silent no-op and [`is_live`](Self::is_live) returns `false`.
///
/// # Example
///
/// ```rust
/// use oxide_leaf::{Dispatch, Renderer};
///
/// enum Msg { SelectCity(u32) }
///
/// struct Props { cities: Vec<u32> }
///
/// struct CityPicker;
///
/// impl Renderer<Props, Msg> for CityPicker {
///     fn render(&mut self, props: Props, dispatch: &Dispatch<Msg>) {
///         // a real view would wire this into a tap handler
///         if let Some(first) = props.cities.first() {
///             dispatch.dispatch(Msg::SelectCity(*first));
///         }
///     }
/// }
/// ```
pub struct Dispatch<Msg>(Arc<dyn Sink<Msg>>);

impl<Msg> Clone for Dispatch<Msg> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Msg: Send + 'static> Dispatch<Msg> {
    pub(crate) fn from_sink<S>(sink: S) -> Self
    where
        S: Sink<Msg> + 'static,
    {
        Self(Arc::new(sink))
    }

    /// Build a dispatch that forwards every message to `f`.
    ///
    /// Useful to drive an [`Effect`](crate::Effect) or a renderer in isolation,
    /// without a runtime behind it. The resulting dispatch is always live.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Msg) + Send + Sync + 'static,
    {
        Self::from_sink(FnSink(f))
    }

    /// Dispatch a message.
    ///
    /// The message is queued on the transition lane and applied after every
    /// message dispatched before it. Returns immediately.
    pub fn dispatch(&self, msg: Msg) {
        self.0.send(msg);
    }

    /// Whether the target runtime still exists.
    ///
    /// Long-running effects can check this before doing work whose result
    /// nobody will observe.
    pub fn is_live(&self) -> bool {
        self.0.is_live()
    }

    /// Derive a dispatch for a child message type.
    ///
    /// Every child message is wrapped with `wrap` before reaching this
    /// dispatch, so a nested leaf can be driven by its parent's runtime.
    pub fn map<Child, F>(&self, wrap: F) -> Dispatch<Child>
    where
        Child: Send + 'static,
        F: Fn(Child) -> Msg + Send + Sync + 'static,
    {
        Dispatch::from_sink(Mapped {
            parent: self.clone(),
            wrap,
        })
    }
}

struct FnSink<F>(F);

impl<Msg, F> Sink<Msg> for FnSink<F>
where
    F: Fn(Msg) + Send + Sync,
{
    fn send(&self, msg: Msg) {
        (self.0)(msg);
    }

    fn is_live(&self) -> bool {
        true
    }
}

struct Mapped<Msg, F> {
    parent: Dispatch<Msg>,
    wrap: F,
}

impl<Child, Msg, F> Sink<Child> for Mapped<Msg, F>
where
    Msg: Send + 'static,
    F: Fn(Child) -> Msg + Send + Sync,
{
    fn send(&self, msg: Child) {
        self.parent.dispatch((self.wrap)(msg));
    }

    fn is_live(&self) -> bool {
        self.parent.is_live()
    }
}
