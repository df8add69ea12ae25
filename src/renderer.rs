//! Renderer abstraction for presenting Props.

#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;
#[cfg(any(test, feature = "testing"))]
use std::time::{Duration, Instant};

#[cfg(any(test, feature = "testing"))]
use flume::{Receiver, Sender};
#[cfg(any(test, feature = "testing"))]
use spin::Mutex;

use crate::Dispatch;

/// Renderer abstraction for presenting Props.
///
/// Implement this trait to plug the runtime into your presentation layer
/// (UI toolkit, terminal, logger, ...).
///
/// [`render`](Self::render) runs on the render lane after every accepted
/// message, in the order the transitions happened. It receives the Props
/// snapshot of that transition and the [`Dispatch`] through which user
/// interaction can originate new messages.
///
/// Closures `FnMut(Props, &Dispatch<Msg>)` implement this trait directly.
///
/// # Example
///
/// ```rust
/// use oxide_leaf::{Dispatch, Renderer};
///
/// struct Props {
///     title: String,
/// }
///
/// struct ConsoleRenderer;
///
/// impl Renderer<Props, ()> for ConsoleRenderer {
///     fn render(&mut self, props: Props, _dispatch: &Dispatch<()>) {
///         println!("{}", props.title);
///     }
/// }
/// ```
pub trait Renderer<Props, Msg>: Send {
    /// Render the given props.
    ///
    /// # Arguments
    ///
    /// * `props` - Props derived from the model produced by one transition
    /// * `dispatch` - Capability to originate new messages
    fn render(&mut self, props: Props, dispatch: &Dispatch<Msg>);
}

impl<Props, Msg, F> Renderer<Props, Msg> for F
where
    F: FnMut(Props, &Dispatch<Msg>) + Send,
{
    fn render(&mut self, props: Props, dispatch: &Dispatch<Msg>) {
        self(props, dispatch)
    }
}

#[cfg(any(test, feature = "testing"))]
/// Test renderer that captures all rendered Props for assertions.
///
/// Only available with the `testing` feature.
///
/// Clones share the same capture storage, so keep one clone for assertions
/// and hand the other to the runtime.
///
/// # Example
///
/// ```rust
/// use oxide_leaf::{Effect, ModelViewable, TestRenderer, TestRuntime};
///
/// #[derive(Clone)]
/// struct Model { count: i32 }
///
/// impl ModelViewable for Model {
///     type Props = i32;
///     fn build_props(&self) -> i32 { self.count }
/// }
///
/// enum Msg { Inc }
///
/// let renderer = TestRenderer::new();
/// let runtime = TestRuntime::create(
///     || (Model { count: 0 }, None),
///     |_msg: Msg, model: &Model| (Model { count: model.count + 1 }, None::<Effect<Msg>>),
///     renderer.clone(),
/// );
///
/// runtime.dispatch(Msg::Inc);
/// runtime.process_events();
///
/// renderer.with_renders(|renders| assert_eq!(renders, &vec![0, 1]));
/// ```
pub struct TestRenderer<Props, Msg> {
    captured: Arc<Mutex<Captured<Props, Msg>>>,
    rendered_tx: Sender<()>,
    rendered_rx: Receiver<()>,
}

#[cfg(any(test, feature = "testing"))]
struct Captured<Props, Msg> {
    renders: Vec<Props>,
    dispatch: Option<Dispatch<Msg>>,
}

#[cfg(any(test, feature = "testing"))]
impl<Props, Msg> Clone for TestRenderer<Props, Msg> {
    fn clone(&self) -> Self {
        Self {
            captured: self.captured.clone(),
            rendered_tx: self.rendered_tx.clone(),
            rendered_rx: self.rendered_rx.clone(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props: Send, Msg> Renderer<Props, Msg> for TestRenderer<Props, Msg> {
    fn render(&mut self, props: Props, dispatch: &Dispatch<Msg>) {
        {
            let mut captured = self.captured.lock();
            captured.renders.push(props);
            captured.dispatch = Some(dispatch.clone());
        }
        // the receiver lives in self, so the channel is never disconnected
        let _ = self.rendered_tx.send(());
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props, Msg> Default for TestRenderer<Props, Msg> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props, Msg> TestRenderer<Props, Msg> {
    pub fn new() -> Self {
        let (rendered_tx, rendered_rx) = flume::unbounded();
        Self {
            captured: Arc::new(Mutex::new(Captured {
                renders: Vec::new(),
                dispatch: None,
            })),
            rendered_tx,
            rendered_rx,
        }
    }

    /// Get the number of renders that have occurred.
    pub fn count(&self) -> usize {
        self.captured.lock().renders.len()
    }

    /// Access the captured renders with a closure.
    ///
    /// The closure receives every captured Props, oldest first.
    pub fn with_renders<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Vec<Props>) -> R,
    {
        let captured = self.captured.lock();
        f(&captured.renders)
    }

    /// The dispatch handed to the most recent render, to simulate user
    /// interaction.
    pub fn last_dispatch(&self) -> Option<Dispatch<Msg>> {
        self.captured.lock().dispatch.clone()
    }

    /// Block until at least `count` renders were captured or `timeout`
    /// elapsed. Returns whether the count was reached.
    ///
    /// Meant for runtimes driven by [`ThreadLane`](crate::ThreadLane)s.
    pub fn wait_for_renders(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.count() < count {
            // every render leaves one notification behind, so none is missed
            if self.rendered_rx.recv_deadline(deadline).is_err() {
                return self.count() >= count;
            }
        }
        true
    }
}
