//! Deferred side effects that feed messages back into the runtime.

use core::future::Future;

use crate::Dispatch;

/// A deferred unit of work that may dispatch follow-up messages.
///
/// Effects are returned from [`MvuLogic::init`](crate::MvuLogic::init) and
/// [`MvuLogic::update`](crate::MvuLogic::update) alongside the next model, as
/// `Option<Effect<Msg>>`. `None` means the transition needs no side work and
/// nothing is scheduled on the effect lane.
///
/// An effect runs once, on the effect lane, and may dispatch zero, one or
/// many messages. It never touches the model directly. Failures must be
/// caught inside the effect and turned into messages.
///
/// # Example
///
/// ```rust
/// use oxide_leaf::Effect;
///
/// enum Msg {
///     RequestCities,
///     CitiesLoaded(Vec<String>),
/// }
///
/// // Trigger a follow-up message
/// let effect = Effect::just(Msg::RequestCities);
///
/// // Do some work, then report back
/// let effect = Effect::new(|dispatch| {
///     let cities = vec!["Moscow".to_string()];
///     dispatch.dispatch(Msg::CitiesLoaded(cities));
/// });
///
/// // No side effects
/// let effect: Option<Effect<Msg>> = None;
/// ```
#[allow(clippy::type_complexity)]
pub struct Effect<Msg>(Box<dyn FnOnce(Dispatch<Msg>) + Send + 'static>);

impl<Msg: Send + 'static> Effect<Msg> {
    /// Create an effect from a closure receiving the dispatch capability.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Dispatch<Msg>) + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Run the effect, consuming it.
    pub fn execute(self, dispatch: Dispatch<Msg>) {
        (self.0)(dispatch);
    }

    /// Create an effect that dispatches a single message.
    ///
    /// Useful for kicking off a load right after `init`.
    pub fn just(msg: Msg) -> Self {
        Self::new(move |dispatch| dispatch.dispatch(msg))
    }

    /// Combine several effects into one.
    ///
    /// The effects run in order on the effect lane. An empty batch yields
    /// `None`, so nothing gets scheduled for it.
    ///
    /// ```rust
    /// use oxide_leaf::Effect;
    ///
    /// enum Msg { A, B }
    ///
    /// assert!(Effect::batch(vec![Effect::just(Msg::A), Effect::just(Msg::B)]).is_some());
    /// assert!(Effect::<Msg>::batch(Vec::new()).is_none());
    /// ```
    pub fn batch<I>(effects: I) -> Option<Self>
    where
        I: IntoIterator<Item = Effect<Msg>>,
    {
        let effects: Vec<Effect<Msg>> = effects.into_iter().collect();
        if effects.is_empty() {
            return None;
        }
        Some(Self::new(move |dispatch: Dispatch<Msg>| {
            for effect in effects {
                effect.execute(dispatch.clone());
            }
        }))
    }

    /// Create an effect from an async body.
    ///
    /// The future is driven to completion on the effect lane, which is
    /// allowed to block. Later effects on the same lane wait for it.
    ///
    /// ```rust
    /// use oxide_leaf::{Dispatch, Effect};
    ///
    /// #[derive(Debug, PartialEq)]
    /// enum Msg { Loaded(u32) }
    ///
    /// let effect = Effect::future(|dispatch: Dispatch<Msg>| async move {
    ///     let value = async { 42 }.await;
    ///     dispatch.dispatch(Msg::Loaded(value));
    /// });
    ///
    /// let (tx, rx) = std::sync::mpsc::channel();
    /// let tx = std::sync::Mutex::new(tx);
    /// effect.execute(Dispatch::from_fn(move |msg| tx.lock().unwrap().send(msg).unwrap()));
    /// assert_eq!(rx.recv().unwrap(), Msg::Loaded(42));
    /// ```
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Dispatch<Msg>) -> Fut + Send + 'static,
        Fut: Future<Output = ()>,
    {
        Self::new(move |dispatch| futures::executor::block_on(f(dispatch)))
    }

    /// Run a fallible task and fold its outcome into a message.
    ///
    /// Exactly one message is dispatched: `on_ok` for a success, `on_err`
    /// for a failure. This is the usual way to surface a collaborator error
    /// as a `SetError`-style message.
    ///
    /// ```rust
    /// use oxide_leaf::Effect;
    ///
    /// enum Msg {
    ///     CitiesLoaded(Vec<String>),
    ///     SetError(String),
    /// }
    ///
    /// let effect = Effect::attempt(
    ///     || Err::<Vec<String>, _>("offline".to_string()),
    ///     Msg::CitiesLoaded,
    ///     Msg::SetError,
    /// );
    /// ```
    pub fn attempt<T, E, Task, OnOk, OnErr>(task: Task, on_ok: OnOk, on_err: OnErr) -> Self
    where
        Task: FnOnce() -> Result<T, E> + Send + 'static,
        OnOk: FnOnce(T) -> Msg + Send + 'static,
        OnErr: FnOnce(E) -> Msg + Send + 'static,
    {
        Self::new(move |dispatch| {
            let msg = match task() {
                Ok(value) => on_ok(value),
                Err(error) => on_err(error),
            };
            dispatch.dispatch(msg);
        })
    }

    /// Lift this effect into a parent message type.
    ///
    /// Every message the effect dispatches is wrapped with `wrap` first.
    pub fn map<Parent, F>(self, wrap: F) -> Effect<Parent>
    where
        Parent: Send + 'static,
        F: Fn(Msg) -> Parent + Send + Sync + 'static,
    {
        Effect::new(move |dispatch: Dispatch<Parent>| self.execute(dispatch.map(wrap)))
    }
}
