//! The MVU runtime that serializes transitions and schedules rendering and effects.

use core::any::Any;
use core::marker::PhantomData;
use std::sync::{Arc, Weak};

use spin::Mutex;
use tracing::{debug, trace};

use crate::dispatch::Sink;
use crate::logic::FnLogic;
use crate::{Dispatch, Effect, Lanes, ModelViewable, MvuLogic, Renderer};

/// The MVU runtime driving one leaf's state machine.
///
/// This is the core of the framework. It:
/// 1. Calls [`MvuLogic::init`] once, synchronously, and stores the initial model
/// 2. Applies every dispatched message through [`MvuLogic::update`], one at a
///    time and in arrival order, on the transition lane
/// 3. Projects each new model to Props via [`MvuLogic::view`] and hands them to
///    the [`Renderer`] on the render lane
/// 4. Runs each returned [`Effect`] on the effect lane
///
/// The model is owned by the runtime and only ever written by the transition
/// lane. Renderers get Props snapshots and effects get a [`Dispatch`]; neither
/// can reach the model directly.
///
/// Dropping the runtime disposes it. Work already queued for it is skipped,
/// and every [`Dispatch`] it handed out turns into a no-op. See
/// [`into_handle`](Self::into_handle) to keep a runtime alive without naming
/// its type.
///
/// # Type Parameters
///
/// * `Msg` - The message type of the leaf
/// * `Model` - The model/state type of the leaf
/// * `Props` - The props type produced by the view function
/// * `Logic` - The logic implementation type (implements [`MvuLogic`])
/// * `Render` - The renderer implementation type (implements [`Renderer`])
pub struct Runtime<Msg, Model, Props, Logic, Render>
where
    Msg: Send + 'static,
    Model: Send + Sync + 'static,
    Props: Send + 'static,
    Logic: MvuLogic<Msg, Model, Props> + Send + Sync + 'static,
    Render: Renderer<Props, Msg> + 'static,
{
    core: Arc<Core<Msg, Model, Props, Logic, Render>>,
}

struct Core<Msg, Model, Props, Logic, Render> {
    logic: Logic,
    renderer: Mutex<Render>,
    model: Mutex<Arc<Model>>,
    transition_gate: Mutex<()>,
    lanes: Lanes,
    dispatch: Dispatch<Msg>,
    _props: PhantomData<fn() -> Props>,
}

impl<Msg, Model, Props, Logic, Render> Runtime<Msg, Model, Props, Logic, Render>
where
    Msg: Send + 'static,
    Model: Send + Sync + 'static,
    Props: Send + 'static,
    Logic: MvuLogic<Msg, Model, Props> + Send + Sync + 'static,
    Render: Renderer<Props, Msg> + 'static,
{
    /// Create and start a runtime.
    ///
    /// `init` runs before this returns, so [`current_model`](Self::current_model)
    /// is defined immediately. The first render and the startup effect are
    /// scheduled asynchronously.
    ///
    /// # Arguments
    ///
    /// * `logic` - Leaf logic implementing [`MvuLogic`]
    /// * `renderer` - Presentation layer receiving Props
    /// * `lanes` - Where transitions, renders and effects run
    pub fn new(logic: Logic, renderer: Render, lanes: Lanes) -> Self {
        let (model, effect) = logic.init();

        let core = Arc::new_cyclic(|weak: &Weak<Core<Msg, Model, Props, Logic, Render>>| Core {
            logic,
            renderer: Mutex::new(renderer),
            model: Mutex::new(Arc::new(model)),
            transition_gate: Mutex::new(()),
            lanes,
            dispatch: Dispatch::from_sink(CoreSink { core: weak.clone() }),
            _props: PhantomData,
        });
        debug!("runtime constructed");

        let weak = Arc::downgrade(&core);
        core.lanes.transition.schedule(Box::new(move || {
            if let Some(core) = weak.upgrade() {
                core.start(effect);
            }
        }));

        Runtime { core }
    }

    /// Dispatch a message to this runtime.
    pub fn dispatch(&self, msg: Msg) {
        self.core.enqueue(msg);
    }

    /// A [`Dispatch`] targeting this runtime.
    pub fn dispatcher(&self) -> Dispatch<Msg> {
        self.core.dispatch.clone()
    }

    /// A copy of the model as of the last completed transition.
    ///
    /// Never waits for a running `update`.
    pub fn current_model(&self) -> Model
    where
        Model: Clone,
    {
        Model::clone(&self.core.snapshot())
    }

    /// Erase the runtime's type, keeping it alive for as long as the handle
    /// lives.
    pub fn into_handle(self) -> RuntimeHandle {
        RuntimeHandle {
            _runtime: Box::new(self),
        }
    }
}

impl<Msg, Model, Initial, Update, Render>
    Runtime<Msg, Model, Model::Props, FnLogic<Msg, Model, Initial, Update>, Render>
where
    Msg: Send + 'static,
    Model: ModelViewable + Send + Sync + 'static,
    Model::Props: Send + 'static,
    Initial: Fn() -> (Model, Option<Effect<Msg>>) + Send + Sync + 'static,
    Update: Fn(Msg, &Model) -> (Model, Option<Effect<Msg>>) + Send + Sync + 'static,
    Render: Renderer<Model::Props, Msg> + 'static,
{
    /// Create a runtime from plain functions, on the [shared lanes](Lanes::shared).
    ///
    /// Props are derived with [`ModelViewable::build_props`].
    pub fn create(initial: Initial, update: Update, render: Render) -> Self {
        Self::create_with_lanes(initial, update, render, Lanes::shared())
    }

    /// Same as [`create`](Self::create), on caller-provided lanes.
    pub fn create_with_lanes(
        initial: Initial,
        update: Update,
        render: Render,
        lanes: Lanes,
    ) -> Self {
        Self::new(FnLogic::new(initial, update), render, lanes)
    }
}

impl<Msg, Model, Props, Logic, Render> Core<Msg, Model, Props, Logic, Render>
where
    Msg: Send + 'static,
    Model: Send + Sync + 'static,
    Props: Send + 'static,
    Logic: MvuLogic<Msg, Model, Props> + Send + Sync + 'static,
    Render: Renderer<Props, Msg> + 'static,
{
    fn enqueue(self: &Arc<Self>, msg: Msg) {
        let weak = Arc::downgrade(self);
        self.lanes.transition.schedule(Box::new(move || match weak.upgrade() {
            Some(core) => core.transition(msg),
            None => trace!("runtime dropped before message was applied"),
        }));
    }

    fn snapshot(&self) -> Arc<Model> {
        self.model.lock().clone()
    }

    fn start(self: &Arc<Self>, effect: Option<Effect<Msg>>) {
        let props = self.logic.view(&self.snapshot());
        self.schedule_render(props);
        self.schedule_effect(effect);
    }

    fn transition(self: &Arc<Self>, msg: Msg) {
        // The gate keeps updates exclusive whatever lane implementation is in
        // use; the model lock itself is only held to swap snapshots.
        let (props, effect) = {
            let _gate = self.transition_gate.lock();
            let current = self.snapshot();
            let (next, effect) = self.logic.update(msg, &current);
            let props = self.logic.view(&next);
            *self.model.lock() = Arc::new(next);
            (props, effect)
        };
        trace!(has_effect = effect.is_some(), "transition applied");

        self.schedule_render(props);
        self.schedule_effect(effect);
    }

    fn schedule_render(self: &Arc<Self>, props: Props) {
        let weak = Arc::downgrade(self);
        self.lanes.render.schedule(Box::new(move || match weak.upgrade() {
            Some(core) => core.renderer.lock().render(props, &core.dispatch),
            None => trace!("runtime dropped before render"),
        }));
    }

    fn schedule_effect(self: &Arc<Self>, effect: Option<Effect<Msg>>) {
        let Some(effect) = effect else {
            return;
        };
        let weak = Arc::downgrade(self);
        self.lanes.effect.schedule(Box::new(move || {
            // Only the dispatch is kept, so a slow effect does not keep the
            // runtime alive.
            let dispatch = match weak.upgrade() {
                Some(core) => core.dispatch.clone(),
                None => {
                    trace!("runtime dropped before effect ran");
                    return;
                }
            };
            effect.execute(dispatch);
        }));
    }
}

struct CoreSink<Msg, Model, Props, Logic, Render> {
    core: Weak<Core<Msg, Model, Props, Logic, Render>>,
}

impl<Msg, Model, Props, Logic, Render> Sink<Msg> for CoreSink<Msg, Model, Props, Logic, Render>
where
    Msg: Send + 'static,
    Model: Send + Sync + 'static,
    Props: Send + 'static,
    Logic: MvuLogic<Msg, Model, Props> + Send + Sync + 'static,
    Render: Renderer<Props, Msg> + 'static,
{
    fn send(&self, msg: Msg) {
        match self.core.upgrade() {
            Some(core) => core.enqueue(msg),
            None => trace!("dispatch to a dropped runtime ignored"),
        }
    }

    fn is_live(&self) -> bool {
        self.core.strong_count() > 0
    }
}

/// Type-erased owner of a [`Runtime`].
///
/// A leaf usually hands its runtime to a view controller that only needs to
/// keep it alive while it is on screen. Dropping the handle disposes the
/// runtime.
pub struct RuntimeHandle {
    _runtime: Box<dyn Any + Send + Sync>,
}

#[cfg(any(test, feature = "testing"))]
/// Runtime wired to [`TestLanes`](crate::TestLanes) for manual event processing.
///
/// Only available with the `testing` feature or during tests.
///
/// Nothing runs until the test calls [`process_events`](Self::process_events)
/// (or drains a single lane through [`lanes`](Self::lanes)), which gives
/// precise control over the interleaving of transitions, renders and effects.
///
/// ```rust
/// use oxide_leaf::{Effect, ModelViewable, TestRenderer, TestRuntime};
/// # #[derive(Clone, Debug, PartialEq)]
/// # struct Model { count: i32 }
/// # impl ModelViewable for Model {
/// #     type Props = i32;
/// #     fn build_props(&self) -> i32 { self.count }
/// # }
/// # enum Msg { Increment }
/// let renderer = TestRenderer::new();
/// let runtime = TestRuntime::create(
///     || (Model { count: 0 }, Some(Effect::just(Msg::Increment))),
///     |_msg: Msg, model: &Model| (Model { count: model.count + 1 }, None),
///     renderer.clone(),
/// );
///
/// assert_eq!(renderer.count(), 0);
/// runtime.process_events(); // initial render, startup effect, its transition
/// assert_eq!(runtime.current_model(), Model { count: 1 });
/// assert_eq!(renderer.count(), 2);
/// ```
pub struct TestRuntime<Msg, Model, Props, Logic, Render>
where
    Msg: Send + 'static,
    Model: Send + Sync + 'static,
    Props: Send + 'static,
    Logic: MvuLogic<Msg, Model, Props> + Send + Sync + 'static,
    Render: Renderer<Props, Msg> + 'static,
{
    runtime: Runtime<Msg, Model, Props, Logic, Render>,
    lanes: crate::TestLanes,
}

#[cfg(any(test, feature = "testing"))]
impl<Msg, Model, Props, Logic, Render> TestRuntime<Msg, Model, Props, Logic, Render>
where
    Msg: Send + 'static,
    Model: Send + Sync + 'static,
    Props: Send + 'static,
    Logic: MvuLogic<Msg, Model, Props> + Send + Sync + 'static,
    Render: Renderer<Props, Msg> + 'static,
{
    /// Create a test runtime. `init` runs immediately; everything else waits
    /// for the test to drive the lanes.
    pub fn new(logic: Logic, renderer: Render) -> Self {
        let lanes = crate::TestLanes::new();
        let runtime = Runtime::new(logic, renderer, lanes.lanes());
        Self { runtime, lanes }
    }

    /// Process all queued work until every lane is idle.
    pub fn process_events(&self) {
        self.lanes.process_events();
    }

    /// Queue a message. It is applied on the next
    /// [`process_events`](Self::process_events).
    pub fn dispatch(&self, msg: Msg) {
        self.runtime.dispatch(msg);
    }

    /// See [`Runtime::current_model`].
    pub fn current_model(&self) -> Model
    where
        Model: Clone,
    {
        self.runtime.current_model()
    }

    /// The wrapped runtime, e.g. to hand out its [`Dispatch`].
    pub fn runtime(&self) -> &Runtime<Msg, Model, Props, Logic, Render> {
        &self.runtime
    }

    /// The queues behind the runtime, to drain one lane at a time.
    pub fn lanes(&self) -> &crate::TestLanes {
        &self.lanes
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Msg, Model, Initial, Update, Render>
    TestRuntime<Msg, Model, Model::Props, FnLogic<Msg, Model, Initial, Update>, Render>
where
    Msg: Send + 'static,
    Model: ModelViewable + Send + Sync + 'static,
    Model::Props: Send + 'static,
    Initial: Fn() -> (Model, Option<Effect<Msg>>) + Send + Sync + 'static,
    Update: Fn(Msg, &Model) -> (Model, Option<Effect<Msg>>) + Send + Sync + 'static,
    Render: Renderer<Model::Props, Msg> + 'static,
{
    /// Test counterpart of [`Runtime::create`].
    pub fn create(initial: Initial, update: Update, render: Render) -> Self {
        Self::new(FnLogic::new(initial, update), render)
    }
}
