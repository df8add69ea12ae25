//! Application logic traits defining the MVU contract.

use core::marker::PhantomData;

use crate::Effect;

/// Application logic trait defining the MVU contract.
///
/// Implementations must provide three pure functions:
/// - [`init`](Self::init): Produce the starting model and an optional startup effect
/// - [`update`](Self::update): Transform (Msg, Model) → (Model, Option<Effect>)
/// - [`view`](Self::view): Project the model into render-only Props
///
/// None of them may block or perform I/O. Anything slow belongs in the
/// returned [`Effect`], which runs on the effect lane.
///
/// See the [crate-level documentation](crate) for a complete example.
pub trait MvuLogic<Msg, Model, Props> {
    /// Produce the starting model and an optional startup effect.
    ///
    /// Called exactly once, synchronously, while the runtime is constructed.
    fn init(&self) -> (Model, Option<Effect<Msg>>);

    /// Reduce a message to the next model and an optional effect.
    ///
    /// All state changes must happen through this function. It is only ever
    /// called from the transition lane, one message at a time.
    ///
    /// # Arguments
    ///
    /// * `msg` - The message to apply
    /// * `model` - The current model state
    fn update(&self, msg: Msg, model: &Model) -> (Model, Option<Effect<Msg>>);

    /// Derive Props from a model.
    ///
    /// The returned Props are handed to [`Renderer::render`](crate::Renderer::render)
    /// on the render lane and must not share mutable state with the model.
    fn view(&self, model: &Model) -> Props;
}

/// A model that knows how to project itself into Props.
///
/// Implement this on the model when the projection needs nothing but the
/// model itself, then build the runtime with
/// [`Runtime::create`](crate::Runtime::create).
pub trait ModelViewable {
    type Props;

    fn build_props(&self) -> Self::Props;
}

/// [`MvuLogic`] built from an `initial` and an `update` closure.
///
/// Props come from [`ModelViewable::build_props`].
pub struct FnLogic<Msg, Model, Initial, Update> {
    initial: Initial,
    update: Update,
    _types: PhantomData<fn(Msg) -> Model>,
}

impl<Msg, Model, Initial, Update> FnLogic<Msg, Model, Initial, Update>
where
    Initial: Fn() -> (Model, Option<Effect<Msg>>),
    Update: Fn(Msg, &Model) -> (Model, Option<Effect<Msg>>),
{
    pub fn new(initial: Initial, update: Update) -> Self {
        Self {
            initial,
            update,
            _types: PhantomData,
        }
    }
}

impl<Msg, Model, Initial, Update> MvuLogic<Msg, Model, Model::Props>
    for FnLogic<Msg, Model, Initial, Update>
where
    Model: ModelViewable,
    Initial: Fn() -> (Model, Option<Effect<Msg>>),
    Update: Fn(Msg, &Model) -> (Model, Option<Effect<Msg>>),
{
    fn init(&self) -> (Model, Option<Effect<Msg>>) {
        (self.initial)()
    }

    fn update(&self, msg: Msg, model: &Model) -> (Model, Option<Effect<Msg>>) {
        (self.update)(msg, model)
    }

    fn view(&self, model: &Model) -> Model::Props {
        model.build_props()
    }
}
