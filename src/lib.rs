//! An Elm-style Model-View-Update runtime with three execution lanes.
//!
//! Every feature ("leaf") of an application is an instance of the same
//! [`Runtime`]: a model, a message type, a pure `update`, a `view` projecting
//! the model into Props, and a [`Renderer`]. The runtime owns the model and
//! keeps the moving parts on separate FIFO [lanes](Lanes):
//!
//! - the **transition** lane applies messages, one at a time, in arrival order
//! - the **render** lane hands every new Props snapshot to the renderer
//! - the **effect** lane runs the side effects `update` asked for
//!
//! Effects never touch the model; they report back by dispatching messages.
//! Errors are messages too: an effect that fails dispatches something like
//! `SetError(err)` and `update` decides what to do with it.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use oxide_leaf::{Effect, Lanes, MvuLogic, Runtime, TestRenderer};
//!
//! enum Msg {
//!     Increment,
//!     SetTo(i32),
//! }
//!
//! #[derive(Clone)]
//! struct Model {
//!     count: i32,
//! }
//!
//! struct Props {
//!     count: i32,
//! }
//!
//! struct Counter;
//!
//! impl MvuLogic<Msg, Model, Props> for Counter {
//!     fn init(&self) -> (Model, Option<Effect<Msg>>) {
//!         (Model { count: 0 }, None)
//!     }
//!
//!     fn update(&self, msg: Msg, model: &Model) -> (Model, Option<Effect<Msg>>) {
//!         match msg {
//!             Msg::Increment => (Model { count: model.count + 1 }, None),
//!             Msg::SetTo(count) => (Model { count }, None),
//!         }
//!     }
//!
//!     fn view(&self, model: &Model) -> Props {
//!         Props { count: model.count }
//!     }
//! }
//!
//! let renderer = TestRenderer::new();
//! let runtime = Runtime::new(Counter, renderer.clone(), Lanes::shared());
//!
//! runtime.dispatch(Msg::Increment);
//! runtime.dispatch(Msg::SetTo(10));
//!
//! assert!(renderer.wait_for_renders(3, Duration::from_secs(5)));
//! renderer.with_renders(|renders| {
//!     let counts: Vec<i32> = renders.iter().map(|props| props.count).collect();
//!     assert_eq!(counts, vec![0, 1, 10]);
//! });
//! ```
//!
//! ## Testing
//!
//! The `testing` feature exposes [`TestRuntime`], [`TestLanes`] and
//! [`TestRenderer`]: queue-backed lanes the test drains by hand, so every
//! interleaving is deterministic. [`Lanes::inline`] runs everything on the
//! calling thread instead, without any driving from the test.

// Module declarations
mod dispatch;
mod effect;
mod error;
mod lane;
mod logic;
mod renderer;
mod runtime;

// Public re-exports
pub use dispatch::Dispatch;
pub use effect::Effect;
pub use error::LaneError;
pub use lane::{InlineLane, Job, Lane, Lanes, ThreadLane};
pub use logic::{FnLogic, ModelViewable, MvuLogic};
pub use renderer::Renderer;
pub use runtime::{Runtime, RuntimeHandle};

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use lane::{ManualLane, TestLanes};
#[cfg(any(test, feature = "testing"))]
pub use renderer::TestRenderer;
#[cfg(any(test, feature = "testing"))]
pub use runtime::TestRuntime;
