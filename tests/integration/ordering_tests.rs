use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use oxide_leaf::{Lanes, ModelViewable, Runtime, TestRenderer, TestRuntime};

use super::{plain_counter_update, rendered_counts, CounterModel, CounterMsg};

const TIMEOUT: Duration = Duration::from_secs(10);
const PRODUCERS: usize = 4;
const MESSAGES_PER_PRODUCER: usize = 250;

#[derive(Clone, Debug)]
struct Tagged {
    producer: usize,
    seq: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct LedgerModel {
    applied: usize,
    next_seq: Vec<usize>,
    out_of_order: usize,
}

impl ModelViewable for LedgerModel {
    type Props = usize;

    fn build_props(&self) -> usize {
        self.applied
    }
}

fn scenario() -> Vec<CounterMsg> {
    vec![
        CounterMsg::Increment,
        CounterMsg::Increment,
        CounterMsg::SetTo(10),
        CounterMsg::Increment,
    ]
}

#[test]
fn given_concurrent_producers_should_apply_messages_one_at_a_time_in_arrival_order() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let update = {
        let in_flight = in_flight.clone();
        let max_in_flight = max_in_flight.clone();
        move |msg: Tagged, model: &LedgerModel| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::yield_now();

            let mut next = model.clone();
            if next.next_seq[msg.producer] != msg.seq {
                next.out_of_order += 1;
            }
            next.next_seq[msg.producer] = msg.seq + 1;
            next.applied += 1;

            in_flight.fetch_sub(1, Ordering::SeqCst);
            (next, None)
        }
    };
    let renderer = TestRenderer::new();
    let runtime = Runtime::create_with_lanes(
        || {
            let model = LedgerModel {
                next_seq: vec![0; PRODUCERS],
                ..LedgerModel::default()
            };
            (model, None)
        },
        update,
        renderer.clone(),
        Lanes::dedicated("ordering").expect("lanes spawn"),
    );

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let dispatch = runtime.dispatcher();
            thread::spawn(move || {
                for seq in 0..MESSAGES_PER_PRODUCER {
                    dispatch.dispatch(Tagged { producer, seq });
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer finished");
    }

    let total = PRODUCERS * MESSAGES_PER_PRODUCER;
    assert!(renderer.wait_for_renders(total + 1, TIMEOUT));

    let model = runtime.current_model();
    assert_eq!(model.applied, total);
    assert_eq!(model.out_of_order, 0);
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);

    // every step rendered once, in transition order
    renderer.with_renders(|renders| {
        assert_eq!(*renders, (0..=total).collect::<Vec<_>>());
    });
}

#[test]
fn given_scenario_on_shared_lanes_should_render_each_step_in_order() {
    let renderer = TestRenderer::new();
    let runtime = Runtime::create(
        || (CounterModel { count: 0 }, None),
        plain_counter_update,
        renderer.clone(),
    );

    for msg in scenario() {
        runtime.dispatch(msg);
    }

    assert!(renderer.wait_for_renders(5, TIMEOUT));
    assert_eq!(rendered_counts(&renderer), vec![0, 1, 2, 10, 11]);
}

#[test]
fn given_the_same_messages_should_produce_the_same_models_on_any_lanes() {
    let manual_renderer = TestRenderer::new();
    let manual = TestRuntime::create(
        || (CounterModel { count: 0 }, None),
        plain_counter_update,
        manual_renderer.clone(),
    );
    let threaded_renderer = TestRenderer::new();
    let threaded = Runtime::create_with_lanes(
        || (CounterModel { count: 0 }, None),
        plain_counter_update,
        threaded_renderer.clone(),
        Lanes::dedicated("determinism").expect("lanes spawn"),
    );

    for msg in scenario() {
        manual.dispatch(msg.clone());
        threaded.dispatch(msg);
    }
    manual.process_events();

    assert!(threaded_renderer.wait_for_renders(5, TIMEOUT));
    assert_eq!(rendered_counts(&manual_renderer), rendered_counts(&threaded_renderer));
    assert_eq!(manual.current_model(), threaded.current_model());
}

#[test]
fn given_a_runtime_should_call_initial_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let initial = {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            (CounterModel { count: 0 }, None)
        }
    };
    let renderer = TestRenderer::new();
    let runtime = TestRuntime::create(initial, plain_counter_update, renderer.clone());

    runtime.dispatch(CounterMsg::Increment);
    runtime.process_events();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(rendered_counts(&renderer), vec![0, 1]);
}

#[test]
fn given_a_slow_renderer_should_still_observe_each_snapshot() {
    let renderer = TestRenderer::new();
    let slow = {
        let mut renderer = renderer.clone();
        move |props: i32, dispatch: &oxide_leaf::Dispatch<CounterMsg>| {
            thread::sleep(Duration::from_millis(2));
            oxide_leaf::Renderer::render(&mut renderer, props, dispatch);
        }
    };
    let runtime = Runtime::create_with_lanes(
        || (CounterModel { count: 0 }, None),
        plain_counter_update,
        slow,
        Lanes::dedicated("slow-render").expect("lanes spawn"),
    );

    for _ in 0..20 {
        runtime.dispatch(CounterMsg::Increment);
    }

    // transitions outrun the renderer without corrupting earlier snapshots
    assert!(renderer.wait_for_renders(21, TIMEOUT));
    assert_eq!(rendered_counts(&renderer), (0..=20).collect::<Vec<_>>());
}

#[test]
fn given_a_running_update_should_still_answer_current_model() {
    let (entered_tx, entered_rx) = flume::bounded(1);
    let (release_tx, release_rx) = flume::bounded::<()>(1);
    let update = move |msg: CounterMsg, model: &CounterModel| match msg {
        CounterMsg::SetTo(count) => {
            let _ = entered_tx.send(());
            let _ = release_rx.recv_timeout(TIMEOUT);
            (CounterModel { count }, None)
        }
        other => plain_counter_update(other, model),
    };
    let renderer = TestRenderer::new();
    let runtime = Runtime::create_with_lanes(
        || (CounterModel { count: 0 }, None),
        update,
        renderer.clone(),
        Lanes::dedicated("busy-update").expect("lanes spawn"),
    );

    runtime.dispatch(CounterMsg::SetTo(5));
    entered_rx.recv_timeout(TIMEOUT).expect("update started");

    // the update is parked, the last completed transition is still visible
    assert_eq!(runtime.current_model(), CounterModel { count: 0 });

    release_tx.send(()).expect("update still waiting");
    assert!(renderer.wait_for_renders(2, TIMEOUT));
    assert_eq!(runtime.current_model(), CounterModel { count: 5 });
}
