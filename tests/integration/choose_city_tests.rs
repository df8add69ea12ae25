use mockall::predicate::eq;

use super::{build_choose_city_test, ApiError, ChooseCityMsg, City, MockCitiesApi};

#[test]
fn given_cities_are_available_should_list_selected_city_first() {
    let mut api = MockCitiesApi::new();
    api.expect_get_cities()
        .with(eq(1))
        .times(1)
        .returning(|_| Ok(vec![City::new(2, "Kazan"), City::new(1, "Moscow")]));
    let (runtime, renderer) = build_choose_city_test(api);

    runtime.process_events();

    renderer.with_renders(|renders| {
        let last = renders.last().expect("at least one render");
        assert_eq!(
            last.cities,
            vec![City::new(1, "Moscow"), City::new(2, "Kazan")]
        );
        assert_eq!(last.error, None);
    });
}

#[test]
fn given_initial_render_should_only_list_selected_city() {
    let api = MockCitiesApi::new();
    let (runtime, renderer) = build_choose_city_test(api);

    // only the startup step, the load has not run yet
    runtime.lanes().transition.run_until_idle();
    runtime.lanes().render.run_until_idle();

    renderer.with_renders(|renders| {
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].cities, vec![City::new(1, "Moscow")]);
    });
}

#[test]
fn given_api_failure_should_surface_error_as_props() {
    let mut api = MockCitiesApi::new();
    api.expect_get_cities()
        .times(1)
        .returning(|_| Err(ApiError::Offline));
    let (runtime, renderer) = build_choose_city_test(api);

    runtime.process_events();

    assert_eq!(runtime.current_model().error, Some(ApiError::Offline));
    renderer.with_renders(|renders| {
        assert_eq!(renders.last().map(|props| props.error.clone()), Some(Some(ApiError::Offline)));
    });
}

#[test]
fn given_a_surfaced_error_when_cleared_should_render_without_error() {
    let mut api = MockCitiesApi::new();
    api.expect_get_cities()
        .times(1)
        .returning(|_| Err(ApiError::Offline));
    let (runtime, renderer) = build_choose_city_test(api);
    runtime.process_events();

    let dispatch = renderer.last_dispatch().expect("a render happened");
    dispatch.dispatch(ChooseCityMsg::SetError(None));
    runtime.process_events();

    assert_eq!(runtime.current_model().error, None);
    renderer.with_renders(|renders| {
        assert_eq!(renders.last().and_then(|props| props.error.clone()), None);
    });
}

#[test]
fn given_a_refresh_request_should_query_the_api_again() {
    let mut api = MockCitiesApi::new();
    api.expect_get_cities()
        .times(2)
        .returning(|_| Ok(vec![City::new(3, "Tver")]));
    let (runtime, renderer) = build_choose_city_test(api);
    runtime.process_events();

    runtime.dispatch(ChooseCityMsg::RequestCities);
    runtime.process_events();

    // initial, startup request, loaded, refresh request, reloaded
    assert_eq!(renderer.count(), 5);
}
