//! Dispatch behaviour tests: ordering, shared parameters, filtering,
//! pending replay, failure isolation and test-only events

use crate::{
    event_params, register_observers, DispatcherConfig, EventDispatcher, EventError,
    EventParameters, Observer, PluginContext, PluginFilter, PluginName,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<String>>>;

fn recorder(calls: &Calls, label: &'static str) -> impl Fn(&mut EventParameters) -> Result<(), EventError> + Send + Sync + 'static {
    let calls = calls.clone();
    move |_params: &mut EventParameters| {
        calls.lock().unwrap().push(label.to_string());
        Ok(())
    }
}

fn test_dispatcher() -> Arc<EventDispatcher> {
    Arc::new(EventDispatcher::new(DispatcherConfig {
        test_mode: true,
        ..DispatcherConfig::default()
    }))
}

#[test]
fn test_observers_run_in_registration_order() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone());
    let calls = Calls::default();

    // interleave owners so nothing could be grouped by plugin
    context.for_plugin("Zeta").add_observer("Report.build", recorder(&calls, "zeta-1"));
    context.for_plugin("Alpha").add_observer("Report.build", recorder(&calls, "alpha-1"));
    dispatcher.add_observer("Report.build", recorder(&calls, "unowned"));
    context.for_plugin("Zeta").add_observer("Report.build", recorder(&calls, "zeta-2"));

    let mut params = EventParameters::new();
    let report = dispatcher.dispatch("Report.build", &mut params);

    assert_eq!(report.invoked, 4);
    assert_eq!(*calls.lock().unwrap(), vec!["zeta-1", "alpha-1", "unowned", "zeta-2"]);
}

#[test]
fn test_duplicate_registration_runs_twice() {
    let dispatcher = test_dispatcher();
    let calls = Calls::default();
    let observer = recorder(&calls, "dup");
    let observer = Arc::new(observer);

    for _ in 0..2 {
        let observer = observer.clone();
        dispatcher.add_observer("Site.created", move |params: &mut EventParameters| observer(params));
    }

    dispatcher.dispatch("Site.created", &mut EventParameters::new());
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn test_mutations_propagate_between_observers() {
    let dispatcher = test_dispatcher();
    let seen_by_b = Arc::new(Mutex::new(Vec::new()));

    dispatcher.add_observer("List.build", |params: &mut EventParameters| {
        let mut list: Vec<String> = params.get_as(0)?;
        list.push("x".to_string());
        params.set(0, list)
    });
    let seen = seen_by_b.clone();
    dispatcher.add_observer("List.build", move |params: &mut EventParameters| {
        let list: Vec<String> = params.get_as(0)?;
        *seen.lock().unwrap() = list;
        Ok(())
    });
    dispatcher.add_observer("List.build", |params: &mut EventParameters| {
        let mut list: Vec<String> = params.get_as(0)?;
        list.push("y".to_string());
        params.set(0, list)
    });

    let mut params = event_params![[]];
    let report = dispatcher.dispatch("List.build", &mut params);

    assert!(report.is_success());
    assert_eq!(*seen_by_b.lock().unwrap(), vec!["x".to_string()]);
    assert_eq!(params.get(0), Some(&json!(["x", "y"])));
}

#[test]
fn test_caller_sees_observer_mutation() {
    let dispatcher = test_dispatcher();
    let received = Arc::new(Mutex::new(None));

    let captured = received.clone();
    dispatcher.add_observer("Site.created", move |params: &mut EventParameters| {
        *captured.lock().unwrap() = params.get(0).cloned();
        params.set_field(0, "name", "demo")
    });

    let mut params = event_params![{ "siteId": 5 }];
    dispatcher.dispatch("Site.created", &mut params);

    assert_eq!(*received.lock().unwrap(), Some(json!({ "siteId": 5 })));
    assert_eq!(params.get(0), Some(&json!({ "siteId": 5, "name": "demo" })));
}

#[test]
fn test_dispatch_without_observers_is_noop() {
    let dispatcher = test_dispatcher();
    dispatcher.add_observer("Other.event", |_params| Ok(()));

    let mut params = event_params![1, 2];
    let report = dispatcher.dispatch("Nobody.listens", &mut params);

    assert_eq!(report.matched, 0);
    assert_eq!(report.invoked, 0);
    assert!(report.is_success());
    assert_eq!(params, event_params![1, 2]);
}

#[test]
fn test_plugin_filter_restricts_delivery() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone());
    let calls = Calls::default();

    context.for_plugin("Goals").add_observer("Site.created", recorder(&calls, "goals"));
    context.for_plugin("Referrers").add_observer("Site.created", recorder(&calls, "referrers"));
    dispatcher.add_observer("Site.created", recorder(&calls, "unowned"));
    context.for_plugin("SitesManager").add_observer("Site.created", recorder(&calls, "sites"));

    let filter: PluginFilter = ["Goals", "SitesManager"].into_iter().collect();
    let report = dispatcher.post_event("Site.created", &mut EventParameters::new(), false, Some(&filter));

    assert_eq!(report.matched, 2);
    assert_eq!(*calls.lock().unwrap(), vec!["goals", "sites"]);

    // the registry is untouched for later unfiltered dispatches
    calls.lock().unwrap().clear();
    dispatcher.dispatch("Site.created", &mut EventParameters::new());
    assert_eq!(*calls.lock().unwrap(), vec!["goals", "referrers", "unowned", "sites"]);
}

#[test_log::test]
fn test_failing_observers_are_isolated() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone());
    let calls = Calls::default();

    dispatcher.add_observer("Visit.recorded", recorder(&calls, "first"));
    context
        .for_plugin("Broken")
        .add_observer("Visit.recorded", |_params| Err(EventError::ObserverFailed("db down".to_string())));
    dispatcher.add_observer("Visit.recorded", |_params: &mut EventParameters| -> Result<(), EventError> {
        panic!("observer bug")
    });
    dispatcher.add_observer("Visit.recorded", recorder(&calls, "last"));

    let report = dispatcher.dispatch("Visit.recorded", &mut EventParameters::new());

    assert_eq!(*calls.lock().unwrap(), vec!["first", "last"]);
    assert_eq!(report.matched, 4);
    assert_eq!(report.invoked, 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].plugin, Some(PluginName::from("Broken")));
    assert!(report.failures[0].message.contains("db down"));
    assert!(report.failures[1].message.contains("observer bug"));

    let stats = dispatcher.stats();
    assert_eq!(stats.observer_failures, 2);
    assert_eq!(stats.observers_invoked, 2);
}

#[test]
fn test_test_only_dispatch_disabled_is_inert() {
    let dispatcher = Arc::new(EventDispatcher::new(DispatcherConfig::default()));
    let calls = Calls::default();
    dispatcher.add_observer("Test.hook", recorder(&calls, "spy"));
    let before = dispatcher.stats();

    let mut params = event_params![1];
    let outcome = dispatcher.post_test_event("Test.hook", &mut params, true, None);

    assert!(outcome.is_none());
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(dispatcher.stats(), before);
    assert_eq!(dispatcher.stats().registry_lookups, 0);
    assert!(dispatcher.pending_events().is_empty());
}

#[test]
fn test_test_only_dispatch_enabled_behaves_like_post() {
    let dispatcher = test_dispatcher();
    let calls = Calls::default();
    dispatcher.add_observer("Test.hook", recorder(&calls, "spy"));

    let report = dispatcher
        .post_test_event("Test.hook", &mut EventParameters::new(), false, None)
        .unwrap();

    assert_eq!(report.invoked, 1);
    assert_eq!(*calls.lock().unwrap(), vec!["spy"]);
}

#[test]
fn test_pending_dispatch_delivers_immediately_and_replays() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone());
    let calls = Calls::default();

    context.for_plugin("Early").add_observer("Host.initialized", recorder(&calls, "early"));

    let mut params = event_params![{ "version": "1.0" }];
    let report = dispatcher.post_event("Host.initialized", &mut params, true, None);
    assert_eq!(report.invoked, 1);
    assert_eq!(*calls.lock().unwrap(), vec!["early"]);

    // a plugin loaded afterwards only gets the replay, the early one is not re-run
    context.for_plugin("Late").add_observer("Host.initialized", recorder(&calls, "late"));
    let replays = dispatcher.post_pending_events_to(&PluginName::from("Late"));

    assert_eq!(replays.len(), 1);
    assert_eq!(replays[0].invoked, 1);
    assert_eq!(*calls.lock().unwrap(), vec!["early", "late"]);
}

#[test]
fn test_replay_uses_parameters_as_posted() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone());

    dispatcher.add_observer("Site.created", |params: &mut EventParameters| params.set(0, 99));
    let mut params = event_params![5];
    dispatcher.post_event("Site.created", &mut params, true, None);
    assert_eq!(params.get(0), Some(&json!(99)));

    let replayed = Arc::new(Mutex::new(None));
    let captured = replayed.clone();
    context.for_plugin("Late").add_observer("Site.created", move |params: &mut EventParameters| {
        *captured.lock().unwrap() = params.get(0).cloned();
        Ok(())
    });
    dispatcher.post_pending_events_to(&PluginName::from("Late"));

    assert_eq!(*replayed.lock().unwrap(), Some(json!(5)));
}

#[test]
fn test_replay_respects_original_filter() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone());
    let calls = Calls::default();

    let goals_only = PluginFilter::only("Goals");
    dispatcher.post_event("Site.created", &mut EventParameters::new(), true, Some(&goals_only));

    context.for_plugin("Referrers").add_observer("Site.created", recorder(&calls, "referrers"));
    let replays = dispatcher.post_pending_events_to(&PluginName::from("Referrers"));
    assert!(replays.is_empty());

    context.for_plugin("Goals").add_observer("Site.created", recorder(&calls, "goals"));
    dispatcher.post_pending_events_to(&PluginName::from("Goals"));
    assert_eq!(*calls.lock().unwrap(), vec!["goals"]);
}

#[test]
fn test_reentrant_registration_and_dispatch() {
    let dispatcher = test_dispatcher();
    let calls = Calls::default();

    let inner = dispatcher.clone();
    let inner_calls = calls.clone();
    dispatcher.add_observer("Outer.event", move |params: &mut EventParameters| {
        // registering during dispatch only affects later dispatches
        inner.add_observer("Outer.event", |_params| Ok(()));
        inner.dispatch("Inner.event", params);
        inner_calls.lock().unwrap().push("outer".to_string());
        Ok(())
    });
    dispatcher.add_observer("Inner.event", recorder(&calls, "inner"));

    let report = dispatcher.dispatch("Outer.event", &mut EventParameters::new());

    assert_eq!(report.matched, 1);
    assert_eq!(*calls.lock().unwrap(), vec!["inner", "outer"]);
    assert_eq!(dispatcher.observer_count("Outer.event"), 2);
}

#[test]
fn test_register_observers_macro_keeps_order() {
    let dispatcher = test_dispatcher();
    let context = PluginContext::new(dispatcher.clone()).for_plugin("Goals");
    let calls = Calls::default();

    register_observers!(context;
        "Goal.converted" => recorder(&calls, "a"),
        "Goal.converted" => recorder(&calls, "b"),
        "Goal.deleted" => recorder(&calls, "c"),
    );

    dispatcher.dispatch("Goal.converted", &mut EventParameters::new());
    assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    assert!(dispatcher
        .observers_for("Goal.deleted")
        .iter()
        .all(|observer: &Arc<Observer>| observer.plugin() == Some(&PluginName::from("Goals"))));
}
