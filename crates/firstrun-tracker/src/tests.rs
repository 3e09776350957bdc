use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use firstrun_core::{InstallStatus, PackageDescriptor};

use super::*;

fn descriptor(name: &str, can_continue: bool) -> PackageDescriptor {
    PackageDescriptor {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        icon: "folder.png".to_string(),
        status_icons: BTreeMap::new(),
        can_continue,
    }
}

fn recorder(
    tracker: &mut InstallTracker,
) -> Arc<Mutex<Vec<LifecycleEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tracker.subscribe(move |event| sink.lock().expect("recorder lock").push(event));
    seen
}

#[test]
fn matcher_first_matching_rule_wins() {
    let matcher = LineMatcher::new(vec![
        MatchRule::new(InstallStatus::Failed, r"FAILED: Install (\S+)-([^-\s]+)\.pkg")
            .expect("must build rule"),
        MatchRule::new(InstallStatus::Installing, r"Install (\S+)-([^-\s]+)\.pkg")
            .expect("must build rule"),
    ]);

    let event = matcher
        .classify("FAILED: Install Chrome-1.0.pkg")
        .expect("line must match");
    assert_eq!(event.status, InstallStatus::Failed);
    assert_eq!(event.name, "Chrome");
    assert_eq!(event.version, "1.0");

    // same rules in the opposite order resolve the overlap the other way
    let reversed = LineMatcher::new(vec![
        MatchRule::new(InstallStatus::Installing, r"Install (\S+)-([^-\s]+)\.pkg")
            .expect("must build rule"),
        MatchRule::new(InstallStatus::Failed, r"FAILED: Install (\S+)-([^-\s]+)\.pkg")
            .expect("must build rule"),
    ]);
    let event = reversed
        .classify("FAILED: Install Chrome-1.0.pkg")
        .expect("line must match");
    assert_eq!(event.status, InstallStatus::Installing);
}

#[test]
fn matcher_rejects_patterns_without_two_capture_groups() {
    let err = MatchRule::new(InstallStatus::Success, r"Successfully installed (\S+)")
        .expect_err("must reject single-group pattern");
    assert!(err.to_string().contains("found 1 groups"));

    let err = MatchRule::new(InstallStatus::Success, r"(\S+) (\S+) (\S+)")
        .expect_err("must reject three-group pattern");
    assert!(err.to_string().contains("found 3 groups"));
}

#[test]
fn matcher_requires_both_groups_to_participate() {
    let matcher = LineMatcher::new(vec![MatchRule::new(
        InstallStatus::Success,
        r"Removed package ([a-z]+)(?:-([0-9]+))?",
    )
    .expect("must build rule")]);

    assert_eq!(matcher.classify("Removed package chrome"), None);

    let event = matcher
        .classify("Removed package chrome-14")
        .expect("line with both groups must match");
    assert_eq!(event.version, "14");
}

#[test]
fn matcher_ignores_unrelated_lines() {
    let matcher = LineMatcher::jamf_default();
    assert_eq!(matcher.classify("random kernel message"), None);
    assert_eq!(matcher.classify(""), None);
}

#[test]
fn jamf_default_recognizes_the_log_phrasings() {
    let matcher = LineMatcher::jamf_default();

    let event = matcher
        .classify("Wed Mar 07 Installing Chrome-1.0.pkg...")
        .expect("installing line must match");
    assert_eq!(
        event,
        MatchedEvent {
            name: "Chrome".to_string(),
            version: "1.0".to_string(),
            status: InstallStatus::Installing,
        }
    );

    let event = matcher
        .classify("Successfully installed Chrome-1.0.pkg.")
        .expect("success line must match");
    assert_eq!(event.status, InstallStatus::Success);

    let event = matcher
        .classify(
            "Installation failed. The installer reported: installer: Package name is Chrome-1.0.pkg",
        )
        .expect("failure line must match");
    assert_eq!(event.status, InstallStatus::Failed);
    assert_eq!(event.name, "Chrome");
}

#[test]
fn jamf_default_keeps_dashed_names_intact() {
    let matcher = LineMatcher::jamf_default();
    let event = matcher
        .classify("Installing Google-Chrome-114.0.pkg...")
        .expect("line must match");
    assert_eq!(event.name, "Google-Chrome");
    assert_eq!(event.version, "114.0");
}

#[test]
fn matcher_loads_rules_from_toml() {
    let matcher = LineMatcher::from_toml_str(
        r#"
[[rules]]
status = "failed"
pattern = 'FAILED (\S+)-([^-\s]+)\.pkg'

[[rules]]
status = "success"
pattern = 'DONE (\S+)-([^-\s]+)\.pkg'
"#,
    )
    .expect("rule file must load");

    let event = matcher
        .classify("DONE Chrome-1.0.pkg")
        .expect("line must match");
    assert_eq!(event.status, InstallStatus::Success);
}

#[test]
fn matcher_rejects_rule_files_with_unknown_status() {
    let err = LineMatcher::from_toml_str(
        "[[rules]]\nstatus = \"exploded\"\npattern = '(a)(b)'\n",
    )
    .expect_err("must reject unknown status");
    assert!(err.to_string().contains("unknown status 'exploded'"));
}

#[test]
fn matcher_rejects_empty_rule_files() {
    let err = LineMatcher::from_toml_str("").expect_err("must reject empty rule file");
    assert!(err.to_string().contains("no rules"));
}

#[test]
fn registry_seed_creates_pending_entries_in_catalog_order() {
    let registry = PackageRegistry::seed(&[
        descriptor("Chrome", true),
        descriptor("Office", false),
    ]);

    let names: Vec<&str> = registry
        .packages()
        .iter()
        .map(|package| package.name.as_str())
        .collect();
    assert_eq!(names, vec!["Chrome", "Office"]);
    assert!(registry
        .packages()
        .iter()
        .all(|package| package.status == InstallStatus::Pending));
}

#[test]
fn registry_seed_collapses_duplicate_descriptors() {
    let registry = PackageRegistry::seed(&[
        descriptor("Chrome", true),
        descriptor("Chrome", false),
    ]);

    assert_eq!(registry.len(), 1);
    assert!(registry.get("Chrome").expect("entry must exist").required_for_continue);
}

#[test]
fn registry_mutates_existing_entries_and_discovers_unknown_ones() {
    let mut registry = PackageRegistry::seed(&[descriptor("Chrome", true)]);

    registry.apply_event(&MatchedEvent {
        name: "Chrome".to_string(),
        version: "1.0".to_string(),
        status: InstallStatus::Installing,
    });
    let chrome = registry.get("Chrome").expect("entry must exist");
    assert_eq!(chrome.status, InstallStatus::Installing);
    assert_eq!(chrome.version.as_deref(), Some("1.0"));
    assert!(chrome.visible_in_ui, "catalog entry must stay visible");

    registry.apply_event(&MatchedEvent {
        name: "SneakyTool".to_string(),
        version: "0.1".to_string(),
        status: InstallStatus::Installing,
    });
    assert_eq!(registry.len(), 2);
    let sneaky = registry.get("SneakyTool").expect("entry must exist");
    assert!(!sneaky.visible_in_ui);
    assert!(sneaky.required_for_continue);
    assert_eq!(registry.visible().len(), 1);
    assert_eq!(registry.gating().len(), 2);
}

#[test]
fn registry_ignores_empty_version_captures() {
    let mut registry = PackageRegistry::seed(&[descriptor("Chrome", true)]);

    registry.apply_event(&MatchedEvent {
        name: "Chrome".to_string(),
        version: String::new(),
        status: InstallStatus::Installing,
    });
    assert_eq!(
        registry.get("Chrome").expect("entry must exist").version,
        None
    );

    registry.apply_event(&MatchedEvent {
        name: "Chrome".to_string(),
        version: "1.0".to_string(),
        status: InstallStatus::Success,
    });
    assert_eq!(
        registry
            .get("Chrome")
            .expect("entry must exist")
            .version
            .as_deref(),
        Some("1.0")
    );
}

#[test]
fn aggregate_flags_are_all_false_for_an_empty_set() {
    assert_eq!(AggregateFlags::compute(&[]), AggregateFlags::default());
}

#[test]
fn scenario_a_single_required_package_succeeds() {
    let mut tracker = InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());
    let seen = recorder(&mut tracker);

    assert!(tracker.apply_log_line("Installing Chrome-1.0.pkg...").is_empty());
    let fired = tracker.apply_log_line("Successfully installed Chrome-1.0.pkg.");
    assert_eq!(
        fired,
        vec![
            LifecycleEvent::CanContinue,
            LifecycleEvent::DoneInstalling,
            LifecycleEvent::AllSuccess,
        ]
    );

    let chrome = tracker.get("Chrome").expect("entry must exist");
    assert_eq!(chrome.status, InstallStatus::Success);
    assert_eq!(chrome.version.as_deref(), Some("1.0"));

    let seen = seen.lock().expect("recorder lock");
    assert_eq!(
        *seen,
        vec![
            LifecycleEvent::CanContinue,
            LifecycleEvent::DoneInstalling,
            LifecycleEvent::AllSuccess,
        ]
    );
    assert!(!seen.contains(&LifecycleEvent::ErrorWhileInstalling));
}

#[test]
fn scenario_b_failed_required_package_still_allows_continue() {
    let mut tracker = InstallTracker::new(
        &[descriptor("Chrome", true), descriptor("Office", false)],
        LineMatcher::jamf_default(),
    );
    let seen = recorder(&mut tracker);

    let fired = tracker.apply_log_line(
        "Installation failed. The installer reported: installer: Package name is Chrome-1.0.pkg",
    );
    assert_eq!(
        fired,
        vec![
            LifecycleEvent::ErrorWhileInstalling,
            LifecycleEvent::CanContinue,
        ]
    );

    let fired = tracker.apply_log_line("Successfully installed Office-16.0.pkg.");
    assert_eq!(fired, vec![LifecycleEvent::DoneInstalling]);

    let seen = seen.lock().expect("recorder lock");
    assert!(!seen.contains(&LifecycleEvent::AllSuccess));

    let flags = tracker.flags();
    assert!(flags.any_failure && flags.required_complete && flags.all_complete);
    assert!(!flags.all_succeeded);
}

#[test]
fn scenario_c_discovered_package_gates_continue() {
    let mut tracker =
        InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());

    tracker.apply_log_line("Installing SneakyTool-0.1.pkg...");
    let sneaky = tracker.get("SneakyTool").expect("entry must exist");
    assert!(!sneaky.visible_in_ui);
    assert!(sneaky.required_for_continue);

    // the catalog package finishing is not enough while the discovered one
    // is still installing
    let fired = tracker.apply_log_line("Successfully installed Chrome-1.0.pkg.");
    assert!(fired.is_empty());
    assert!(!tracker.flags().required_complete);

    let fired = tracker.apply_log_line("Successfully installed SneakyTool-0.1.pkg.");
    assert_eq!(
        fired,
        vec![
            LifecycleEvent::CanContinue,
            LifecycleEvent::DoneInstalling,
            LifecycleEvent::AllSuccess,
        ]
    );
}

#[test]
fn scenario_d_unparseable_lines_are_inert() {
    let mut tracker =
        InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());
    let seen = recorder(&mut tracker);

    let before = tracker.snapshot();
    assert!(tracker.apply_log_line("random kernel message").is_empty());
    assert_eq!(tracker.snapshot(), before);
    assert!(seen.lock().expect("recorder lock").is_empty());
}

#[test]
fn duplicate_log_lines_never_refire_flags() {
    let mut tracker =
        InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());

    let fired = tracker.apply_log_line("Successfully installed Chrome-1.0.pkg.");
    assert_eq!(fired.len(), 3);

    let fired = tracker.apply_log_line("Successfully installed Chrome-1.0.pkg.");
    assert!(fired.is_empty());
    assert_eq!(
        tracker.get("Chrome").expect("entry must exist").status,
        InstallStatus::Success
    );
}

#[test]
fn flags_stay_latched_across_a_retry() {
    let mut tracker =
        InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());

    tracker.apply_log_line(
        "Installation failed. The installer reported: installer: Package name is Chrome-1.0.pkg",
    );
    assert!(tracker.flags().all_complete);

    // an explicit retry line regresses the package status but no latched
    // flag resets and nothing re-fires
    let fired = tracker.apply_log_line("Installing Chrome-1.0.pkg...");
    assert!(fired.is_empty());
    assert_eq!(
        tracker.get("Chrome").expect("entry must exist").status,
        InstallStatus::Installing
    );
    assert!(tracker.flags().all_complete);

    let fired = tracker.apply_log_line("Successfully installed Chrome-1.0.pkg.");
    assert_eq!(fired, vec![LifecycleEvent::AllSuccess]);
}

#[test]
fn simultaneous_flips_emit_in_declaration_order() {
    let mut tracker =
        InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());

    let fired = tracker.apply_log_line(
        "Installation failed. The installer reported: installer: Package name is Chrome-1.0.pkg",
    );
    assert_eq!(
        fired,
        vec![
            LifecycleEvent::ErrorWhileInstalling,
            LifecycleEvent::CanContinue,
            LifecycleEvent::DoneInstalling,
        ]
    );
}

#[test]
fn aggregate_implications_hold_after_every_line() {
    let lines = [
        "Installing Chrome-1.0.pkg...",
        "Installation failed. The installer reported: installer: Package name is Chrome-1.0.pkg",
        "Installing Office-16.0.pkg...",
        "Successfully installed Office-16.0.pkg.",
        "random kernel message",
        "Installing Chrome-1.0.pkg...",
        "Successfully installed Chrome-1.0.pkg.",
    ];
    let mut tracker = InstallTracker::new(
        &[descriptor("Chrome", true), descriptor("Office", false)],
        LineMatcher::jamf_default(),
    );

    for line in lines {
        tracker.apply_log_line(line);
        let flags = tracker.flags();
        if flags.all_complete {
            assert!(flags.required_complete, "all_complete implies required_complete");
        }
        if flags.all_succeeded {
            assert!(flags.all_complete, "all_succeeded implies all_complete");
        }
    }
}

#[test]
fn failure_latch_survives_an_eventually_successful_retry() {
    let mut tracker =
        InstallTracker::new(&[descriptor("Chrome", true)], LineMatcher::jamf_default());
    let seen = recorder(&mut tracker);

    tracker.apply_log_line(
        "Installation failed. The installer reported: installer: Package name is Chrome-1.0.pkg",
    );
    tracker.apply_log_line("Installing Chrome-1.0.pkg...");
    tracker.apply_log_line("Successfully installed Chrome-1.0.pkg.");

    // all_succeeded eventually flips (every package is success now) but the
    // failure latch stays true forever
    let flags = tracker.flags();
    assert!(flags.any_failure);
    assert!(flags.all_succeeded);

    // instantaneously the two conditions are mutually exclusive
    let current = AggregateFlags::compute(&tracker.snapshot());
    assert!(current.all_succeeded);
    assert!(!current.any_failure);

    let seen = seen.lock().expect("recorder lock");
    assert_eq!(
        seen.iter()
            .filter(|event| **event == LifecycleEvent::ErrorWhileInstalling)
            .count(),
        1
    );
}

#[test]
fn event_bus_delivers_per_kind_subscriptions_only() {
    let mut bus = EventBus::new();
    let continue_seen = Arc::new(Mutex::new(Vec::new()));
    let all_seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&continue_seen);
    bus.subscribe_to(LifecycleEvent::CanContinue, move |event| {
        sink.lock().expect("lock").push(event);
    });
    let sink = Arc::clone(&all_seen);
    bus.subscribe(move |event| {
        sink.lock().expect("lock").push(event);
    });

    bus.publish(LifecycleEvent::ErrorWhileInstalling);
    bus.publish(LifecycleEvent::CanContinue);
    bus.publish(LifecycleEvent::DoneInstalling);

    assert_eq!(
        *continue_seen.lock().expect("lock"),
        vec![LifecycleEvent::CanContinue]
    );
    assert_eq!(
        *all_seen.lock().expect("lock"),
        vec![
            LifecycleEvent::ErrorWhileInstalling,
            LifecycleEvent::CanContinue,
            LifecycleEvent::DoneInstalling,
        ]
    );
}
