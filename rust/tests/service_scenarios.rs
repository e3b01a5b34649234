use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use taskgraph_cpm::{
    Dependency, DependencyError, ErrorKind, FixedClock, InMemoryTaskStore, NewTask,
    SchedulerConfig, ServiceError, Task, TaskGraphService, TaskId, TaskRepository,
};

type Service = TaskGraphService<InMemoryTaskStore, FixedClock>;

fn make_service() -> Service {
    make_service_with(SchedulerConfig::default())
}

fn make_service_with(config: SchedulerConfig) -> Service {
    // Monday
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap());
    TaskGraphService::with_clock(InMemoryTaskStore::new(), config, clock)
}

fn day(offset: u64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2025, 1, 6).and_then(|d| d.checked_add_days(chrono::Days::new(offset)))
}

fn create(service: &Service, title: &str, duration: u32) -> TaskId {
    service
        .create_task(NewTask::new(title).with_duration(duration))
        .unwrap()
        .id
}

fn stored(service: &Service) -> HashMap<TaskId, Task> {
    service
        .list_tasks()
        .unwrap()
        .into_iter()
        .map(|d| (d.task.id, d.task))
        .collect()
}

/// B depends on A, C depends on B.
fn seed_chain(service: &Service) -> (TaskId, TaskId, TaskId) {
    let a = create(service, "A", 2);
    let b = create(service, "B", 3);
    let c = create(service, "C", 1);
    service.add_dependency(b, a).unwrap();
    service.add_dependency(c, b).unwrap();
    (a, b, c)
}

#[test]
fn test_chain_schedule_is_persisted() {
    let service = make_service();
    let (a, b, c) = seed_chain(&service);

    let report = service.recompute_schedule().unwrap();
    assert_eq!(report.project_duration, 6);

    let tasks = stored(&service);
    assert_eq!(tasks[&a].earliest_start_date, day(0));
    assert_eq!(tasks[&b].earliest_start_date, day(2));
    assert_eq!(tasks[&c].earliest_start_date, day(5));
    assert!(tasks.values().all(|t| t.is_critical));
}

#[test]
fn test_isolated_long_task_takes_over_critical_path() {
    let service = make_service();
    let (a, b, c) = seed_chain(&service);
    let d = create(&service, "D", 10);

    let tasks = stored(&service);
    assert_eq!(tasks[&d].earliest_start_date, day(0));
    assert!(tasks[&d].is_critical);
    assert!(!tasks[&a].is_critical);
    assert!(!tasks[&b].is_critical);
    assert!(!tasks[&c].is_critical);

    let info = service.dependency_info().unwrap();
    assert_eq!(info.critical_path.critical_path, vec![d]);
    assert_eq!(info.critical_path.total_duration, 10);
    assert_eq!(
        info.dependencies,
        vec![Dependency::new(b, a), Dependency::new(c, b)]
    );
}

#[test]
fn test_closing_the_chain_is_rejected_every_time() {
    let service = make_service();
    let (a, _, c) = seed_chain(&service);
    let before = stored(&service);
    let expected = Err(ServiceError::Dependency(DependencyError::WouldCreateCycle {
        task_id: a,
        depends_on_id: c,
    }));

    assert_eq!(service.add_dependency(a, c), expected);
    assert_eq!(service.add_dependency(a, c), expected);
    assert_eq!(service.dependency_info().unwrap().dependencies.len(), 2);
    assert_eq!(stored(&service), before);
}

#[test]
fn test_self_dependency_always_rejected() {
    let service = make_service();
    let expected = Err(ServiceError::Dependency(DependencyError::SelfDependency(5)));
    assert_eq!(service.add_dependency(5, 5), expected);

    seed_chain(&service);
    create(&service, "E", 1);
    assert_eq!(service.add_dependency(5, 5), expected);
}

#[test]
fn test_duplicate_edge_is_a_caller_error() {
    let service = make_service();
    let (a, b, _) = seed_chain(&service);
    let err = service.add_dependency(b, a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.public_message(),
        format!("task {b} already depends on task {a}")
    );
}

#[test]
fn test_removing_an_edge_reroutes_criticality() {
    // D waits on two equal-length branches through B and C
    let service = make_service();
    let a = create(&service, "A", 2);
    let b = create(&service, "B", 3);
    let c = create(&service, "C", 3);
    let d = create(&service, "D", 1);
    for (task, on) in [(b, a), (c, a), (d, b), (d, c)] {
        service.add_dependency(task, on).unwrap();
    }
    let tasks = stored(&service);
    assert!(tasks.values().all(|t| t.is_critical));

    let report = service.remove_dependency(d, b).unwrap();
    assert_eq!(report.project_duration, 6);
    let tasks = stored(&service);
    assert!(!tasks[&b].is_critical);
    assert!(tasks[&a].is_critical && tasks[&c].is_critical && tasks[&d].is_critical);

    let report = service.remove_dependency(d, c).unwrap();
    assert_eq!(report.project_duration, 5);
    assert_eq!(stored(&service)[&d].earliest_start_date, day(0));
}

#[test]
fn test_failed_write_back_leaves_nothing_behind() {
    let service = make_service();
    let (a, _, c) = seed_chain(&service);
    let before = stored(&service);

    service.repository().set_fail_derived_writes(true);
    let err = service.remove_dependency(c, a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service.add_dependency(c, a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(
        err.public_message(),
        "task store temporarily unavailable, please retry"
    );
    assert_eq!(service.dependency_info().unwrap().dependencies.len(), 2);
    assert_eq!(stored(&service), before);

    // The whole operation is safe to retry once the store recovers
    service.repository().set_fail_derived_writes(false);
    service.add_dependency(c, a).unwrap();
    assert_eq!(service.dependency_info().unwrap().dependencies.len(), 3);
}

#[test]
fn test_cycle_in_store_is_a_consistency_fault() {
    let service = make_service();
    let (a, _, c) = seed_chain(&service);
    let before = stored(&service);

    // Simulate an uncoordinated writer slipping a cycle past the guard
    service
        .repository()
        .transaction(|tx| tx.insert_dependency(Dependency::new(a, c)))
        .unwrap();

    let err = service.recompute_schedule().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(err.public_message(), "internal scheduling error");
    assert_eq!(stored(&service), before);
}

#[test]
fn test_delete_task_cascades_and_reschedules() {
    let service = make_service();
    let (a, b, c) = seed_chain(&service);

    service.delete_task(b).unwrap();
    let info = service.dependency_info().unwrap();
    assert!(info.dependencies.is_empty());
    assert_eq!(info.critical_path.total_duration, 2);

    let tasks = stored(&service);
    assert_eq!(tasks[&c].earliest_start_date, day(0));
    assert!(tasks[&a].is_critical);
    assert!(!tasks[&c].is_critical);
}

#[test]
fn test_fixed_epoch_from_toml() {
    let config = SchedulerConfig::from_toml_str(
        r#"
        default_duration_days = 2

        [epoch]
        kind = "fixed"
        date = "2025-03-01"
        "#,
    )
    .unwrap();
    let service = make_service_with(config);
    let a = service.create_task(NewTask::new("A")).unwrap();
    let b = service.create_task(NewTask::new("B")).unwrap();
    service.add_dependency(b.id, a.id).unwrap();

    let tasks = stored(&service);
    assert_eq!(tasks[&a.id].duration_days, 2);
    assert_eq!(tasks[&a.id].earliest_start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
    assert_eq!(tasks[&b.id].earliest_start_date, NaiveDate::from_ymd_opt(2025, 3, 3));
}

#[test]
fn test_concurrent_mutations_stay_consistent() {
    let service = TaskGraphService::with_clock(
        Arc::new(InMemoryTaskStore::new()),
        SchedulerConfig::default(),
        FixedClock(Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap()),
    );
    let ids: Vec<TaskId> = (0..12)
        .map(|i| {
            service
                .create_task(NewTask::new(format!("t{i}")).with_duration(i % 4 + 1))
                .unwrap()
                .id
        })
        .collect();

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let service = &service;
            let ids = &ids;
            scope.spawn(move || {
                for step in 0..40 {
                    let task = ids[(worker * 7 + step * 5) % ids.len()];
                    let on = ids[(worker * 3 + step * 11) % ids.len()];
                    match service.add_dependency(task, on) {
                        Ok(_) => {}
                        Err(err) => assert_eq!(err.kind(), ErrorKind::Validation),
                    }
                }
            });
        }
    });

    // Whatever interleaving happened, the graph is acyclic and the stored
    // derived fields match a fresh pass over the final state.
    let before = service.list_tasks().unwrap();
    service.recompute_schedule().unwrap();
    assert_eq!(service.list_tasks().unwrap(), before);
}
