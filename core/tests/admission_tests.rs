//! Admission rules exercised end to end against the in-memory store.

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use helpdesk_core::environment::Clock;
use helpdesk_core::{
    AdmissionConfig, AssignmentRepository, DeskRepository, ErrorKind, HelpdeskError, ResourceRef,
    SerialConflictPolicy, TicketRepository, TicketStatus,
};
use helpdesk_testing::fixtures::{status_change, ticket_request};
use helpdesk_testing::{Fault, FaultyStore, Harness, InMemoryHelpdeskStore, test_clock};

#[tokio::test]
async fn test_admits_ticket_and_reserves_a_slot() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;

    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    assert!(!ticket.id.is_unassigned());
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.created_at, test_clock().now());
    assert_eq!(ticket.desk.id, desk.id);
    assert_eq!(ticket.desk.attendant_name, "Ana");

    let assignments = harness.store.assignments().unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].ticket_id, ticket.id);
    assert_eq!(assignments[0].desk_id, desk.id);
    assert!(assignments[0].is_active());

    let cached = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.queue_occupancy, 1);
}

#[tokio::test]
async fn test_sixth_ticket_on_a_full_desk_is_rejected() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;

    for n in 0..5 {
        harness
            .tickets
            .create_ticket(Some(ticket_request(
                &format!("agent-{n}"),
                n,
                &format!("SN-{n}"),
                desk.id,
            )))
            .await
            .unwrap();
    }
    assert_eq!(harness.tickets.occupancy().count_active(desk.id).await.unwrap(), 5);
    let cached = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.queue_occupancy, 5);

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-5", 5, "SN-5", desk.id)))
        .await
        .unwrap_err();

    assert!(matches!(err, HelpdeskError::DeskFull { limit: 5, .. }));
    assert_eq!(harness.store.ticket_count().unwrap(), 5);
}

#[tokio::test]
async fn test_capacity_limit_comes_from_config() {
    let harness = Harness::with_config(AdmissionConfig::new().with_capacity_limit(2));
    let desk = harness.desk("Ana").await;

    for n in 0..2 {
        harness
            .tickets
            .create_ticket(Some(ticket_request(&format!("agent-{n}"), n, &format!("SN-{n}"), desk.id)))
            .await
            .unwrap();
    }

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-2", desk.id)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeskFull);
}

#[tokio::test]
async fn test_released_slot_can_be_reused() {
    let harness = Harness::with_config(AdmissionConfig::new().with_capacity_limit(1));
    let desk = harness.desk("Ana").await;

    let first = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    harness
        .tickets
        .edit_ticket(first.id, Some(status_change(&first, TicketStatus::InProgress)))
        .await
        .unwrap();

    let second = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-2", desk.id)))
        .await
        .unwrap();
    assert_eq!(second.desk.id, desk.id);
}

#[tokio::test]
async fn test_agent_with_open_ticket_is_busy() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;

    harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 2, "SN-2", desk.id)))
        .await
        .unwrap_err();

    assert!(matches!(err, HelpdeskError::AgentBusy { ref agent } if agent == "agent-1"));
}

#[tokio::test]
async fn test_agent_is_free_once_ticket_moves_on() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;

    let first = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    harness
        .tickets
        .edit_ticket(first.id, Some(status_change(&first, TicketStatus::InProgress)))
        .await
        .unwrap();

    let second = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 2, "SN-2", desk.id)))
        .await
        .unwrap();
    assert_eq!(second.agent, "agent-1");
}

#[tokio::test]
async fn test_same_customer_open_serial_conflicts_while_open() {
    let harness = Harness::with_config(
        AdmissionConfig::new().with_serial_conflict_policy(SerialConflictPolicy::WhileOpen),
    );
    let desk = harness.desk("Ana").await;
    let existing = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 1, "SN-1", desk.id)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.resource(), Some(&ResourceRef::Ticket(existing.id)));
}

#[tokio::test]
async fn test_same_customer_literal_policy_allows_open_prior_ticket() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    let second = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    assert_eq!(second.serial_number, "SN-1");
}

#[tokio::test]
async fn test_same_customer_literal_policy_conflicts_past_open() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let existing = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    harness
        .tickets
        .edit_ticket(existing.id, Some(status_change(&existing, TicketStatus::InProgress)))
        .await
        .unwrap();

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 1, "SN-1", desk.id)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.resource().map(ResourceRef::uri),
        Some(format!("/api/tickets/{}", existing.id))
    );
}

#[tokio::test]
async fn test_other_customer_is_forbidden_while_serial_in_service() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let existing = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-1", desk.id)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.resource(), Some(&ResourceRef::Ticket(existing.id)));
}

#[tokio::test]
async fn test_other_customer_proceeds_after_resolution() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let existing = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    harness
        .tickets
        .edit_ticket(existing.id, Some(status_change(&existing, TicketStatus::Resolved)))
        .await
        .unwrap();

    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-1", desk.id)))
        .await
        .unwrap();
    assert_eq!(ticket.customer_id.get(), 2);
}

#[tokio::test]
async fn test_absent_or_blank_requests_are_invalid() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;

    let err = harness.tickets.create_ticket(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("  ", 1, "SN-1", desk.id)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "", desk.id)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(harness.store.ticket_count().unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_desk_is_rejected() {
    let harness = Harness::new();
    let err = harness
        .tickets
        .create_ticket(Some(ticket_request(
            "agent-1",
            1,
            "SN-1",
            helpdesk_core::DeskId::new(99),
        )))
        .await
        .unwrap_err();

    assert!(matches!(err, HelpdeskError::DeskNotFound(id) if id.get() == 99));
}

#[tokio::test]
async fn test_unreadable_desk_is_reported_as_not_found() {
    let store = FaultyStore::new(InMemoryHelpdeskStore::new());
    let harness = Harness::with_store(store.clone(), AdmissionConfig::default());
    let desk = harness.desk("Ana").await;
    store.fail(Fault::DeskLookup);

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_assignment_leaves_ticket_persisted() {
    helpdesk_testing::init_tracing();
    let store = FaultyStore::new(InMemoryHelpdeskStore::new());
    let harness = Harness::with_store(store.clone(), AdmissionConfig::default());
    let desk = harness.desk("Ana").await;
    store.fail(Fault::AssignmentSave);

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(store.inner().ticket_count().unwrap(), 1);
    assert!(store.inner().assignments().unwrap().is_empty());
    assert_eq!(
        AssignmentRepository::count_open_by_desk(store.inner(), desk.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_failed_cache_refresh_still_admits_ticket() {
    let store = FaultyStore::new(InMemoryHelpdeskStore::new());
    let harness = Harness::with_store(store.clone(), AdmissionConfig::default());
    let desk = harness.desk("Ana").await;
    store.fail(Fault::DeskSave);

    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    assert_eq!(ticket.desk.id, desk.id);
    assert_eq!(
        AssignmentRepository::count_open_by_desk(store.inner(), desk.id)
            .await
            .unwrap(),
        1
    );
    let stale = DeskRepository::find_by_id(store.inner(), desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stale.queue_occupancy, 0);

    // The next admission brings the cache back in line with the assignments.
    store.heal(Fault::DeskSave);
    harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-2", desk.id)))
        .await
        .unwrap();
    let refreshed = DeskRepository::find_by_id(store.inner(), desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.queue_occupancy, 2);
}

#[tokio::test]
async fn test_failed_count_aborts_before_any_write() {
    helpdesk_testing::init_tracing();
    let store = FaultyStore::new(InMemoryHelpdeskStore::new());
    let harness = Harness::with_store(store.clone(), AdmissionConfig::default());
    let desk = harness.desk("Ana").await;
    store.fail(Fault::AssignmentCount);

    let err = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap_err();

    assert!(matches!(err, HelpdeskError::Storage(_)));
    assert_eq!(store.inner().ticket_count().unwrap(), 0);

    store.heal(Fault::AssignmentCount);
    harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_serialized_admission_never_overfills_a_desk() {
    let harness = Harness::with_config(
        AdmissionConfig::new()
            .with_capacity_limit(3)
            .with_serialize_per_desk(true),
    );
    let desk = harness.desk("Ana").await;

    let handles: Vec<_> = (0..12)
        .map(|n| {
            let tickets = harness.tickets.clone();
            tokio::spawn(async move {
                tickets
                    .create_ticket(Some(ticket_request(
                        &format!("agent-{n}"),
                        n,
                        &format!("SN-{n}"),
                        desk.id,
                    )))
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::DeskFull),
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(
        AssignmentRepository::count_open_by_desk(&harness.store, desk.id)
            .await
            .unwrap(),
        3
    );
    let open = TicketRepository::find_all(&harness.store).await.unwrap();
    assert_eq!(open.len(), 3);
}
