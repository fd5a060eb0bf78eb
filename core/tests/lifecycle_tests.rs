//! Ticket edits, occupancy release, and listing.

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use helpdesk_core::environment::Clock;
use helpdesk_core::{
    AdmissionConfig, AssignmentRepository, CustomerId, DeskRepository, ErrorKind, HelpdeskError,
    TicketChanges, TicketId, TicketRepository, TicketStatus,
};
use helpdesk_testing::fixtures::{status_change, ticket_request};
use helpdesk_testing::{Harness, test_clock};

#[tokio::test]
async fn test_edit_with_current_values_round_trips() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    let edited = harness
        .tickets
        .edit_ticket(ticket.id, Some(TicketChanges::from(&ticket)))
        .await
        .unwrap();

    assert_eq!(edited, ticket);
    assert_eq!(harness.tickets.ticket_details(ticket.id).await.unwrap(), ticket);
}

#[tokio::test]
async fn test_editing_open_ticket_frees_its_slot() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    let mut changes = status_change(&ticket, TicketStatus::Resolved);
    changes.resolved_at = Some(test_clock().now());
    changes.reason = "replaced the panel".to_string();
    let edited = harness
        .tickets
        .edit_ticket(ticket.id, Some(changes))
        .await
        .unwrap();

    assert_eq!(edited.status, TicketStatus::Resolved);
    assert_eq!(edited.resolved_at, Some(test_clock().now()));
    assert_eq!(edited.reason, "replaced the panel");
    assert_eq!(edited.created_at, ticket.created_at);
    assert_eq!(edited.desk, ticket.desk);

    let cached = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.queue_occupancy, 0);
    assert_eq!(harness.tickets.occupancy().count_active(desk.id).await.unwrap(), 0);
    let assignments = harness.store.assignments().unwrap();
    assert_eq!(assignments[0].released_at, Some(test_clock().now()));
}

#[tokio::test]
async fn test_editing_closed_ticket_leaves_occupancy_alone() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-2", desk.id)))
        .await
        .unwrap();

    let resolved = harness
        .tickets
        .edit_ticket(ticket.id, Some(status_change(&ticket, TicketStatus::Resolved)))
        .await
        .unwrap();
    harness
        .tickets
        .edit_ticket(resolved.id, Some(status_change(&resolved, TicketStatus::Closed)))
        .await
        .unwrap();

    let cached = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.queue_occupancy, 1);
}

#[tokio::test]
async fn test_decrement_below_zero_is_rejected() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    // Desk edited out of band to an empty queue.
    let mut drained = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    drained.queue_occupancy = 0;
    DeskRepository::save(&harness.store, drained).await.unwrap();

    let err = harness
        .tickets
        .edit_ticket(ticket.id, Some(status_change(&ticket, TicketStatus::InProgress)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let stored = TicketRepository::find_by_id(&harness.store, ticket.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TicketStatus::Open);
    assert_eq!(harness.tickets.occupancy().count_active(desk.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_reedited_open_ticket_cannot_take_another_tickets_slot() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let first = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();
    let second = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-2", 2, "SN-2", desk.id)))
        .await
        .unwrap();

    // Still Open afterwards, but its slot is gone.
    let first = harness
        .tickets
        .edit_ticket(first.id, Some(status_change(&first, TicketStatus::Open)))
        .await
        .unwrap();
    assert!(
        AssignmentRepository::find_active_by_ticket(&harness.store, first.id)
            .await
            .unwrap()
            .is_none()
    );

    let err = harness
        .tickets
        .edit_ticket(first.id, Some(status_change(&first, TicketStatus::InProgress)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let cached = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.queue_occupancy, 1);
    assert_eq!(harness.tickets.occupancy().count_active(desk.id).await.unwrap(), 1);

    let edited = harness
        .tickets
        .edit_ticket(second.id, Some(status_change(&second, TicketStatus::InProgress)))
        .await
        .unwrap();
    assert_eq!(edited.status, TicketStatus::InProgress);
    let cached = DeskRepository::find_by_id(&harness.store, desk.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.queue_occupancy, 0);
    assert_eq!(harness.tickets.occupancy().count_active(desk.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_direct_decrement_on_empty_desk_fails() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;

    let err = harness.tickets.occupancy().decrement(desk.id).await.unwrap_err();
    assert!(matches!(err, HelpdeskError::InvalidState(_)));

    let err = harness
        .tickets
        .occupancy()
        .decrement(helpdesk_core::DeskId::new(42))
        .await
        .unwrap_err();
    assert!(matches!(err, HelpdeskError::DeskNotFound(_)));
}

#[tokio::test]
async fn test_edit_requires_changes_and_an_existing_ticket() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    let ticket = harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 1, "SN-1", desk.id)))
        .await
        .unwrap();

    let err = harness.tickets.edit_ticket(ticket.id, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = harness
        .tickets
        .edit_ticket(TicketId::new(404), Some(TicketChanges::from(&ticket)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Ticket with id 404 not found");
}

#[tokio::test]
async fn test_ticket_details_for_unknown_id() {
    let harness = Harness::new();
    let err = harness
        .tickets
        .ticket_details(TicketId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_tickets_pages_and_caps_size() {
    let harness = Harness::with_config(AdmissionConfig::new().with_max_page_size(3));
    let desk = harness.desk("Ana").await;
    for n in 0..5 {
        harness
            .tickets
            .create_ticket(Some(ticket_request(&format!("agent-{n}"), n, &format!("SN-{n}"), desk.id)))
            .await
            .unwrap();
    }

    let first = harness.tickets.list_tickets(0, 2).await.unwrap();
    assert_eq!(first.len(), 2);
    let second = harness.tickets.list_tickets(1, 2).await.unwrap();
    assert_eq!(second[0].id, TicketId::new(3));

    let capped = harness.tickets.list_tickets(0, 50).await.unwrap();
    assert_eq!(capped.len(), 3);

    assert!(harness.tickets.list_tickets(9, 2).await.unwrap().is_empty());
    let err = harness.tickets.list_tickets(0, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_list_by_customer_fails_when_empty() {
    let harness = Harness::new();
    let desk = harness.desk("Ana").await;
    harness
        .tickets
        .create_ticket(Some(ticket_request("agent-1", 7, "SN-1", desk.id)))
        .await
        .unwrap();

    let tickets = harness
        .tickets
        .list_tickets_by_customer(CustomerId::new(7))
        .await
        .unwrap();
    assert_eq!(tickets.len(), 1);

    let err = harness
        .tickets
        .list_tickets_by_customer(CustomerId::new(8))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
