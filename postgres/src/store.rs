//! `PostgreSQL` implementation of the store capabilities.

use chrono::{DateTime, Utc};
use helpdesk_core::error::StoreError;
use helpdesk_core::repository::{AssignmentRepository, DeskRepository, TicketRepository};
use helpdesk_core::types::{
    Assignment, AssignmentId, CustomerId, Desk, DeskId, Ticket, TicketId, TicketStatus,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const TICKET_COLUMNS: &str = "id, customer_id, created_at, resolved_at, device_id, serial_number, \
     status, desk_id, desk_attendant_name, desk_queue_occupancy, reason, product, \
     requesting_user, agent";

/// `PostgreSQL` help desk store.
///
/// # Example
///
/// ```no_run
/// use helpdesk_postgres::PostgresHelpdeskStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPool::connect("postgresql://localhost/helpdesk").await?;
/// let store = PostgresHelpdeskStore::new(pool);
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresHelpdeskStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresHelpdeskStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn database(context: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Database(format!("{context}: {e}"))
}

fn decode(e: sqlx::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

fn occupancy_from_db(value: i32) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Serialization(format!("negative queue occupancy {value}")))
}

fn occupancy_to_db(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::Serialization(format!("queue occupancy {value} out of range")))
}

fn row_to_desk(row: &PgRow) -> Result<Desk, StoreError> {
    Ok(Desk {
        id: DeskId::new(row.try_get("id").map_err(decode)?),
        attendant_name: row.try_get("attendant_name").map_err(decode)?,
        queue_occupancy: occupancy_from_db(row.try_get("queue_occupancy").map_err(decode)?)?,
    })
}

fn row_to_ticket(row: &PgRow) -> Result<Ticket, StoreError> {
    let status: String = row.try_get("status").map_err(decode)?;
    let status: TicketStatus = status
        .parse()
        .map_err(|e: helpdesk_core::types::ParseStatusError| {
            StoreError::Serialization(e.to_string())
        })?;

    Ok(Ticket {
        id: TicketId::new(row.try_get("id").map_err(decode)?),
        customer_id: CustomerId::new(row.try_get("customer_id").map_err(decode)?),
        created_at: row.try_get("created_at").map_err(decode)?,
        resolved_at: row.try_get("resolved_at").map_err(decode)?,
        device_id: row.try_get("device_id").map_err(decode)?,
        serial_number: row.try_get("serial_number").map_err(decode)?,
        status,
        desk: Desk {
            id: DeskId::new(row.try_get("desk_id").map_err(decode)?),
            attendant_name: row.try_get("desk_attendant_name").map_err(decode)?,
            queue_occupancy: occupancy_from_db(
                row.try_get("desk_queue_occupancy").map_err(decode)?,
            )?,
        },
        reason: row.try_get("reason").map_err(decode)?,
        product: row.try_get("product").map_err(decode)?,
        requesting_user: row.try_get("requesting_user").map_err(decode)?,
        agent: row.try_get("agent").map_err(decode)?,
    })
}

fn row_to_assignment(row: &PgRow) -> Result<Assignment, StoreError> {
    Ok(Assignment {
        id: AssignmentId::new(row.try_get("id").map_err(decode)?),
        ticket_id: TicketId::new(row.try_get("ticket_id").map_err(decode)?),
        desk_id: DeskId::new(row.try_get("desk_id").map_err(decode)?),
        assigned_at: row.try_get("assigned_at").map_err(decode)?,
        released_at: row.try_get("released_at").map_err(decode)?,
    })
}

fn rows_to_tickets(rows: &[PgRow]) -> Result<Vec<Ticket>, StoreError> {
    rows.iter().map(row_to_ticket).collect()
}

impl DeskRepository for PostgresHelpdeskStore {
    async fn find_all(&self) -> Result<Vec<Desk>, StoreError> {
        let rows = sqlx::query("SELECT id, attendant_name, queue_occupancy FROM desks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(database("Failed to list desks"))?;
        rows.iter().map(row_to_desk).collect()
    }

    async fn find_by_id(&self, id: DeskId) -> Result<Option<Desk>, StoreError> {
        let row = sqlx::query("SELECT id, attendant_name, queue_occupancy FROM desks WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database("Failed to get desk"))?;
        row.as_ref().map(row_to_desk).transpose()
    }

    async fn find_by_customer_id(&self, customer_id: CustomerId) -> Result<Vec<Desk>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT d.id, d.attendant_name, d.queue_occupancy
            FROM desks d
            WHERE EXISTS (
                SELECT 1 FROM tickets t WHERE t.desk_id = d.id AND t.customer_id = $1
            )
            ORDER BY d.id
            ",
        )
        .bind(customer_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(database("Failed to list desks for customer"))?;
        rows.iter().map(row_to_desk).collect()
    }

    #[tracing::instrument(skip(self, desk), fields(desk_id = %desk.id))]
    async fn save(&self, mut desk: Desk) -> Result<Desk, StoreError> {
        let occupancy = occupancy_to_db(desk.queue_occupancy)?;

        if desk.id.is_unassigned() {
            let (id,): (i64,) = sqlx::query_as(
                "INSERT INTO desks (attendant_name, queue_occupancy) VALUES ($1, $2) RETURNING id",
            )
            .bind(&desk.attendant_name)
            .bind(occupancy)
            .fetch_one(&self.pool)
            .await
            .map_err(database("Failed to insert desk"))?;
            desk.id = DeskId::new(id);
        } else {
            let result = sqlx::query(
                "UPDATE desks SET attendant_name = $2, queue_occupancy = $3 WHERE id = $1",
            )
            .bind(desk.id.get())
            .bind(&desk.attendant_name)
            .bind(occupancy)
            .execute(&self.pool)
            .await
            .map_err(database("Failed to update desk"))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::Database(format!("desk {} does not exist", desk.id)));
            }
        }

        Ok(desk)
    }
}

impl TicketRepository for PostgresHelpdeskStore {
    async fn find_all(&self) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(database("Failed to list tickets"))?;
        rows_to_tickets(&rows)
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database("Failed to get ticket"))?;
        row.as_ref().map(row_to_ticket).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE customer_id = $1 ORDER BY id"
        ))
        .bind(customer_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(database("Failed to list tickets for customer"))?;
        rows_to_tickets(&rows)
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE serial_number = $1 ORDER BY id DESC LIMIT 1"
        ))
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(database("Failed to get ticket by serial"))?;
        row.as_ref().map(row_to_ticket).transpose()
    }

    async fn find_by_agent_and_status(
        &self,
        agent: &str,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE agent = $1 AND status = $2 ORDER BY id"
        ))
        .bind(agent)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(database("Failed to list tickets for agent"))?;
        rows_to_tickets(&rows)
    }

    async fn find_paginated(&self, page: u32, size: u32) -> Result<Vec<Ticket>, StoreError> {
        let offset = i64::from(page) * i64::from(size);
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(database("Failed to page tickets"))?;
        rows_to_tickets(&rows)
    }

    #[tracing::instrument(skip(self, ticket), fields(ticket_id = %ticket.id))]
    async fn save(&self, mut ticket: Ticket) -> Result<Ticket, StoreError> {
        let desk_occupancy = occupancy_to_db(ticket.desk.queue_occupancy)?;

        if ticket.id.is_unassigned() {
            let (id,): (i64,) = sqlx::query_as(
                r"
                INSERT INTO tickets (
                    customer_id, created_at, resolved_at, device_id, serial_number, status,
                    desk_id, desk_attendant_name, desk_queue_occupancy,
                    reason, product, requesting_user, agent
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING id
                ",
            )
            .bind(ticket.customer_id.get())
            .bind(ticket.created_at)
            .bind(ticket.resolved_at)
            .bind(&ticket.device_id)
            .bind(&ticket.serial_number)
            .bind(ticket.status.as_str())
            .bind(ticket.desk.id.get())
            .bind(&ticket.desk.attendant_name)
            .bind(desk_occupancy)
            .bind(&ticket.reason)
            .bind(&ticket.product)
            .bind(&ticket.requesting_user)
            .bind(&ticket.agent)
            .fetch_one(&self.pool)
            .await
            .map_err(database("Failed to insert ticket"))?;
            ticket.id = TicketId::new(id);
        } else {
            let result = sqlx::query(
                r"
                UPDATE tickets SET
                    customer_id = $2, resolved_at = $3, device_id = $4, serial_number = $5,
                    status = $6, reason = $7, product = $8, requesting_user = $9, agent = $10
                WHERE id = $1
                ",
            )
            .bind(ticket.id.get())
            .bind(ticket.customer_id.get())
            .bind(ticket.resolved_at)
            .bind(&ticket.device_id)
            .bind(&ticket.serial_number)
            .bind(ticket.status.as_str())
            .bind(&ticket.reason)
            .bind(&ticket.product)
            .bind(&ticket.requesting_user)
            .bind(&ticket.agent)
            .execute(&self.pool)
            .await
            .map_err(database("Failed to update ticket"))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::Database(format!(
                    "ticket {} does not exist",
                    ticket.id
                )));
            }
        }

        Ok(ticket)
    }
}

impl AssignmentRepository for PostgresHelpdeskStore {
    async fn save(&self, mut assignment: Assignment) -> Result<Assignment, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO assignments (ticket_id, desk_id, assigned_at, released_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(assignment.ticket_id.get())
        .bind(assignment.desk_id.get())
        .bind(assignment.assigned_at)
        .bind(assignment.released_at)
        .fetch_one(&self.pool)
        .await
        .map_err(database("Failed to insert assignment"))?;

        assignment.id = AssignmentId::new(id);
        Ok(assignment)
    }

    async fn count_open_by_desk(&self, desk_id: DeskId) -> Result<u32, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM assignments WHERE desk_id = $1 AND released_at IS NULL",
        )
        .bind(desk_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(database("Failed to count assignments"))?;

        u32::try_from(count)
            .map_err(|_| StoreError::Serialization(format!("assignment count {count} out of range")))
    }

    async fn find_active_by_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<Assignment>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, ticket_id, desk_id, assigned_at, released_at
            FROM assignments
            WHERE ticket_id = $1 AND released_at IS NULL
            ",
        )
        .bind(ticket_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(database("Failed to load assignment"))?;

        row.as_ref().map(row_to_assignment).transpose()
    }

    async fn release_for_ticket(
        &self,
        ticket_id: TicketId,
        released_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE assignments SET released_at = $2
            WHERE ticket_id = $1 AND released_at IS NULL
            ",
        )
        .bind(ticket_id.get())
        .bind(released_at)
        .execute(&self.pool)
        .await
        .map_err(database("Failed to release assignment"))?;

        Ok(result.rows_affected() > 0)
    }
}
