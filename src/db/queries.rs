use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::models::{Booking, BookingStatus, Service};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Services ──

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, duration_minutes, active FROM services WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id], parse_service_row);

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, duration_minutes, active
         FROM services WHERE active = 1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

fn parse_service_row(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: row.get(3)?,
        active: row.get::<_, i64>(4)? != 0,
    })
}

// ── Bookings ──

/// Insert failures from the active-slot unique index surface as
/// `rusqlite::Error::SqliteFailure` with a constraint-violation code;
/// the booking service maps those to a conflict.
pub fn create_booking(conn: &Connection, booking: &Booking) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO bookings (id, service_id, client_name, client_email, client_phone,
                               appointment_date, notes, status, confirmed, calendar_event_id,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            booking.id,
            booking.service_id,
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.appointment_date.format(DATETIME_FMT).to_string(),
            booking.notes,
            booking.status.as_str(),
            booking.confirmed as i64,
            booking.calendar_event_id,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let mut stmt = conn.prepare(&format!("{BOOKING_SELECT} WHERE id = ?1"))?;

    let result = stmt.query_row(params![id], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_by_email(conn: &Connection, email: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT} WHERE client_email = ?1 ORDER BY appointment_date ASC"
    ))?;

    let rows = stmt.query_map(params![email], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut bookings = vec![];

    match status {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "{BOOKING_SELECT} WHERE status = ?1 ORDER BY appointment_date DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status, limit], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{BOOKING_SELECT} ORDER BY appointment_date DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
    }

    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = chrono::Utc::now()
        .naive_utc()
        .format(DATETIME_FMT)
        .to_string();
    let confirmed = (status == BookingStatus::Confirmed) as i64;

    let updated = conn.execute(
        "UPDATE bookings SET status = ?1, confirmed = ?2, updated_at = ?3 WHERE id = ?4",
        params![status.as_str(), confirmed, now, id],
    )?;

    Ok(updated > 0)
}

const BOOKING_SELECT: &str =
    "SELECT id, service_id, client_name, client_email, client_phone, appointment_date,
            notes, status, confirmed, calendar_event_id, created_at, updated_at
     FROM bookings";

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let appointment_date: String = row.get(5)?;
    let status: String = row.get(7)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;

    let booking = Booking {
        id: row.get(0)?,
        service_id: row.get(1)?,
        client_name: row.get(2)?,
        client_email: row.get(3)?,
        client_phone: row.get(4)?,
        appointment_date: parse_datetime(&appointment_date),
        notes: row.get(6)?,
        status: BookingStatus::from_str(&status),
        confirmed: row.get::<_, i64>(8)? != 0,
        calendar_event_id: row.get(9)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    };

    Ok(booking)
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .unwrap_or_else(|_| chrono::Utc::now().naive_utc())
}
